//! Export assessment results.
//!
//! - a single assessment as pretty JSON (for the presentation layer)
//! - a batch run as CSV, one row per request, easy to consume in spreadsheets

use std::fs::File;
use std::path::Path;

use crate::domain::{BatchOutcome, RiskAssessment};
use crate::error::{RiskError, RiskResult};

/// Write one assessment as pretty JSON.
pub fn write_assessment_json(path: &Path, assessment: &RiskAssessment) -> RiskResult<()> {
    let file = File::create(path).map_err(|e| RiskError::data(path, format!("failed to create export JSON: {e}")))?;
    serde_json::to_writer_pretty(file, assessment)
        .map_err(|e| RiskError::data(path, format!("failed to write export JSON: {e}")))
}

const BATCH_HEADER: [&str; 20] = [
    "lot",
    "area_sqm",
    "floor",
    "deposit",
    "term_years",
    "pnu",
    "v0",
    "structural_probability",
    "structural_grade",
    "pd_base",
    "el_base",
    "pd_stress20",
    "el_stress20",
    "jeonse_ratio",
    "safe_deposit_low",
    "safe_deposit_high",
    "market_grade",
    "zone_code",
    "zone_name",
    "error",
];

/// Write batch results to CSV. Failed requests keep their input columns and
/// carry the error message; result columns stay empty.
pub fn write_batch_csv(path: &Path, outcomes: &[BatchOutcome]) -> RiskResult<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| RiskError::data(path, format!("failed to create export CSV: {e}")))?;

    writer
        .write_record(BATCH_HEADER)
        .map_err(|e| RiskError::data(path, format!("failed to write export CSV header: {e}")))?;

    for outcome in outcomes {
        let req = &outcome.request;
        let mut row = vec![
            req.lot.clone(),
            format!("{}", req.area_sqm),
            req.floor.to_string(),
            format!("{}", req.deposit),
            format!("{}", req.term_years),
        ];

        match &outcome.result {
            Ok(a) => {
                let m = &a.market;
                row.extend([
                    a.structural.parcel.to_string(),
                    format!("{:.2}", a.structural.v0),
                    format!("{:.4}", a.structural.probability),
                    a.structural_grade.to_string(),
                    format!("{:.6}", m.pd_base()),
                    format!("{:.2}", m.el_base()),
                    opt(m.pd_stress20(), 6),
                    opt(m.el_stress20(), 2),
                    format!("{:.4}", m.jeonse_ratio),
                    ceiling(m.safe_deposit_low()),
                    ceiling(m.safe_deposit_high()),
                    a.market_grade.to_string(),
                    a.zone.code.to_string(),
                    a.zone.name.to_string(),
                    String::new(),
                ]);
            }
            Err(err) => {
                row.extend(std::iter::repeat_n(String::new(), BATCH_HEADER.len() - 6));
                row.push(err.to_string());
            }
        }

        writer
            .write_record(&row)
            .map_err(|e| RiskError::data(path, format!("failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| RiskError::data(path, format!("failed to flush export CSV: {e}")))
}

/// Whole currency units; an unbounded ceiling is written as `unbounded`.
fn ceiling(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.0}")
    } else {
        "unbounded".to_string()
    }
}

fn opt(v: Option<f64>, digits: usize) -> String {
    v.map(|v| format!("{v:.digits$}")).unwrap_or_default()
}
