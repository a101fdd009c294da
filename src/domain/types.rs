//! Shared domain types.
//!
//! Reference-table rows (`TradeRecord`, `LeaseEvent`, `LocationRecord`) are
//! immutable once loaded. Result types are serializable so they can be
//! exported to JSON/CSV for the presentation layer.
//!
//! Amounts (deposits, prices, lease statistics) are in 만원 (10,000 KRW)
//! throughout.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ParcelKey;
use crate::error::RiskResult;

/// One historical sale, as recorded in the trade table.
///
/// Every numeric column is optional: missing values are substituted with `0`
/// only when the hedonic feature vector is built.
#[derive(Debug, Clone, Default)]
pub struct TradeRecord {
    pub parcel: Option<ParcelKey>,
    pub contract_date: Option<NaiveDate>,
    pub building_age: Option<f64>,
    /// Buyer resides in the same district (관내).
    pub in_district: Option<f64>,
    pub lease_avg_deposit: Option<f64>,
    pub lease_avg_rent: Option<f64>,
    pub lease_count: Option<f64>,
    pub park_distance: Option<f64>,
    pub school_distance: Option<f64>,
    pub retail_distance: Option<f64>,
    pub buyer_corporate: Option<f64>,
    pub seller_individual: Option<f64>,
    /// Seller category "M" flag as coded in the registry export.
    pub seller_m: Option<f64>,
    pub direct_trade: Option<f64>,
}

/// One historical lease with its auction outcome.
#[derive(Debug, Clone, Default)]
pub struct LeaseEvent {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Auctioned within 4 years of the lease start.
    pub auctioned_4y: bool,
    pub local_morans_i: Option<f64>,
}

impl LeaseEvent {
    /// Coordinates and Moran's I, if all are present and finite.
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        let lat = self.latitude.filter(|v| v.is_finite())?;
        let lon = self.longitude.filter(|v| v.is_finite())?;
        let moran = self.local_morans_i.filter(|v| v.is_finite())?;
        Some((lat, lon, moran))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
}

/// Ordinal risk grade shared by both tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    Safe,
    Caution,
    High,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::Safe, Grade::Caution, Grade::High];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Safe => "Safe",
            Grade::Caution => "Caution",
            Grade::High => "High",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Probability cut-offs for `Caution` and `High`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub caution: f64,
    pub high: f64,
}

impl GradeThresholds {
    /// The pair used for both tracks and the zone map.
    pub const CANONICAL: GradeThresholds = GradeThresholds { caution: 0.56, high: 0.68 };

    /// The structural model's original stand-alone grading pair.
    pub const LEGACY_STRUCTURAL: GradeThresholds = GradeThresholds { caution: 0.53, high: 0.63 };

    /// Validated constructor: `0 <= caution < high <= 1`.
    pub fn new(caution: f64, high: f64) -> Option<GradeThresholds> {
        let valid = caution.is_finite()
            && high.is_finite()
            && (0.0..=1.0).contains(&caution)
            && (0.0..=1.0).contains(&high)
            && caution < high;
        valid.then_some(GradeThresholds { caution, high })
    }
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// How alarming a zone is, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Elevated,
    Critical,
}

/// One cell of the 3×3 zone map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoneVerdict {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
}

/// Features fed to the structural (WOE/logistic) model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructuralFeatures {
    /// Deposit as a percentage of the hedonic value.
    pub effective_ltv: f64,
    /// Deposit minus hedonic value (negative when the deposit is covered).
    pub deposit_overhang: f64,
    /// Auctioned lease events within 1 km.
    pub nearby_auction_1km: u32,
    /// Local Moran's I of the nearest lease event.
    pub local_morans_i: f64,
    /// Planar distance (km) to that nearest event.
    pub nearest_event_km: f64,
}

/// Hedonic fair-value estimate for one parcel/area/floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedonicEstimate {
    pub parcel: ParcelKey,
    pub v0: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Track A output.
#[derive(Debug, Clone, Serialize)]
pub struct StructuralAssessment {
    pub parcel: ParcelKey,
    pub probability: f64,
    pub grade: Grade,
    pub v0: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub features: StructuralFeatures,
    /// WOE value per feature, keyed by feature name.
    pub woe: BTreeMap<String, f64>,
}

/// PD / LGD / EL under one named price scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRisk {
    pub name: String,
    pub shock: f64,
    pub pd: f64,
    /// Currency loss given default.
    pub lgd: f64,
    /// Probability-weighted currency loss.
    pub el: f64,
}

/// Safe-deposit ceilings under the historical and current drift.
///
/// A ceiling is `f64::INFINITY` when the loss-ratio cap never binds; JSON
/// export writes it as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafeDepositRange {
    pub before: f64,
    pub after: f64,
    pub low: f64,
    pub high: f64,
}

impl SafeDepositRange {
    pub fn is_bounded(&self) -> bool {
        self.high.is_finite()
    }
}

/// Coarse financial grade from the EL sensitivity to a 1%p shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancialGrade {
    A,
    B,
    C,
}

/// Track B output.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAssessment {
    pub v0: f64,
    pub deposit: f64,
    pub term_years: f64,
    /// Deposit-to-value ratio.
    pub jeonse_ratio: f64,
    /// Base scenario first, then stresses in artifact order.
    pub scenarios: Vec<ScenarioRisk>,
    /// EL change per 1%p of price shock (worst scenario vs base).
    pub el_slope_per_pct: f64,
    pub financial_grade: FinancialGrade,
    pub safe_deposit: SafeDepositRange,
    pub deposit_exceeds_ceiling: bool,
    pub grade: Grade,
}

impl MarketAssessment {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioRisk> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn base(&self) -> &ScenarioRisk {
        // `scenarios` always starts with the base scenario.
        &self.scenarios[0]
    }

    pub fn pd_base(&self) -> f64 {
        self.base().pd
    }

    pub fn lgd_base(&self) -> f64 {
        self.base().lgd
    }

    pub fn el_base(&self) -> f64 {
        self.base().el
    }

    pub fn pd_stress10(&self) -> Option<f64> {
        self.scenario("stress10").map(|s| s.pd)
    }

    pub fn pd_stress20(&self) -> Option<f64> {
        self.scenario("stress20").map(|s| s.pd)
    }

    pub fn el_stress10(&self) -> Option<f64> {
        self.scenario("stress10").map(|s| s.el)
    }

    pub fn el_stress20(&self) -> Option<f64> {
        self.scenario("stress20").map(|s| s.el)
    }

    pub fn safe_deposit_low(&self) -> f64 {
        self.safe_deposit.low
    }

    pub fn safe_deposit_high(&self) -> f64 {
        self.safe_deposit.high
    }
}

/// A full request as captured by the input form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub lot: String,
    pub area_sqm: f64,
    pub floor: i32,
    pub deposit: f64,
    pub term_years: f64,
}

/// Combined result handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub request: AssessmentRequest,
    pub structural: StructuralAssessment,
    pub market: MarketAssessment,
    pub structural_grade: Grade,
    pub market_grade: Grade,
    pub zone: ZoneVerdict,
    pub commentary: Vec<String>,
}

/// One row of a batch run: the request and what became of it.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub request: AssessmentRequest,
    pub result: RiskResult<RiskAssessment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(GradeThresholds::new(0.56, 0.68).is_some());
        assert!(GradeThresholds::new(0.68, 0.56).is_none());
        assert!(GradeThresholds::new(0.5, 0.5).is_none());
        assert!(GradeThresholds::new(-0.1, 0.5).is_none());
        assert!(GradeThresholds::new(0.1, f64::NAN).is_none());
    }

    #[test]
    fn grades_are_ordered() {
        assert!(Grade::Safe < Grade::Caution);
        assert!(Grade::Caution < Grade::High);
    }

    #[test]
    fn incomplete_lease_events_are_detected() {
        let mut ev = LeaseEvent {
            latitude: Some(37.55),
            longitude: Some(126.85),
            auctioned_4y: true,
            local_morans_i: Some(0.4),
        };
        assert_eq!(ev.complete(), Some((37.55, 126.85, 0.4)));
        ev.local_morans_i = None;
        assert_eq!(ev.complete(), None);
        ev.local_morans_i = Some(f64::NAN);
        assert_eq!(ev.complete(), None);
    }
}
