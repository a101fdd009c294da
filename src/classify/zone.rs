//! Three-level grading and the 3×3 zone map.
//!
//! ```text
//!                    market Safe   market Caution   market High
//! structural Safe        ①              ②               ③
//! structural Caution     ④              ⑤               ⑥
//! structural High        ⑦              ⑧               ⑨
//! ```

use crate::domain::{Grade, GradeThresholds, Severity, ZoneVerdict};
use crate::error::{RiskError, RiskResult};

/// `High` if `p >= high`, `Caution` if `p >= caution`, else `Safe`.
///
/// Callers must reject NaN before grading (see `check_probability`); a NaN
/// compares false and would grade `Safe`.
pub fn classify3(p: f64, thresholds: GradeThresholds) -> Grade {
    if p >= thresholds.high {
        Grade::High
    } else if p >= thresholds.caution {
        Grade::Caution
    } else {
        Grade::Safe
    }
}

const fn verdict(code: &'static str, name: &'static str, description: &'static str, severity: Severity) -> ZoneVerdict {
    ZoneVerdict {
        code,
        name,
        description,
        severity,
    }
}

pub fn zone_of(structural: Grade, market: Grade) -> ZoneVerdict {
    use Grade::{Caution, High, Safe};

    match (structural, market) {
        (Safe, Safe) => verdict(
            "①",
            "Optimal Safe Zone",
            "Little resemblance to fraud patterns; the deposit is recoverable even if the market moves sharply.",
            Severity::Low,
        ),
        (Safe, Caution) => verdict(
            "②",
            "Market Watch Zone",
            "Far from fraud patterns, but part of the deposit could be lost if prices fall.",
            Severity::Elevated,
        ),
        (Safe, High) => verdict(
            "③",
            "Market Warning Zone",
            "Underwater-lease risk: heavy losses if the market collapses.",
            Severity::Elevated,
        ),
        (Caution, Safe) => verdict(
            "④",
            "Pattern Caution Zone",
            "The market is stable, but the contract resembles past fraud patterns.",
            Severity::Elevated,
        ),
        (Caution, Caution) => verdict(
            "⑤",
            "Compound Management Zone",
            "Both dimensions need attention; professional advice is recommended.",
            Severity::Elevated,
        ),
        (Caution, High) => verdict(
            "⑥",
            "Deepened Risk Zone",
            "Compound high risk from market collapse and resemblance to fraud patterns.",
            Severity::Elevated,
        ),
        (High, Safe) => verdict(
            "⑦",
            "Fraud Warning Zone",
            "The market is sound, but strong resemblance to fraud patterns suggests a planned scam.",
            Severity::Elevated,
        ),
        (High, Caution) => verdict(
            "⑧",
            "Risk Spread Zone",
            "Deliberate fraud design combined with a falling market; the worst combination.",
            Severity::Elevated,
        ),
        (High, High) => verdict(
            "⑨",
            "Prohibited Zone",
            "An auction loss is overwhelmingly likely; signing is not recommended under any conditions.",
            Severity::Critical,
        ),
    }
}

/// Grade both tracks with the same threshold pair and look up the zone.
pub fn classify_zone(structural_probability: f64, market_pd: f64, thresholds: GradeThresholds) -> ZoneVerdict {
    zone_of(
        classify3(structural_probability, thresholds),
        classify3(market_pd, thresholds),
    )
}

/// `p` if it is a probability in `[0, 1]`.
pub fn check_probability(name: &str, p: f64) -> RiskResult<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(RiskError::InvalidInput(format!("{name} probability must be within [0, 1] (got {p})")))
    }
}

/// `classify_zone` for inputs that have not been validated yet.
pub fn checked_zone(
    structural_probability: f64,
    market_pd: f64,
    thresholds: GradeThresholds,
) -> RiskResult<ZoneVerdict> {
    let sp = check_probability("structural", structural_probability)?;
    let pd = check_probability("market", market_pd)?;
    Ok(classify_zone(sp, pd, thresholds))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        let t = GradeThresholds::CANONICAL;
        assert_eq!(classify3(0.5599, t), Grade::Safe);
        assert_eq!(classify3(0.56, t), Grade::Caution);
        assert_eq!(classify3(0.6799, t), Grade::Caution);
        assert_eq!(classify3(0.68, t), Grade::High);
        assert_eq!(classify3(1.0, t), Grade::High);
    }

    #[test]
    fn legacy_pair_grades_differently() {
        assert_eq!(classify3(0.54, GradeThresholds::LEGACY_STRUCTURAL), Grade::Caution);
        assert_eq!(classify3(0.54, GradeThresholds::CANONICAL), Grade::Safe);
    }

    #[test]
    fn every_pair_has_a_distinct_zone() {
        let mut codes = HashSet::new();
        for s in Grade::ALL {
            for m in Grade::ALL {
                assert!(codes.insert(zone_of(s, m).code));
            }
        }
        assert_eq!(codes.len(), 9);
    }

    #[test]
    fn corners_have_extreme_severity() {
        assert_eq!(zone_of(Grade::Safe, Grade::Safe).severity, Severity::Low);
        assert_eq!(zone_of(Grade::High, Grade::High).severity, Severity::Critical);
        assert_eq!(zone_of(Grade::Caution, Grade::High).severity, Severity::Elevated);
    }

    #[test]
    fn classify_zone_uses_one_pair_for_both_tracks() {
        let z = classify_zone(0.6, 0.7, GradeThresholds::CANONICAL);
        assert_eq!(z.code, "⑥");
    }

    #[test]
    fn checked_zone_rejects_non_probabilities() {
        let t = GradeThresholds::CANONICAL;
        for (sp, pd) in [(f64::NAN, 0.1), (0.1, f64::NAN), (f64::INFINITY, 0.1), (-0.01, 0.5), (0.5, 1.01)] {
            assert!(
                matches!(checked_zone(sp, pd, t), Err(RiskError::InvalidInput(_))),
                "({sp}, {pd}) accepted"
            );
        }
        assert_eq!(checked_zone(0.0, 1.0, t).unwrap().code, "③");
    }
}
