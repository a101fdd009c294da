//! Structural (fraud-pattern) risk: WOE binning + logistic regression.
//!
//! Each feature is binned with the artifact's edges, replaced by its bin's
//! weight of evidence, and the WOE vector goes through the fitted logistic
//! model. The probability is reported to 4 decimals.

use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::classify::classify3;
use crate::domain::{Grade, GradeThresholds, StructuralArtifact, StructuralFeature, StructuralFeatures};
use crate::error::{RiskError, RiskResult};
use crate::math::{round_to, sigmoid};

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralScore {
    /// Probability of the fraud/auction class, rounded to 4 decimals.
    pub probability: f64,
    pub grade: Grade,
    /// WOE per feature name, for explanations.
    pub woe: BTreeMap<String, f64>,
}

pub fn feature_input(feature: StructuralFeature, features: &StructuralFeatures) -> f64 {
    match feature {
        StructuralFeature::EffectiveLtv => features.effective_ltv,
        StructuralFeature::DepositOverhang => features.deposit_overhang,
        StructuralFeature::NearbyAuction1km => f64::from(features.nearby_auction_1km),
        StructuralFeature::LocalMoransI => features.local_morans_i,
    }
}

/// WOE vector in artifact feature order.
pub fn woe_vector(artifact: &StructuralArtifact, features: &StructuralFeatures) -> RiskResult<DVector<f64>> {
    let mut woe = DVector::zeros(artifact.features.len());
    for (i, &feature) in artifact.features.iter().enumerate() {
        let table = artifact.table(feature).ok_or_else(|| {
            RiskError::artifact("structural", format!("no bin table for feature `{}`", feature.name()))
        })?;
        woe[i] = table.woe_for(feature_input(feature, features), artifact.closed);
    }
    Ok(woe)
}

pub fn score(
    artifact: &StructuralArtifact,
    features: &StructuralFeatures,
    thresholds: GradeThresholds,
) -> RiskResult<StructuralScore> {
    let woe = woe_vector(artifact, features)?;
    let weights = DVector::from_column_slice(&artifact.weights);
    let z = artifact.intercept + weights.dot(&woe);
    if !z.is_finite() {
        return Err(RiskError::NonFinite("structural linear predictor"));
    }

    let probability = round_to(sigmoid(z), 4);
    let grade = classify3(probability, thresholds);

    let woe: BTreeMap<String, f64> = artifact
        .features
        .iter()
        .zip(woe.iter())
        .map(|(f, &w)| (f.name().to_string(), w))
        .collect();

    tracing::debug!(probability, %grade, ?woe, "structural score");

    Ok(StructuralScore {
        probability,
        grade,
        woe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BinClosure, BinTable};

    fn table(edges: &[f64], woe: &[(usize, f64)]) -> BinTable {
        BinTable {
            edges: edges.to_vec(),
            woe: woe.iter().copied().collect(),
        }
    }

    fn artifact() -> StructuralArtifact {
        StructuralArtifact {
            features: vec![StructuralFeature::EffectiveLtv, StructuralFeature::NearbyAuction1km],
            bins: [
                (
                    StructuralFeature::EffectiveLtv,
                    table(&[0.0, 70.0, 100.0, 1000.0], &[(0, -1.0), (1, 0.2), (2, 1.5)]),
                ),
                (StructuralFeature::NearbyAuction1km, table(&[0.0, 2.0, 100.0], &[(0, -0.5), (1, 1.0)])),
            ]
            .into_iter()
            .collect(),
            intercept: -0.2,
            weights: vec![0.8, 0.6],
            closed: BinClosure::Right,
        }
    }

    fn features(ltv: f64, nearby: u32) -> StructuralFeatures {
        StructuralFeatures {
            effective_ltv: ltv,
            deposit_overhang: 0.0,
            nearby_auction_1km: nearby,
            local_morans_i: 0.0,
            nearest_event_km: 0.0,
        }
    }

    #[test]
    fn probability_is_logistic_of_woe() {
        let s = score(&artifact(), &features(60.0, 0), GradeThresholds::CANONICAL).unwrap();
        let expected = round_to(sigmoid(-0.2 + 0.8 * -1.0 + 0.6 * -0.5), 4);
        assert_eq!(s.probability, expected);
        assert_eq!(s.grade, Grade::Safe);
        assert_eq!(s.woe["effective_LTV"], -1.0);
        assert_eq!(s.woe["nearby_auction_1km"], -0.5);
    }

    #[test]
    fn high_leverage_and_many_auctions_grade_high() {
        let s = score(&artifact(), &features(140.0, 9), GradeThresholds::CANONICAL).unwrap();
        assert!(s.probability >= 0.68, "{}", s.probability);
        assert_eq!(s.grade, Grade::High);
    }

    #[test]
    fn out_of_range_values_contribute_nothing() {
        let s = score(&artifact(), &features(5000.0, 500), GradeThresholds::CANONICAL).unwrap();
        assert_eq!(s.probability, round_to(sigmoid(-0.2), 4));
    }
}
