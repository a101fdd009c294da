//! Fitted model artifacts.
//!
//! These are produced by the offline fitting notebooks and shipped as JSON next
//! to the reference tables. Feature names are typed enums, so a misspelled or
//! unknown feature fails at deserialization and a missing bin table fails in
//! `validate`, before any request is scored.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Regressors of the hedonic (log-price) model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedonicFeature {
    AreaPyeong,
    Floor,
    BuildingAge,
    BuildingAgeSq,
    AreaFloorInter,
    InDistrict,
    LeaseAvgDeposit,
    BaseRate,
    LeaseAvgRent,
    LeaseCount,
    ParkDistance,
    SchoolDistance,
    RetailDistance,
    BuyerCorporate,
    SellerIndividual,
    SellerM,
    DirectTrade,
    AgeBuycorpInter,
}

/// Inputs of the structural (WOE + logistic) model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructuralFeature {
    #[serde(rename = "effective_LTV")]
    EffectiveLtv,
    #[serde(rename = "deposit_overhang")]
    DepositOverhang,
    #[serde(rename = "nearby_auction_1km")]
    NearbyAuction1km,
    #[serde(rename = "local_morans_i")]
    LocalMoransI,
}

impl StructuralFeature {
    pub fn name(self) -> &'static str {
        match self {
            StructuralFeature::EffectiveLtv => "effective_LTV",
            StructuralFeature::DepositOverhang => "deposit_overhang",
            StructuralFeature::NearbyAuction1km => "nearby_auction_1km",
            StructuralFeature::LocalMoransI => "local_morans_i",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedonicArtifact {
    pub features: Vec<HedonicFeature>,
    /// `[intercept, β_1, ..., β_n]` in `features` order.
    pub coefficients: Vec<f64>,
}

impl HedonicArtifact {
    pub fn validate(&self) -> RiskResult<()> {
        if self.features.is_empty() {
            return Err(RiskError::artifact("hedonic", "feature list is empty"));
        }
        if self.coefficients.len() != self.features.len() + 1 {
            return Err(RiskError::artifact(
                "hedonic",
                format!(
                    "expected {} coefficients (intercept + {} features), found {}",
                    self.features.len() + 1,
                    self.features.len(),
                    self.coefficients.len()
                ),
            ));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(RiskError::artifact("hedonic", "non-finite coefficient"));
        }
        ensure_unique(&self.features, "hedonic")
    }
}

/// Which side of each bin interval is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinClosure {
    /// `(a, b]`, with the first bin `[e0, e1]`.
    #[default]
    Right,
    /// `[a, b)`, with the last bin `[e_{n-1}, e_n]`.
    Left,
}

/// Bin edges and per-bin WOE values for one feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinTable {
    pub edges: Vec<f64>,
    /// Bin index → WOE. Bins without an entry score 0.
    pub woe: BTreeMap<usize, f64>,
}

impl BinTable {
    /// Index of the bin containing `value`, or `None` outside the edges.
    pub fn bin_index(&self, value: f64, closure: BinClosure) -> Option<usize> {
        if !value.is_finite() || self.edges.len() < 2 {
            return None;
        }
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];
        if value < first || value > last {
            return None;
        }

        let n_bins = self.edges.len() - 1;
        match closure {
            BinClosure::Right => {
                if value == first {
                    return Some(0);
                }
                // First edge >= value closes the bin on the right.
                let upper = self.edges.partition_point(|&e| e < value);
                Some(upper - 1)
            }
            BinClosure::Left => {
                if value == last {
                    return Some(n_bins - 1);
                }
                let upper = self.edges.partition_point(|&e| e <= value);
                Some(upper - 1)
            }
        }
    }

    /// WOE for `value`; `0.0` when the value or its bin has no entry.
    pub fn woe_for(&self, value: f64, closure: BinClosure) -> f64 {
        self.bin_index(value, closure)
            .and_then(|idx| self.woe.get(&idx).copied())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralArtifact {
    pub features: Vec<StructuralFeature>,
    pub bins: BTreeMap<StructuralFeature, BinTable>,
    pub intercept: f64,
    /// Logistic weights in `features` order.
    pub weights: Vec<f64>,
    #[serde(default)]
    pub closed: BinClosure,
}

impl StructuralArtifact {
    pub fn validate(&self) -> RiskResult<()> {
        if self.features.is_empty() {
            return Err(RiskError::artifact("structural", "feature list is empty"));
        }
        if self.weights.len() != self.features.len() {
            return Err(RiskError::artifact(
                "structural",
                format!(
                    "expected {} logistic weights, found {}",
                    self.features.len(),
                    self.weights.len()
                ),
            ));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(RiskError::artifact("structural", "non-finite logistic weight"));
        }
        ensure_unique(&self.features, "structural")?;

        for feature in &self.features {
            let table = self.bins.get(feature).ok_or_else(|| {
                RiskError::artifact("structural", format!("no bin table for feature `{}`", feature.name()))
            })?;
            if table.edges.len() < 2 {
                return Err(RiskError::artifact(
                    "structural",
                    format!("feature `{}` needs at least two bin edges", feature.name()),
                ));
            }
            if table.edges.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(RiskError::artifact(
                    "structural",
                    format!("bin edges for `{}` must be strictly increasing", feature.name()),
                ));
            }
            if table.woe.values().any(|v| !v.is_finite()) {
                return Err(RiskError::artifact(
                    "structural",
                    format!("non-finite WOE value for `{}`", feature.name()),
                ));
            }
        }
        Ok(())
    }

    pub fn table(&self, feature: StructuralFeature) -> Option<&BinTable> {
        self.bins.get(&feature)
    }
}

/// A named fractional price shock (`-0.10` = 10% fall).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub shock: f64,
}

/// Name of the mandatory unshocked scenario.
pub const BASE_SCENARIO: &str = "base";

fn default_ceiling_tolerance() -> f64 {
    100.0
}

/// Parameters of the market-risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketArtifact {
    /// Long-run historical drift (annual).
    pub mu_hist: f64,
    /// Drift adjusted to the current rate environment (annual).
    pub mu_current: f64,
    /// Annual volatility of log prices.
    pub sigma: f64,
    /// Fraction of the deposit lost when the property goes to auction.
    pub loss_severity: f64,
    pub scenarios: Vec<Scenario>,
    /// Scenario whose shock the safe-deposit solver applies.
    pub ceiling_scenario: String,
    /// Maximum tolerated `EL / deposit`.
    pub el_cap: f64,
    /// Bisection tolerance in currency units.
    #[serde(default = "default_ceiling_tolerance")]
    pub ceiling_tolerance: f64,
}

impl MarketArtifact {
    pub fn validate(&self) -> RiskResult<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(RiskError::InvalidVolatility { sigma: self.sigma });
        }
        if !(self.mu_hist.is_finite() && self.mu_current.is_finite()) {
            return Err(RiskError::artifact("market", "drift must be finite"));
        }
        if !(self.loss_severity.is_finite() && (0.0..=1.0).contains(&self.loss_severity)) {
            return Err(RiskError::artifact("market", "loss_severity must be within [0, 1]"));
        }
        if !(self.el_cap.is_finite() && self.el_cap >= 0.0) {
            return Err(RiskError::artifact("market", "el_cap must be finite and >= 0"));
        }
        if !(self.ceiling_tolerance.is_finite() && self.ceiling_tolerance > 0.0) {
            return Err(RiskError::artifact("market", "ceiling_tolerance must be > 0"));
        }
        if self.scenarios.iter().any(|s| !(s.shock.is_finite() && s.shock > -1.0)) {
            return Err(RiskError::artifact("market", "scenario shocks must be finite and > -1"));
        }
        let mut names = HashSet::new();
        if !self.scenarios.iter().all(|s| names.insert(s.name.as_str())) {
            return Err(RiskError::artifact("market", "duplicate scenario name"));
        }
        if self.scenario(BASE_SCENARIO).is_none() {
            return Err(RiskError::artifact("market", "missing `base` scenario"));
        }
        if self.scenario(&self.ceiling_scenario).is_none() {
            return Err(RiskError::artifact(
                "market",
                format!("ceiling_scenario `{}` is not a defined scenario", self.ceiling_scenario),
            ));
        }
        Ok(())
    }

    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

fn ensure_unique<T: Eq + std::hash::Hash + std::fmt::Debug>(features: &[T], artifact: &str) -> RiskResult<()> {
    let mut seen = HashSet::new();
    for f in features {
        if !seen.insert(f) {
            return Err(RiskError::artifact(artifact, format!("duplicate feature {f:?}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(edges: &[f64]) -> BinTable {
        BinTable {
            edges: edges.to_vec(),
            woe: edges.iter().enumerate().skip(1).map(|(i, _)| (i - 1, i as f64)).collect(),
        }
    }

    #[test]
    fn right_closed_bins_include_lowest_edge() {
        let t = table(&[0.0, 50.0, 100.0, 200.0]);
        assert_eq!(t.bin_index(0.0, BinClosure::Right), Some(0));
        assert_eq!(t.bin_index(50.0, BinClosure::Right), Some(0));
        assert_eq!(t.bin_index(50.1, BinClosure::Right), Some(1));
        assert_eq!(t.bin_index(200.0, BinClosure::Right), Some(2));
        assert_eq!(t.bin_index(200.1, BinClosure::Right), None);
        assert_eq!(t.bin_index(-0.1, BinClosure::Right), None);
    }

    #[test]
    fn left_closed_bins_include_highest_edge() {
        let t = table(&[0.0, 50.0, 100.0, 200.0]);
        assert_eq!(t.bin_index(0.0, BinClosure::Left), Some(0));
        assert_eq!(t.bin_index(50.0, BinClosure::Left), Some(1));
        assert_eq!(t.bin_index(49.9, BinClosure::Left), Some(0));
        assert_eq!(t.bin_index(200.0, BinClosure::Left), Some(2));
    }

    #[test]
    fn out_of_range_and_missing_bins_score_zero() {
        let mut t = table(&[0.0, 1.0, 2.0]);
        assert_eq!(t.woe_for(5.0, BinClosure::Right), 0.0);
        assert_eq!(t.woe_for(f64::NAN, BinClosure::Right), 0.0);
        t.woe.remove(&1);
        assert_eq!(t.woe_for(1.5, BinClosure::Right), 0.0);
        assert_eq!(t.woe_for(0.5, BinClosure::Right), 1.0);
    }

    #[test]
    fn structural_artifact_requires_every_bin_table() {
        let artifact = StructuralArtifact {
            features: vec![StructuralFeature::EffectiveLtv, StructuralFeature::LocalMoransI],
            bins: [(StructuralFeature::EffectiveLtv, table(&[0.0, 1.0]))].into_iter().collect(),
            intercept: 0.0,
            weights: vec![1.0, 1.0],
            closed: BinClosure::Right,
        };
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("local_morans_i"), "{err}");
    }

    #[test]
    fn hedonic_artifact_checks_coefficient_count() {
        let artifact = HedonicArtifact {
            features: vec![HedonicFeature::AreaPyeong, HedonicFeature::Floor],
            coefficients: vec![1.0, 0.1],
        };
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn market_artifact_requires_base_and_ceiling_scenarios() {
        let mut artifact = MarketArtifact {
            mu_hist: 0.03,
            mu_current: 0.01,
            sigma: 0.08,
            loss_severity: 0.3,
            scenarios: vec![Scenario { name: "stress20".to_string(), shock: -0.2 }],
            ceiling_scenario: "stress20".to_string(),
            el_cap: 0.01,
            ceiling_tolerance: 100.0,
        };
        assert!(artifact.validate().is_err());
        artifact.scenarios.insert(0, Scenario { name: BASE_SCENARIO.to_string(), shock: 0.0 });
        assert!(artifact.validate().is_ok());
        artifact.ceiling_scenario = "stress30".to_string();
        assert!(artifact.validate().is_err());
    }
}
