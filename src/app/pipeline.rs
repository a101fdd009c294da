//! Shared assessment pipeline used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parcel key -> hedonic V0 -> structural features -> WOE score -> market risk -> zone
//!
//! The pipeline owns nothing mutable: reference data is injected once as an
//! `Arc` and shared by every request (and every rayon worker in batch mode).

use std::sync::Arc;

use rayon::prelude::*;

use crate::classify::{checked_zone, classify3};
use crate::data::ReferenceData;
use crate::domain::{
    AssessmentRequest, BatchOutcome, DEFAULT_DISTRICT_CODE, GradeThresholds, MarketAssessment, ParcelKey,
    RiskAssessment, StructuralAssessment, ZoneVerdict,
};
use crate::error::{RiskError, RiskResult};
use crate::models::{
    PdCrossCheck, PriceProcess, UnitSpec, assess_market, check_amounts, estimate_value, score, simulate_pd,
};
use crate::report::{market_comments, structural_comments};
use crate::spatial::structural_features;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// District prefix for parcel keys.
    pub district_code: String,
    /// One pair for both tracks and the zone map.
    pub thresholds: GradeThresholds,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            district_code: DEFAULT_DISTRICT_CODE.to_string(),
            thresholds: GradeThresholds::CANONICAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    data: Arc<ReferenceData>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(data: Arc<ReferenceData>, options: PipelineOptions) -> Self {
        Self { data, options }
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn parcel_key(&self, lot: &str) -> RiskResult<ParcelKey> {
        ParcelKey::from_lot(lot, &self.options.district_code).ok_or_else(|| RiskError::InvalidParcel {
            raw: lot.to_string(),
        })
    }

    /// Track A: hedonic value, structural features and the WOE/logistic score.
    pub fn assess_structural_risk(
        &self,
        lot: &str,
        area_sqm: f64,
        floor: i32,
        deposit: f64,
    ) -> RiskResult<StructuralAssessment> {
        if !(deposit.is_finite() && deposit >= 0.0) {
            return Err(RiskError::InvalidInput(format!("deposit must be >= 0 (got {deposit})")));
        }
        let parcel = self.parcel_key(lot)?;

        let estimate = estimate_value(&self.data, &parcel, UnitSpec { area_sqm, floor })?;
        let features = structural_features(
            deposit,
            estimate.v0,
            estimate.latitude,
            estimate.longitude,
            &self.data.lease_events,
        )?;
        let scored = score(&self.data.structural, &features, self.options.thresholds)?;

        Ok(StructuralAssessment {
            parcel,
            probability: scored.probability,
            grade: scored.grade,
            v0: estimate.v0,
            latitude: estimate.latitude,
            longitude: estimate.longitude,
            features,
            woe: scored.woe,
        })
    }

    /// Track B: scenario PD/LGD/EL and the safe-deposit range.
    pub fn assess_market_risk(&self, v0: f64, deposit: f64, term_years: f64) -> RiskResult<MarketAssessment> {
        assess_market(&self.data.market, v0, deposit, term_years, self.options.thresholds)
    }

    /// Zone for two probabilities; NaN, infinities and values outside `[0, 1]`
    /// are input errors.
    pub fn classify_zone(&self, structural_probability: f64, market_pd: f64) -> RiskResult<ZoneVerdict> {
        checked_zone(structural_probability, market_pd, self.options.thresholds)
    }

    /// Both tracks, the zone and the commentary for one request.
    pub fn assess(&self, request: &AssessmentRequest) -> RiskResult<RiskAssessment> {
        let structural = self.assess_structural_risk(&request.lot, request.area_sqm, request.floor, request.deposit)?;
        let market = self.assess_market_risk(structural.v0, request.deposit, request.term_years)?;

        let (p, pd) = (structural.probability, market.pd_base());
        if !(p.is_finite() && pd.is_finite()) {
            return Err(RiskError::NonFinite("risk probability"));
        }

        let structural_grade = classify3(p, self.options.thresholds);
        let market_grade = classify3(pd, self.options.thresholds);
        let zone = self.classify_zone(p, pd)?;

        let mut commentary = structural_comments(&structural.features, self.data.total_suspected);
        commentary.extend(market_comments(&market));

        tracing::info!(
            lot = %request.lot,
            parcel = %structural.parcel,
            structural_probability = p,
            market_pd = pd,
            zone = zone.code,
            "assessment complete"
        );

        Ok(RiskAssessment {
            request: request.clone(),
            structural,
            market,
            structural_grade,
            market_grade,
            zone,
            commentary,
        })
    }

    /// Assess independent requests in parallel; output keeps input order.
    pub fn assess_batch(&self, requests: &[AssessmentRequest]) -> Vec<BatchOutcome> {
        requests
            .par_iter()
            .map(|request| BatchOutcome {
                request: request.clone(),
                result: self.assess(request),
            })
            .collect()
    }

    /// Closed-form PD next to a seeded Monte-Carlo estimate (current drift).
    pub fn cross_check_pd(
        &self,
        v0: f64,
        deposit: f64,
        term_years: f64,
        scenario: &str,
        paths: usize,
        seed: u64,
    ) -> RiskResult<PdCrossCheck> {
        let market = &self.data.market;
        let shock = market
            .scenario(scenario)
            .map(|s| s.shock)
            .ok_or_else(|| RiskError::InvalidInput(format!("unknown scenario `{scenario}`")))?;
        let process = PriceProcess::new(market.mu_current, market.sigma, term_years)?;
        check_amounts(v0, deposit)?;

        let closed_form = process.probability_of_default(v0, deposit, shock);
        let simulated = simulate_pd(&process, v0, deposit, shock, paths, seed)?;
        Ok(PdCrossCheck {
            scenario: scenario.to_string(),
            closed_form,
            simulated,
        })
    }
}
