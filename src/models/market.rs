//! Market (price-path) risk of a lease deposit.
//!
//! The property value follows geometric Brownian motion with annual drift
//! `μ` and volatility `σ`. Under a price shock `s` the starting value is
//! `V0 (1 + s)`, and the tenant is exposed when the value at the end of the
//! term falls below the deposit:
//!
//! ```text
//! PD  = Φ((ln(B / (V0 (1+s))) - (μ - σ²/2) T) / (σ √T))
//! LGD = α B
//! EL  = PD · LGD
//! ```
//!
//! All amounts are in 만원. The safe-deposit ceiling `B*` is the largest
//! deposit whose loss ratio `EL / B = α · PD` stays within the cap.

use crate::classify::classify3;
use crate::domain::{
    BASE_SCENARIO, FinancialGrade, GradeThresholds, MarketArtifact, MarketAssessment, SafeDepositRange,
    ScenarioRisk,
};
use crate::error::{RiskError, RiskResult};
use crate::math::{Bracketed, bisect_max_feasible, lognormal_below};

/// Upper bound on bracket doublings when searching for `B*` (V0 · 2^64).
const MAX_BRACKET_DOUBLINGS: u32 = 64;

/// Loss-ratio cut-offs (% of the deposit per 1%p shock) for grades A and B.
const GRADE_A_BELOW: f64 = 5.0;
const GRADE_B_BELOW: f64 = 10.0;

/// Drift/volatility/term, validated once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceProcess {
    pub mu: f64,
    pub sigma: f64,
    pub term_years: f64,
}

impl PriceProcess {
    pub fn new(mu: f64, sigma: f64, term_years: f64) -> RiskResult<Self> {
        if !(term_years.is_finite() && term_years > 0.0) {
            return Err(RiskError::InvalidTerm { term: term_years });
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(RiskError::InvalidVolatility { sigma });
        }
        if !mu.is_finite() {
            return Err(RiskError::NonFinite("drift"));
        }
        Ok(Self { mu, sigma, term_years })
    }

    /// `P(V_T < deposit)` starting from `v0 (1 + shock)`. Saturates to 0/1.
    pub fn probability_of_default(&self, v0: f64, deposit: f64, shock: f64) -> f64 {
        let start = v0 * (1.0 + shock);
        lognormal_below(start, deposit, self.mu, self.sigma, self.term_years)
    }
}

/// Closed-form PD with input validation.
pub fn probability_of_default(v0: f64, deposit: f64, shock: f64, mu: f64, sigma: f64, term_years: f64) -> RiskResult<f64> {
    let process = PriceProcess::new(mu, sigma, term_years)?;
    Ok(process.probability_of_default(v0, deposit, shock))
}

/// PD / LGD / EL for one scenario.
pub fn scenario_risk(
    process: &PriceProcess,
    loss_severity: f64,
    v0: f64,
    deposit: f64,
    name: &str,
    shock: f64,
) -> ScenarioRisk {
    let pd = process.probability_of_default(v0, deposit, shock);
    let lgd = loss_severity * deposit;
    ScenarioRisk {
        name: name.to_string(),
        shock,
        pd,
        lgd,
        el: pd * lgd,
    }
}

/// `EL / B` for a deposit (0 for a non-positive deposit).
pub fn loss_ratio(process: &PriceProcess, loss_severity: f64, v0: f64, deposit: f64, shock: f64) -> f64 {
    if deposit <= 0.0 {
        return 0.0;
    }
    loss_severity * process.probability_of_default(v0, deposit, shock)
}

/// Largest deposit with `EL(B) / B <= el_cap`, to within `tolerance`.
///
/// `0` when the cap is not positive. When the cap never binds (`α <= el_cap`,
/// so no deposit breaches it) there is no ceiling and `f64::INFINITY` is
/// returned.
pub fn safe_deposit_ceiling(
    process: &PriceProcess,
    loss_severity: f64,
    v0: f64,
    shock: f64,
    el_cap: f64,
    tolerance: f64,
) -> RiskResult<f64> {
    if !(v0.is_finite() && v0 > 0.0) {
        return Err(RiskError::InvalidInput(format!("V0 must be > 0 (got {v0})")));
    }
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(RiskError::InvalidInput(format!("bisection tolerance must be > 0 (got {tolerance})")));
    }
    if el_cap.is_nan() || el_cap <= 0.0 {
        return Ok(0.0);
    }

    let feasible = |b: f64| loss_ratio(process, loss_severity, v0, b, shock) <= el_cap;
    match bisect_max_feasible(0.0, v0, MAX_BRACKET_DOUBLINGS, tolerance, feasible) {
        Bracketed::AboveCeiling(searched) => {
            tracing::warn!(el_cap, loss_severity, searched, "loss-ratio cap never binds; no deposit ceiling");
            Ok(f64::INFINITY)
        }
        found => Ok(found.value()),
    }
}

/// `B*` under the historical and the current drift.
pub fn safe_deposit_range(artifact: &MarketArtifact, v0: f64, term_years: f64) -> RiskResult<SafeDepositRange> {
    let shock = artifact
        .scenario(&artifact.ceiling_scenario)
        .map(|s| s.shock)
        .ok_or_else(|| {
            RiskError::artifact(
                "market",
                format!("ceiling_scenario `{}` is not a defined scenario", artifact.ceiling_scenario),
            )
        })?;

    let ceiling = |mu: f64| -> RiskResult<f64> {
        let process = PriceProcess::new(mu, artifact.sigma, term_years)?;
        safe_deposit_ceiling(
            &process,
            artifact.loss_severity,
            v0,
            shock,
            artifact.el_cap,
            artifact.ceiling_tolerance,
        )
    };

    let before = ceiling(artifact.mu_hist)?;
    let after = ceiling(artifact.mu_current)?;
    Ok(SafeDepositRange {
        before,
        after,
        low: before.min(after),
        high: before.max(after),
    })
}

/// EL change per 1%p of price shock, from base to the most severe scenario.
pub fn el_slope_per_pct(scenarios: &[ScenarioRisk]) -> f64 {
    let Some(base) = scenarios.iter().find(|s| s.name == BASE_SCENARIO) else {
        return 0.0;
    };
    let worst = scenarios
        .iter()
        .filter(|s| s.shock < 0.0)
        .min_by(|a, b| a.shock.total_cmp(&b.shock));
    match worst {
        Some(w) => (w.el - base.el) / (w.shock.abs() * 100.0),
        None => 0.0,
    }
}

/// Grade the EL slope relative to the deposit.
pub fn financial_grade(el_slope_per_pct: f64, deposit: f64) -> FinancialGrade {
    let loss_ratio = if deposit > 0.0 {
        el_slope_per_pct / deposit * 100.0
    } else {
        0.0
    };
    if loss_ratio < GRADE_A_BELOW {
        FinancialGrade::A
    } else if loss_ratio < GRADE_B_BELOW {
        FinancialGrade::B
    } else {
        FinancialGrade::C
    }
}

/// `V0 > 0` and `deposit >= 0`, both finite.
pub fn check_amounts(v0: f64, deposit: f64) -> RiskResult<()> {
    if !(v0.is_finite() && v0 > 0.0) {
        return Err(RiskError::InvalidInput(format!("V0 must be > 0 (got {v0})")));
    }
    if !(deposit.is_finite() && deposit >= 0.0) {
        return Err(RiskError::InvalidInput(format!("deposit must be >= 0 (got {deposit})")));
    }
    Ok(())
}

/// Full market assessment: every scenario, slope, grade and `B*` range.
pub fn assess_market(
    artifact: &MarketArtifact,
    v0: f64,
    deposit: f64,
    term_years: f64,
    thresholds: GradeThresholds,
) -> RiskResult<MarketAssessment> {
    let process = PriceProcess::new(artifact.mu_current, artifact.sigma, term_years)?;
    check_amounts(v0, deposit)?;

    // Base first, then the stresses in artifact order.
    let scenarios: Vec<ScenarioRisk> = artifact
        .scenarios
        .iter()
        .filter(|s| s.name == BASE_SCENARIO)
        .chain(artifact.scenarios.iter().filter(|s| s.name != BASE_SCENARIO))
        .map(|s| scenario_risk(&process, artifact.loss_severity, v0, deposit, &s.name, s.shock))
        .collect();
    if scenarios.first().map(|s| s.name.as_str()) != Some(BASE_SCENARIO) {
        return Err(RiskError::artifact("market", "missing `base` scenario"));
    }

    let el_slope_per_pct = el_slope_per_pct(&scenarios);
    let safe_deposit = safe_deposit_range(artifact, v0, term_years)?;
    let pd_base = scenarios[0].pd;

    let assessment = MarketAssessment {
        v0,
        deposit,
        term_years,
        jeonse_ratio: deposit / v0,
        el_slope_per_pct,
        financial_grade: financial_grade(el_slope_per_pct, deposit),
        deposit_exceeds_ceiling: deposit > safe_deposit.after,
        safe_deposit,
        grade: classify3(pd_base, thresholds),
        scenarios,
    };
    tracing::debug!(
        pd_base,
        el_base = assessment.el_base(),
        b_low = assessment.safe_deposit.low,
        b_high = assessment.safe_deposit.high,
        "market assessment"
    );
    Ok(assessment)
}
