//! Plain-language fact sentences attached to an assessment.

use crate::domain::{MarketAssessment, StructuralFeatures};
use crate::report::group_thousands;

/// Leverage and neighbourhood-auction facts.
///
/// `total_suspected` is the number of suspected-fraud auctions in the whole
/// reference table; when it is positive the local count is also given as a
/// share of it.
pub fn structural_comments(features: &StructuralFeatures, total_suspected: u32) -> Vec<String> {
    let ltv = features.effective_ltv;
    let nearby = features.nearby_auction_1km;

    let mut out = vec![format!(
        "The deposit is {ltv:.2}% of the estimated sale value, leaving the owner roughly {:.2}% equity.",
        (100.0 - ltv).max(0.0)
    )];

    if total_suspected > 0 {
        let pct = f64::from(nearby) / f64::from(total_suspected) * 100.0;
        out.push(format!(
            "{nearby} auction(s) flagged as suspected lease fraud occurred within 1 km over the last 4 years \
             (about {pct:.2}% of all {total_suspected} suspected cases)."
        ));
    } else {
        out.push(format!(
            "{nearby} auction(s) flagged as suspected lease fraud occurred within 1 km over the last 4 years."
        ));
    }
    out
}

/// Rate sensitivity and safe-deposit facts.
pub fn market_comments(market: &MarketAssessment) -> Vec<String> {
    let mut out = vec![format!(
        "Each 1%p fall in prices raises the expected loss by about {} (10k KRW).",
        group_thousands(market.el_slope_per_pct)
    )];

    let range = &market.safe_deposit;
    if range.is_bounded() {
        out.push(format!(
            "Safe deposit ceiling: {} to {} (10k KRW), under current and historical drift.",
            group_thousands(range.low),
            group_thousands(range.high)
        ));
    } else if range.low.is_finite() {
        out.push(format!(
            "Safe deposit ceiling: {} (10k KRW) under the current drift; no ceiling under the historical drift.",
            group_thousands(range.low)
        ));
    } else {
        out.push("No safe deposit ceiling: the expected-loss cap is never reached at any deposit.".to_string());
    }

    if market.deposit_exceeds_ceiling {
        out.push(format!(
            "The deposit of {} exceeds the ceiling under the current drift ({}).",
            group_thousands(market.deposit),
            group_thousands(range.after)
        ));
    }
    out
}
