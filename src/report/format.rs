//! Formatted terminal output.
//!
//! Formatting lives in one place so the models stay free of presentation
//! and output changes stay localized.

use crate::domain::{MarketAssessment, RiskAssessment, StructuralAssessment, ZoneVerdict};
use crate::models::PdCrossCheck;

/// Full report for one assessment.
pub fn format_assessment(a: &RiskAssessment) -> String {
    let mut out = String::new();

    out.push_str("=== jeonse - lease risk assessment ===\n");
    out.push_str(&format!(
        "Lot: {} | PNU: {} | area={:.2}㎡ floor={} | deposit={} | term={}y\n\n",
        a.request.lot,
        a.structural.parcel,
        a.request.area_sqm,
        a.request.floor,
        group_thousands(a.request.deposit),
        a.request.term_years,
    ));

    out.push_str(&format_structural(&a.structural));
    out.push('\n');
    out.push_str(&format_market(&a.market));
    out.push('\n');
    out.push_str(&format_zone(&a.zone));

    if !a.commentary.is_empty() {
        out.push_str("\nFacts:\n");
        for line in &a.commentary {
            out.push_str(&format!("- {line}\n"));
        }
    }
    out
}

pub fn format_structural(s: &StructuralAssessment) -> String {
    let mut out = String::new();
    out.push_str("Structural risk (fraud-pattern similarity):\n");
    out.push_str(&format!("- probability: {:.4} ({})\n", s.probability, s.grade));
    out.push_str(&format!("- V0 (hedonic): {}\n", group_thousands(s.v0)));
    out.push_str(&format!("- location: ({:.6}, {:.6})\n", s.latitude, s.longitude));
    let f = &s.features;
    out.push_str(&format!(
        "- effective LTV={:.2}% overhang={} nearby auctions={} local Moran's I={:.4} (nearest event {:.3} km)\n",
        f.effective_ltv,
        group_thousands(f.deposit_overhang),
        f.nearby_auction_1km,
        f.local_morans_i,
        f.nearest_event_km,
    ));
    let woe: Vec<String> = s.woe.iter().map(|(k, v)| format!("{k}={v:.4}")).collect();
    out.push_str(&format!("- WOE: {}\n", woe.join(" ")));
    out
}

pub fn format_market(m: &MarketAssessment) -> String {
    let mut out = String::new();
    out.push_str("Market risk (price-path):\n");
    out.push_str(&format!(
        "  {:<10} {:>7} {:>9} {:>12} {:>12}\n",
        "scenario", "shock", "PD", "LGD", "EL"
    ));
    for s in &m.scenarios {
        out.push_str(&format!(
            "  {:<10} {:>6.1}% {:>8.2}% {:>12} {:>12}\n",
            s.name,
            s.shock * 100.0,
            s.pd * 100.0,
            group_thousands(s.lgd),
            group_thousands(s.el),
        ));
    }
    out.push_str(&format!(
        "- jeonse ratio: {:.1}% | EL per 1%p: {} | financial grade: {:?} | market grade: {}\n",
        m.jeonse_ratio * 100.0,
        group_thousands(m.el_slope_per_pct),
        m.financial_grade,
        m.grade,
    ));
    out.push_str(&format!(
        "- safe deposit B*: {} ~ {} (historical drift {}, current drift {}){}\n",
        ceiling(m.safe_deposit.low),
        ceiling(m.safe_deposit.high),
        ceiling(m.safe_deposit.before),
        ceiling(m.safe_deposit.after),
        if m.deposit_exceeds_ceiling { " [deposit above ceiling]" } else { "" },
    ));
    out
}

pub fn format_zone(z: &ZoneVerdict) -> String {
    format!("Zone {} {} [{:?}]\n  {}\n", z.code, z.name, z.severity, z.description)
}

pub fn format_simulation(sim: &PdCrossCheck) -> String {
    format!(
        "Monte-Carlo PD ({}): {:.4}% ± {:.4}% over {} paths (seed {}) | closed form {:.4}%\n",
        sim.scenario,
        sim.simulated.pd * 100.0,
        sim.simulated.std_error * 100.0,
        sim.simulated.paths,
        sim.simulated.seed,
        sim.closed_form * 100.0,
    )
}

/// A deposit ceiling, or `unbounded` when the cap never binds.
pub fn ceiling(value: f64) -> String {
    if value == f64::INFINITY {
        "unbounded".to_string()
    } else {
        group_thousands(value)
    }
}

/// `1234567.8` → `"1,234,568"`.
pub fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.4), "999");
        assert_eq!(group_thousands(27000.0), "27,000");
        assert_eq!(group_thousands(1234567.8), "1,234,568");
        assert_eq!(group_thousands(-45210.0), "-45,210");
    }

    #[test]
    fn infinite_ceiling_reads_unbounded() {
        assert_eq!(ceiling(f64::INFINITY), "unbounded");
        assert_eq!(ceiling(31593.2), "31,593");
    }
}
