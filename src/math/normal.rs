//! Standard normal and lognormal probabilities.
//!
//! Arguments at the numeric limits (`±inf`) saturate to exactly 0 or 1; NaN is
//! never returned for a non-NaN argument.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;

/// Standard normal CDF `Φ(x) = erfc(-x/√2) / 2`.
pub fn std_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    (0.5 * erfc(-x / SQRT_2)).clamp(0.0, 1.0)
}

/// `P(S_T < barrier)` for `S_T = s0 · exp((μ - σ²/2)T + σ√T Z)`.
///
/// Callers validate `sigma > 0` and `t > 0`; here a non-positive barrier gives
/// 0 and a non-positive start value gives 1.
pub fn lognormal_below(s0: f64, barrier: f64, mu: f64, sigma: f64, t: f64) -> f64 {
    if barrier <= 0.0 {
        return 0.0;
    }
    if s0 <= 0.0 {
        return 1.0;
    }
    let d = ((barrier / s0).ln() - (mu - 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
    if d.is_nan() {
        return 0.0;
    }
    std_normal_cdf(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_reference_values() {
        assert!((std_normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((std_normal_cdf(1.96) - 0.975_002_104_851_78).abs() < 1e-9);
        assert!((std_normal_cdf(-1.0) - 0.158_655_253_931_457).abs() < 1e-9);
    }

    #[test]
    fn cdf_saturates() {
        assert_eq!(std_normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(std_normal_cdf(f64::NEG_INFINITY), 0.0);
        assert!(std_normal_cdf(-40.0) >= 0.0);
        assert!(std_normal_cdf(40.0) <= 1.0);
    }

    #[test]
    fn lognormal_below_edge_cases() {
        assert_eq!(lognormal_below(100.0, 0.0, 0.0, 0.1, 1.0), 0.0);
        assert_eq!(lognormal_below(0.0, 50.0, 0.0, 0.1, 1.0), 1.0);
        // At-the-money with zero drift: slightly above 1/2 because of the -σ²/2 term.
        let p = lognormal_below(100.0, 100.0, 0.0, 0.2, 1.0);
        assert!(p > 0.5 && p < 0.6, "{p}");
    }
}
