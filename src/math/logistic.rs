//! Logistic link and rounding helpers for model outputs.

/// `1 / (1 + e^{-z})`, evaluated without overflow for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Round to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_stable_at_the_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!(sigmoid(-745.0).is_finite());
    }

    #[test]
    fn rounds_to_four_places() {
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(0.999_96, 4), 1.0);
    }
}
