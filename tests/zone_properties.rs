//! Property tests for grading and the zone map.

use jeonse_risk::classify::{classify3, classify_zone, zone_of};
use jeonse_risk::domain::{Grade, GradeThresholds};
use proptest::prelude::*;

fn thresholds() -> impl Strategy<Value = GradeThresholds> {
    (0.0f64..1.0, 0.0f64..1.0)
        .prop_filter("caution < high", |(a, b)| a != b)
        .prop_map(|(a, b)| GradeThresholds::new(a.min(b), a.max(b)).expect("ordered pair"))
}

fn grade() -> impl Strategy<Value = Grade> {
    prop::sample::select(Grade::ALL.to_vec())
}

proptest! {
    #[test]
    fn higher_probability_never_lowers_the_grade(t in thresholds(), p1 in 0.0f64..=1.0, p2 in 0.0f64..=1.0) {
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        prop_assert!(classify3(lo, t) <= classify3(hi, t));
    }

    #[test]
    fn zone_lookup_is_deterministic(s in grade(), m in grade()) {
        prop_assert_eq!(zone_of(s, m), zone_of(s, m));
    }

    #[test]
    fn classify_zone_agrees_with_grades(p in 0.0f64..=1.0, pd in 0.0f64..=1.0) {
        let t = GradeThresholds::CANONICAL;
        prop_assert_eq!(classify_zone(p, pd, t), zone_of(classify3(p, t), classify3(pd, t)));
    }
}
