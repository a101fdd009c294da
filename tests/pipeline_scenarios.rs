//! End-to-end scenarios over the on-disk reference fixtures.

use std::path::PathBuf;
use std::sync::Arc;

use jeonse_risk::app::pipeline::{Pipeline, PipelineOptions};
use jeonse_risk::data::{ReferenceData, ReferenceStore};
use jeonse_risk::domain::{AssessmentRequest, Grade, GradeThresholds, ParcelKey, Severity};
use jeonse_risk::error::RiskError;
use jeonse_risk::io::write_assessment_json;
use jeonse_risk::models::{UnitSpec, estimate_value};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/reference")
}

fn load() -> Arc<ReferenceData> {
    ReferenceStore::new(fixture_dir()).load_once().expect("fixtures load")
}

fn pipeline() -> Pipeline {
    Pipeline::new(load(), PipelineOptions::default())
}

fn request(lot: &str, area_sqm: f64, floor: i32, deposit: f64) -> AssessmentRequest {
    AssessmentRequest {
        lot: lot.to_string(),
        area_sqm,
        floor,
        deposit,
        term_years: 2.0,
    }
}

#[test]
fn fixtures_load_with_bad_rows_skipped() {
    let data = load();
    // One trade row has an unparseable PNU.
    assert_eq!(data.trades.len(), 5);
    assert_eq!(data.lease_events.len(), 11);
    assert_eq!(data.locations.len(), 2);
    // Incomplete lease rows still count as suspected cases.
    assert_eq!(data.total_suspected, 8);
}

#[test]
fn covered_deposit_far_from_auctions_is_optimal_safe() {
    let a = pipeline().assess(&request("366-50", 29.94, 4, 27000.0)).unwrap();

    assert_eq!(a.structural.parcel.as_str(), "1150010300103660050");
    // Latest dated trade (2023) wins over the older and the dateless one.
    assert!((a.structural.v0 - 47_999.35).abs() < 1.0, "v0 = {}", a.structural.v0);

    let f = &a.structural.features;
    assert!(f.deposit_overhang < 0.0);
    assert!((f.effective_ltv - 56.25).abs() < 0.01);
    assert_eq!(f.nearby_auction_1km, 0);
    assert_eq!(f.local_morans_i, -0.12);

    assert!(a.structural.probability < 0.56);
    assert_eq!(a.structural_grade, Grade::Safe);
    assert!(a.market.pd_base() < 0.56);
    assert_eq!(a.market_grade, Grade::Safe);

    assert_eq!(a.zone.code, "①");
    assert_eq!(a.zone.severity, Severity::Low);

    let range = a.market.safe_deposit;
    assert!(range.low <= range.high);
    assert!(!a.market.deposit_exceeds_ceiling);
    assert!(range.after > 27000.0, "{range:?}");
}

#[test]
fn leveraged_deposit_in_auction_cluster_is_prohibited() {
    let a = pipeline().assess(&request("50-120", 43.92, 3, 12500.0)).unwrap();

    let f = &a.structural.features;
    assert!(f.effective_ltv > 100.0);
    assert!(f.deposit_overhang > 0.0);
    assert_eq!(f.nearby_auction_1km, 5);
    assert_eq!(f.local_morans_i, 0.81);

    assert!(a.structural.probability >= 0.68, "p = {}", a.structural.probability);
    assert!(a.market.pd_base() >= 0.68, "pd = {}", a.market.pd_base());
    assert_eq!(a.zone.code, "⑨");
    assert_eq!(a.zone.severity, Severity::Critical);
    assert!(a.market.deposit_exceeds_ceiling);

    assert!(a.commentary.iter().any(|c| c.contains("5 auction(s)") && c.contains("of all 8")));
}

#[test]
fn stress_scenarios_are_reported() {
    let m = pipeline().assess_market_risk(11_108.1, 12_500.0, 2.0).unwrap();
    let (base, s10, s20) = (m.pd_base(), m.pd_stress10().unwrap(), m.pd_stress20().unwrap());
    assert!(base <= s10 && s10 <= s20);
    assert!(m.el_stress20().unwrap() >= m.el_base());
    assert!((m.lgd_base() - 0.3 * 12_500.0).abs() < 1e-9);
}

#[test]
fn hedonic_estimate_is_deterministic() {
    let data = load();
    let parcel = ParcelKey::from_lot("366-50", "1150010300").unwrap();
    let unit = UnitSpec { area_sqm: 29.94, floor: 4 };
    let a = estimate_value(&data, &parcel, unit).unwrap();
    let b = estimate_value(&data, &parcel, unit).unwrap();
    assert_eq!(a, b);
}

#[test]
fn typed_failures() {
    let p = pipeline();

    let err = p.assess(&request("nan", 30.0, 2, 10000.0)).unwrap_err();
    assert!(matches!(err, RiskError::InvalidParcel { .. }));

    let err = p.assess(&request("777", 30.0, 2, 10000.0)).unwrap_err();
    assert!(matches!(err, RiskError::NoTradeHistory { .. }));
    assert_eq!(err.exit_code(), 3);

    let err = p.assess(&request("1234", 59.8, 7, 30000.0)).unwrap_err();
    assert!(matches!(err, RiskError::NoLocation { .. }));

    let mut bad_term = request("366-50", 29.94, 4, 27000.0);
    bad_term.term_years = 0.0;
    assert!(matches!(p.assess(&bad_term).unwrap_err(), RiskError::InvalidTerm { .. }));
}

#[test]
fn legacy_thresholds_can_be_injected() {
    let p = Pipeline::new(
        load(),
        PipelineOptions {
            thresholds: GradeThresholds::LEGACY_STRUCTURAL,
            ..PipelineOptions::default()
        },
    );
    assert_eq!(p.classify_zone(0.54, 0.0).unwrap().code, "④");
    assert_eq!(pipeline().classify_zone(0.54, 0.0).unwrap().code, "①");
}

#[test]
fn zone_rejects_values_that_are_not_probabilities() {
    let p = pipeline();
    for (sp, pd) in [(f64::NAN, 0.1), (0.1, f64::NAN), (f64::NAN, 0.99), (f64::INFINITY, 0.2), (0.3, 1.5)] {
        let err = p.classify_zone(sp, pd).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)), "({sp}, {pd}) -> {err}");
        assert_eq!(err.exit_code(), 2);
    }
    assert_eq!(p.classify_zone(0.0, 0.0).unwrap().code, "①");
    assert_eq!(p.classify_zone(1.0, 1.0).unwrap().code, "⑨");
}

#[test]
fn cross_check_rejects_invalid_amounts() {
    let p = pipeline();
    for (v0, deposit) in [(f64::NAN, 10_000.0), (0.0, 10_000.0), (20_000.0, f64::NAN), (20_000.0, -1.0)] {
        let err = p.cross_check_pd(v0, deposit, 2.0, "base", 1_000, 7).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)), "({v0}, {deposit}) -> {err}");
    }
    let ok = p.cross_check_pd(20_000.0, 10_000.0, 2.0, "base", 1_000, 7).unwrap();
    assert_eq!(ok.simulated.paths, 1_000);
}

#[test]
fn batch_keeps_input_order_and_isolates_failures() {
    let requests = vec![
        request("366-50", 29.94, 4, 27000.0),
        request("777", 30.0, 2, 10000.0),
        request("50-120", 43.92, 3, 12500.0),
    ];
    let outcomes = pipeline().assess_batch(&requests);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].result.as_ref().unwrap().zone.code, "①");
    assert!(outcomes[1].result.is_err());
    assert_eq!(outcomes[2].result.as_ref().unwrap().zone.code, "⑨");
    for (o, r) in outcomes.iter().zip(&requests) {
        assert_eq!(&o.request, r);
    }
}

#[test]
fn concurrent_first_access_loads_once() {
    let store = ReferenceStore::new(fixture_dir());
    let loaded: Vec<Arc<ReferenceData>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| store.load_once().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(store.is_loaded());
    for data in &loaded[1..] {
        assert!(Arc::ptr_eq(&loaded[0], data));
    }
}

#[test]
fn assessment_exports_as_json() {
    let a = pipeline().assess(&request("366-50", 29.94, 4, 27000.0)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assessment.json");
    write_assessment_json(&path, &a).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["zone"]["code"], "①");
    assert_eq!(value["structural"]["parcel"], "1150010300103660050");
    assert_eq!(value["market"]["scenarios"][0]["name"], "base");
    assert!(value["structural"]["woe"]["effective_LTV"].is_number());
}
