//! Hedonic fair-value estimate (V0).
//!
//! The hedonic model is a log-price regression fitted offline. Here we only
//! evaluate it:
//!
//! ```text
//! V0 = exp(β · [1, x])
//! ```
//!
//! where `x` mixes the requested unit (area, floor) with the parcel's latest
//! recorded trade (building age, lease statistics, amenity distances,
//! counterpart flags). Missing trade values enter as `0`.

use nalgebra::DVector;

use crate::data::ReferenceData;
use crate::domain::{HedonicArtifact, HedonicEstimate, HedonicFeature, ParcelKey, TradeRecord};
use crate::error::{RiskError, RiskResult};

/// Square metres per pyeong.
pub const SQM_PER_PYEONG: f64 = 3.3058;

/// Policy rate (%/yr) assumed for every estimate.
pub const ASSUMED_BASE_RATE_PCT: f64 = 2.5;

/// The requested unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSpec {
    pub area_sqm: f64,
    pub floor: i32,
}

/// Estimate V0 for `parcel` from its latest trade and location.
pub fn estimate_value(data: &ReferenceData, parcel: &ParcelKey, unit: UnitSpec) -> RiskResult<HedonicEstimate> {
    if !(unit.area_sqm.is_finite() && unit.area_sqm > 0.0) {
        return Err(RiskError::InvalidInput(format!(
            "area must be a positive number of square metres (got {})",
            unit.area_sqm
        )));
    }

    let trade = data
        .latest_trade(parcel)
        .ok_or_else(|| RiskError::NoTradeHistory { parcel: parcel.clone() })?;
    let location = data
        .location(parcel)
        .ok_or_else(|| RiskError::NoLocation { parcel: parcel.clone() })?;

    let v0 = evaluate(&data.hedonic, trade, unit)?;

    tracing::debug!(%parcel, v0, "hedonic estimate");

    Ok(HedonicEstimate {
        parcel: parcel.clone(),
        v0,
        latitude: location.latitude,
        longitude: location.longitude,
    })
}

/// Evaluate the fitted regression for one trade + unit.
pub fn evaluate(artifact: &HedonicArtifact, trade: &TradeRecord, unit: UnitSpec) -> RiskResult<f64> {
    let x = design_row(artifact, trade, unit);
    let beta = DVector::from_column_slice(&artifact.coefficients);
    if x.len() != beta.len() {
        return Err(RiskError::artifact(
            "hedonic",
            format!("design row has {} terms, coefficients {}", x.len(), beta.len()),
        ));
    }

    let ln_price = beta.dot(&x);
    let v0 = ln_price.exp();
    if !(v0.is_finite() && v0 > 0.0) {
        return Err(RiskError::NonFinite("hedonic estimate"));
    }
    Ok(v0)
}

/// `[1, x_1, ..., x_n]` in artifact feature order.
pub fn design_row(artifact: &HedonicArtifact, trade: &TradeRecord, unit: UnitSpec) -> DVector<f64> {
    let mut row = DVector::zeros(artifact.features.len() + 1);
    row[0] = 1.0;
    for (i, &feature) in artifact.features.iter().enumerate() {
        row[i + 1] = feature_value(feature, trade, unit);
    }
    row
}

/// Value of one regressor. Absent (or non-finite) trade values count as `0`.
pub fn feature_value(feature: HedonicFeature, trade: &TradeRecord, unit: UnitSpec) -> f64 {
    let or_zero = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(0.0);

    let area_pyeong = unit.area_sqm / SQM_PER_PYEONG;
    let floor = f64::from(unit.floor);
    let age = or_zero(trade.building_age);

    match feature {
        HedonicFeature::AreaPyeong => area_pyeong,
        HedonicFeature::Floor => floor,
        HedonicFeature::BuildingAge => age,
        HedonicFeature::BuildingAgeSq => age * age,
        HedonicFeature::AreaFloorInter => area_pyeong * floor,
        HedonicFeature::InDistrict => or_zero(trade.in_district),
        HedonicFeature::LeaseAvgDeposit => or_zero(trade.lease_avg_deposit),
        HedonicFeature::BaseRate => ASSUMED_BASE_RATE_PCT,
        HedonicFeature::LeaseAvgRent => or_zero(trade.lease_avg_rent),
        HedonicFeature::LeaseCount => or_zero(trade.lease_count),
        HedonicFeature::ParkDistance => or_zero(trade.park_distance),
        HedonicFeature::SchoolDistance => or_zero(trade.school_distance),
        HedonicFeature::RetailDistance => or_zero(trade.retail_distance),
        HedonicFeature::BuyerCorporate => or_zero(trade.buyer_corporate),
        HedonicFeature::SellerIndividual => or_zero(trade.seller_individual),
        HedonicFeature::SellerM => or_zero(trade.seller_m),
        HedonicFeature::DirectTrade => or_zero(trade.direct_trade),
        HedonicFeature::AgeBuycorpInter => age * or_zero(trade.buyer_corporate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> HedonicArtifact {
        HedonicArtifact {
            features: vec![
                HedonicFeature::AreaPyeong,
                HedonicFeature::BuildingAge,
                HedonicFeature::BuildingAgeSq,
                HedonicFeature::BaseRate,
                HedonicFeature::AgeBuycorpInter,
            ],
            coefficients: vec![9.0, 0.03, -0.01, 0.0001, -0.1, 0.5],
        }
    }

    fn unit() -> UnitSpec {
        UnitSpec { area_sqm: 33.058, floor: 3 }
    }

    #[test]
    fn design_row_follows_artifact_order() {
        let trade = TradeRecord {
            building_age: Some(10.0),
            buyer_corporate: Some(1.0),
            ..TradeRecord::default()
        };
        let row = design_row(&artifact(), &trade, unit());
        let expected = [1.0, 10.0, 10.0, 100.0, ASSUMED_BASE_RATE_PCT, 10.0];
        for (got, want) in row.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn missing_trade_values_become_zero() {
        let trade = TradeRecord {
            building_age: Some(f64::NAN),
            ..TradeRecord::default()
        };
        let row = design_row(&artifact(), &trade, unit());
        assert!(row.iter().all(|v| v.is_finite()));
        assert_eq!(row[2], 0.0);
        assert_eq!(row[5], 0.0);
    }

    #[test]
    fn estimate_is_exp_of_linear_predictor() {
        let trade = TradeRecord::default();
        let v0 = evaluate(&artifact(), &trade, unit()).unwrap();
        let ln = 9.0 + 0.03 * 10.0 - 0.1 * ASSUMED_BASE_RATE_PCT;
        assert!((v0 - f64::exp(ln)).abs() < 1e-6);
    }

    #[test]
    fn overflowing_estimate_is_an_error() {
        let mut a = artifact();
        a.coefficients[0] = 1e6;
        let err = evaluate(&a, &TradeRecord::default(), unit()).unwrap_err();
        assert!(matches!(err, RiskError::NonFinite(_)));
    }
}
