//! Structural features of a lease: leverage against V0 and the spatial
//! context of past auctions.
//!
//! Distances use a planar approximation valid around Seoul: longitude
//! degrees scaled by 88 km, latitude degrees by 111 km, then Euclidean.

use crate::domain::{LeaseEvent, StructuralFeatures};
use crate::error::{RiskError, RiskResult};

pub const KM_PER_DEG_LON: f64 = 88.0;
pub const KM_PER_DEG_LAT: f64 = 111.0;

/// Neighbourhood radius for the auction count (exclusive).
pub const NEARBY_RADIUS_KM: f64 = 1.0;

/// Deposit as a percentage of V0; `0` when V0 is zero or not finite.
pub fn effective_ltv(deposit: f64, v0: f64) -> f64 {
    if v0 == 0.0 || !v0.is_finite() {
        return 0.0;
    }
    deposit / v0 * 100.0
}

pub fn deposit_overhang(deposit: f64, v0: f64) -> f64 {
    deposit - v0
}

pub fn planar_distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let dx = (lon_a - lon_b) * KM_PER_DEG_LON;
    let dy = (lat_a - lat_b) * KM_PER_DEG_LAT;
    dx.hypot(dy)
}

/// Build the structural feature set for a lease at (`latitude`, `longitude`).
///
/// Lease events missing coordinates or Moran's I are ignored. The nearest
/// event supplies `local_morans_i`; on equal distances the earlier row wins.
pub fn structural_features(
    deposit: f64,
    v0: f64,
    latitude: f64,
    longitude: f64,
    events: &[LeaseEvent],
) -> RiskResult<StructuralFeatures> {
    if !(deposit.is_finite() && latitude.is_finite() && longitude.is_finite()) {
        return Err(RiskError::NonFinite("structural feature inputs"));
    }

    let mut nearby_auction_1km = 0u32;
    let mut nearest: Option<(f64, f64)> = None;

    for (lat, lon, moran, auctioned) in events
        .iter()
        .filter_map(|e| e.complete().map(|(lat, lon, moran)| (lat, lon, moran, e.auctioned_4y)))
    {
        let d = planar_distance_km(latitude, longitude, lat, lon);
        if d < NEARBY_RADIUS_KM && auctioned {
            nearby_auction_1km += 1;
        }
        match nearest {
            Some((best, _)) if d >= best => {}
            _ => nearest = Some((d, moran)),
        }
    }

    let (nearest_event_km, local_morans_i) = nearest.ok_or(RiskError::NoSpatialData)?;

    let features = StructuralFeatures {
        effective_ltv: effective_ltv(deposit, v0),
        deposit_overhang: deposit_overhang(deposit, v0),
        nearby_auction_1km,
        local_morans_i,
        nearest_event_km,
    };
    tracing::debug!(?features, "structural features");
    Ok(features)
}
