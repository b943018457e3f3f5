//! Turning a travel-time budget into a place-search geometry
//!
//! All functions here are pure; nothing touches the network.

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, TravelMode};

/// Share of the day budget spent moving rather than at the destination
pub const MOVEMENT_SHARE: f64 = 0.45;
/// Straight-line distance is shorter than the road distance
pub const DETOUR_FACTOR: f64 = 0.8;
/// Smallest radius ever searched, in kilometers
pub const MIN_RADIUS_KM: f64 = 3.0;
/// Kilometers per degree of longitude at the equator
pub const KM_PER_DEGREE_LON: f64 = 111.32;
/// Kilometers per degree of latitude
pub const KM_PER_DEGREE_LAT: f64 = 110.574;
/// Number of ring centers around the origin when one query is not enough
pub const RING_SIZE: usize = 6;

/// Where to run place queries and with which radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGeometry {
    /// Radius used for every center, in meters
    pub radius_m: u32,
    /// Either the origin alone or the origin followed by six ring centers
    pub centers: Vec<GeoPoint>,
}

impl SearchGeometry {
    /// Whether the area needs more than one provider query
    #[must_use]
    pub fn is_tiled(&self) -> bool {
        self.centers.len() > 1
    }
}

/// Estimate how far away (in meters) a day trip may go.
///
/// Non-positive or non-finite budgets yield the minimum radius.
#[must_use]
pub fn estimate_radius(budget_hours: f64, mode: Option<TravelMode>) -> u32 {
    let budget = if budget_hours.is_finite() {
        budget_hours.max(0.0)
    } else {
        0.0
    };
    let speed = mode.unwrap_or(TravelMode::Public).speed_kmh();

    let movement_hours = budget * MOVEMENT_SHARE;
    let one_way_km = speed * movement_hours / 2.0;
    let radius_km = (one_way_km * DETOUR_FACTOR).max(MIN_RADIUS_KM);

    (radius_km * 1000.0).round() as u32
}

/// Cover a circle of `radius_m` around `origin` with queries of at most
/// `provider_max_m` each.
///
/// A radius that fits yields a single center. Anything larger is capped at twice
/// the provider limit and covered by the origin plus six centers spaced 60° apart,
/// each searched with the provider limit.
#[must_use]
pub fn tile_area(origin: GeoPoint, radius_m: u32, provider_max_m: u32) -> SearchGeometry {
    if radius_m <= provider_max_m {
        return SearchGeometry {
            radius_m: radius_m.min(provider_max_m),
            centers: vec![origin],
        };
    }

    let effective_m = radius_m.min(provider_max_m.saturating_mul(2));
    let offset_km = f64::from(effective_m - provider_max_m) / 1000.0;

    let lat_rad = origin.latitude.to_radians();
    let km_per_degree_lon = KM_PER_DEGREE_LON * lat_rad.cos();

    let mut centers = Vec::with_capacity(RING_SIZE + 1);
    centers.push(origin);
    for step in 0..RING_SIZE {
        let bearing = (60.0 * step as f64).to_radians();
        let d_lat = offset_km * bearing.sin() / KM_PER_DEGREE_LAT;
        let d_lon = if km_per_degree_lon.abs() > f64::EPSILON {
            offset_km * bearing.cos() / km_per_degree_lon
        } else {
            0.0
        };
        centers.push(GeoPoint::new(
            origin.latitude + d_lat,
            origin.longitude + d_lon,
        ));
    }

    SearchGeometry {
        radius_m: provider_max_m,
        centers,
    }
}
