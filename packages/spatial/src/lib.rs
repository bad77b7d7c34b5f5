#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Great-circle distance and map geometry helpers.
//!
//! All coordinates are WGS84 degrees and all distances are kilometers.
//! Nearest-shelter lookup is a linear geodesic scan -- the shelter set is
//! tens of rows, not thousands, so no spatial index is warranted.

use std::f64::consts::PI;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.0;

/// Sentinel distance returned when no shelters exist to measure against.
pub const NO_SHELTER_SENTINEL_KM: f64 = 999.0;

/// Haversine great-circle distance between two lat/lon points, km.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(lat2 - lat1);
    let dlon = to_rad(lon2 - lon1);

    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Distance from `(lat, lon)` to the nearest point in `shelters`, km.
///
/// Returns [`NO_SHELTER_SENTINEL_KM`] when `shelters` is empty so that
/// downstream need scoring never divides by or minimizes over nothing.
#[must_use]
pub fn nearest_shelter_km(lat: f64, lon: f64, shelters: &[(f64, f64)]) -> f64 {
    shelters
        .iter()
        .map(|&(s_lat, s_lon)| haversine_km(lat, lon, s_lat, s_lon))
        .fold(f64::INFINITY, f64::min)
        .min(NO_SHELTER_SENTINEL_KM)
}

/// Synthesizes a closed circular boundary polygon around a point for map
/// display: 24 vertices at 15-degree steps, radius in km.
///
/// Kilometers convert to degrees with the flat 111 km/degree latitude
/// approximation and a latitude-corrected longitude scale. Each vertex is
/// `[lat, lon]`.
#[must_use]
pub fn boundary_circle(lat: f64, lon: f64, radius_km: f64) -> Vec<[f64; 2]> {
    let lon_scale = KM_PER_DEGREE * (lat * PI / 180.0).cos();

    (0..360)
        .step_by(15)
        .map(|angle| {
            let theta = f64::from(angle) * PI / 180.0;
            let dx_km = radius_km * theta.cos();
            let dy_km = radius_km * theta.sin();
            [lat + dy_km / KM_PER_DEGREE, lon + dx_km / lon_scale]
        })
        .collect()
}
