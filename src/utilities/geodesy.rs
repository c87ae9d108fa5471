// src/utilities/geodesy.rs
//
// Spherical-earth helpers for map movement.
// All angles are in degrees, distances in metres.

use crate::models::GeoPosition;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Linear interpolation of a value over a tick range.
/// Outside `[start_tick, end_tick]` the nearest endpoint value is returned.
pub fn interpolate(start_tick: u32, end_tick: u32, tick: u32, start: f64, end: f64) -> f64 {
    if tick >= end_tick {
        return end;
    }
    if tick <= start_tick {
        return start;
    }
    let t = (tick - start_tick) as f64 / (end_tick - start_tick) as f64;
    start + t * (end - start)
}

/// Progress ratio of `tick` inside `[start_tick, end_tick]`, clamped to 0..=1.
pub fn progress(start_tick: u32, end_tick: u32, tick: u32) -> f64 {
    if end_tick <= start_tick || tick >= end_tick {
        return 1.0;
    }
    if tick <= start_tick {
        return 0.0;
    }
    (tick - start_tick) as f64 / (end_tick - start_tick) as f64
}

/// Initial bearing from point 1 to point 2, normalised to 0..360.
pub fn azimuth(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// Point reached travelling `distance_m` from the origin on the given bearing.
/// Returns `(lat, lon)`.
pub fn destination_point(lat: f64, lon: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Great-circle distance between two positions (haversine).
pub fn haversine_distance(from: &GeoPosition, to: &GeoPosition) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (to.lon - from.lon).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
