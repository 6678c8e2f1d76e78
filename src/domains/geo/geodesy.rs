//! Spherical-earth formulas used by the densifier and the geofence.

use super::point::GeoPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Initial great-circle bearing from `from` to `to`, in radians clockwise from north.
pub fn initial_bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lat_a, lng_a) = from.to_radians();
    let (lat_b, lng_b) = to.to_radians();
    let d_lng = lng_b - lng_a;

    let y = d_lng.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lng.cos();
    y.atan2(x)
}

/// Same as [`initial_bearing`] but in compass degrees in [0, 360).
pub fn initial_bearing_degrees(from: &GeoPoint, to: &GeoPoint) -> f64 {
    initial_bearing(from, to).to_degrees().rem_euclid(360.0)
}

/// Destination reached after `distance_m` along `bearing` (radians).
///
/// Returns `(lat, lng)` in degrees with the longitude left unwrapped, i.e. it may
/// fall outside [-180, 180] when the path crosses the antimeridian.
pub(crate) fn destination_unwrapped(origin: &GeoPoint, bearing: f64, distance_m: f64) -> (f64, f64) {
    let (lat, lng) = origin.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat.sin() * delta.cos() + lat.cos() * delta.sin() * bearing.cos()).asin();
    let lng2 = lng
        + (bearing.sin() * delta.sin() * lat.cos()).atan2(delta.cos() - lat.sin() * lat2.sin());

    (lat2.to_degrees(), lng2.to_degrees())
}

/// Destination point after travelling `distance_m` from `origin` along `bearing` (radians).
pub fn destination_point(origin: &GeoPoint, bearing: f64, distance_m: f64) -> GeoPoint {
    let (lat, lng) = destination_unwrapped(origin, bearing, distance_m);
    GeoPoint::new_unchecked(lat, normalize_longitude(lng))
}

/// Great-circle distance in meters (haversine).
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Sum of the great-circle lengths of consecutive pairs.
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Wrap a longitude in degrees into [-180, 180].
pub fn normalize_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}
