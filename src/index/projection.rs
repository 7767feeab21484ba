//! Web-Mercator unit-square projection and local metric approximations.

use std::f64::consts::PI;

/// Metres per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Project a longitude into `[0, 1]` mercator x.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude into `[0, 1]` mercator y (north at 0), clamped at the poles.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Wrap a longitude into `[-180, 180)`.
#[inline]
pub fn wrap_lng(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}

/// Degrees of (longitude, latitude) spanned by `meters` at latitude `lat`.
///
/// Local equirectangular approximation; the longitude span is capped near the
/// poles where `cos(lat)` vanishes.
pub fn meters_to_degrees(meters: f64, lat: f64) -> (f64, f64) {
    let dlat = meters / METERS_PER_DEGREE;
    let cos = lat.to_radians().cos().abs().max(1e-6);
    (dlat / cos, dlat)
}
