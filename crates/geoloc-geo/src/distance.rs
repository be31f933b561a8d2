use crate::{deg_to_rad, GeoCoordinate};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine formula).
///
/// Example:
///
/// ```
/// use geoloc_geo::{haversine_distance, GeoCoordinate};
///
/// let a = GeoCoordinate::new(0.0, 0.0);
/// let b = GeoCoordinate::new(0.0, 1.0);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111_194.9).abs() < 1.0);
/// ```
pub fn haversine_distance(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat_a = deg_to_rad(a.latitude);
    let lat_b = deg_to_rad(b.latitude);
    let d_lat = lat_b - lat_a;
    let d_lon = deg_to_rad(b.longitude - a.longitude);

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // rounding may push h a hair above one for antipodal points
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

/// Euclidean distance between two 2D points.
pub fn euclidean_2d(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Euclidean distance between two 3D points.
pub fn euclidean_3d(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
