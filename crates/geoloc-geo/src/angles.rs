use crate::GeoError;

/// Convert degrees to radians.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

/// Convert radians to degrees.
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

/// Midpoint of the segment between two 2D points.
pub fn midpoint_2d(a: &[f64; 2], b: &[f64; 2]) -> [f64; 2] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

fn normalize_2d(v: [f64; 2]) -> Option<[f64; 2]> {
    let n = v[0].hypot(v[1]);
    if !n.is_finite() || n < f64::EPSILON {
        return None;
    }
    Some([v[0] / n, v[1] / n])
}

/// Unsigned angle at `b` between the rays `b -> a` and `b -> c`, in `[0, PI]`.
///
/// # Errors
///
/// Returns [`GeoError::DegenerateGeometry`] when `a` or `c` coincides with `b`.
pub fn vector_angle_2d(a: &[f64; 2], b: &[f64; 2], c: &[f64; 2]) -> Result<f64, GeoError> {
    let u = normalize_2d([a[0] - b[0], a[1] - b[1]])
        .ok_or(GeoError::DegenerateGeometry("first ray of the angle has zero length"))?;
    let v = normalize_2d([c[0] - b[0], c[1] - b[1]])
        .ok_or(GeoError::DegenerateGeometry("second ray of the angle has zero length"))?;
    let cos = (u[0] * v[0] + u[1] * v[1]).clamp(-1.0, 1.0);
    Ok(cos.acos())
}

/// Angle of a 2D vector measured from the east axis `(1, 0)`.
///
/// The result lies in `[-PI, PI]`: counter-clockwise angles are positive and the
/// sign is negative whenever the vector points south (`v[1] < 0`).
///
/// # Errors
///
/// Returns [`GeoError::DegenerateGeometry`] for a zero-length vector.
pub fn bearing_from_east(v: &[f64; 2]) -> Result<f64, GeoError> {
    let unit = normalize_2d(*v)
        .ok_or(GeoError::DegenerateGeometry("bearing of a zero-length vector"))?;
    let sign = if unit[1] < 0.0 { -1.0 } else { 1.0 };
    Ok(sign * unit[0].clamp(-1.0, 1.0).acos())
}
