use geoloc_geo::{bearing_from_east, to_planar, GeoCoordinate, GeoError};

/// Orientation of the reference object on flat ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRotation {
    /// Bearing from the camera to the object in radians, counter-clockwise from east.
    pub bearing: f64,
    /// Rotation by `bearing` about the up axis `+y`, as `[x, y, z, w]`.
    pub quaternion: [f64; 4],
}

impl FlatRotation {
    /// Rotation about the up axis by `bearing` radians.
    pub fn from_bearing(bearing: f64) -> Self {
        let (s, c) = (bearing * 0.5).sin_cos();
        Self {
            bearing,
            quaternion: [0.0, s, 0.0, c],
        }
    }
}

/// Bearing from the camera to the middle of the two anchors.
///
/// Longitudes are rescaled at the latitude of `geo_p3`, the same reference as
/// [`geoloc_geo::solve_geo_triangulation`].
///
/// # Errors
///
/// Returns [`GeoError::DegenerateGeometry`] when the camera sits on the midpoint.
pub fn compute_flat_rotation(
    camera: &GeoCoordinate,
    geo_p2: &GeoCoordinate,
    geo_p3: &GeoCoordinate,
) -> Result<FlatRotation, GeoError> {
    let target = geo_p2.midpoint(geo_p3);
    let from = to_planar(camera, geo_p3.latitude);
    let to = to_planar(&target, geo_p3.latitude);
    let bearing = bearing_from_east(&[to[0] - from[0], to[1] - from[1]])?;
    Ok(FlatRotation::from_bearing(bearing))
}
