//! Recover the geographic position of a point known only in a local 2D frame.
//!
//! Two anchors are known both in the local frame and as geographic coordinates.
//! The local frame is assumed to be a similarity of the (flattened) geographic
//! frame: it may be rotated and scaled but not mirrored.

use crate::{
    bearing_from_east, euclidean_2d, haversine_distance, meters_per_latitude_degree,
    meters_per_longitude_degree, to_planar, vector_angle_2d, GeoCoordinate, GeoError,
};

/// Minimum separation of the anchors, in meters.
const MIN_ANCHOR_DISTANCE_M: f64 = 1e-6;

/// Solve for the geographic coordinate of `p1`.
///
/// # Arguments
///
/// * `p1` - Local 2D position of the point to locate.
/// * `p2` - Local 2D position of the first anchor.
/// * `p3` - Local 2D position of the second anchor.
/// * `geo_p2` - Geographic coordinate of `p2`.
/// * `geo_p3` - Geographic coordinate of `p3`.
///
/// The bearing of `geo_p3 -> geo_p2` is measured on the locally flattened earth,
/// the ray `p3 -> p1` is obtained by rotating it clockwise by the local angle at
/// `p3`, and `p1` is reached by walking that ray from `geo_p3` by the local
/// distance converted to meters with the scale of the anchor pair.
///
/// Only valid for points a few kilometers apart at most.
///
/// # Errors
///
/// Returns [`GeoError::DegenerateGeometry`] if the anchors coincide either locally
/// or geographically.
pub fn solve_geo_triangulation(
    p1: &[f64; 2],
    p2: &[f64; 2],
    p3: &[f64; 2],
    geo_p2: &GeoCoordinate,
    geo_p3: &GeoCoordinate,
) -> Result<GeoCoordinate, GeoError> {
    let anchors_m = haversine_distance(geo_p2, geo_p3);
    if anchors_m < MIN_ANCHOR_DISTANCE_M {
        return Err(GeoError::DegenerateGeometry("geographic anchors coincide"));
    }

    let anchors_local = euclidean_2d(p2, p3);
    if anchors_local < f64::EPSILON {
        return Err(GeoError::DegenerateGeometry("local anchors coincide"));
    }

    // local units per meter
    let scale = anchors_local / anchors_m;

    let distance_m = euclidean_2d(p3, p1) / scale;
    if distance_m < MIN_ANCHOR_DISTANCE_M {
        log::trace!("located point sits on the second anchor");
        return Ok(*geo_p3);
    }

    let planar_p2 = to_planar(geo_p2, geo_p3.latitude);
    let planar_p3 = to_planar(geo_p3, geo_p3.latitude);
    let anchors_bearing =
        bearing_from_east(&[planar_p2[0] - planar_p3[0], planar_p2[1] - planar_p3[1]])?;

    let angle_at_p3 = vector_angle_2d(p2, p3, p1)?;
    let bearing = anchors_bearing - angle_at_p3;

    log::trace!(
        "anchor bearing {:.6} rad, angle at p3 {:.6} rad, distance {:.3} m",
        anchors_bearing,
        angle_at_p3,
        distance_m
    );

    let (sin, cos) = bearing.sin_cos();
    Ok(GeoCoordinate::new(
        geo_p3.longitude + distance_m * cos / meters_per_longitude_degree(geo_p3.latitude),
        geo_p3.latitude + distance_m * sin / meters_per_latitude_degree(geo_p3.latitude),
    ))
}
