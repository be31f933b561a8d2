//! Change of basis that levels the camera space on the ground.
//!
//! The reference object stands on the ground: its bottom corners and the point
//! where the photographer stands span the ground plane. The new frame keeps the
//! camera as origin, points `z` to the left-bottom corner and makes `y` the ground
//! normal, so that `(x, z)` are planar ground coordinates.

use geoloc_geo::{haversine_distance, GeoCoordinate, GeoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::linalg::{self, cross_vec3, normalize_vec3, scale_vec3, sub_vec3};

/// Minimum norm accepted for directions built from input points.
const MIN_NORM: f64 = 1e-12;

/// Error types for the ground frame correction.
#[derive(Debug, Error, PartialEq)]
pub enum GroundFrameError {
    /// Points coincide or are collinear, so no frame can be built.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// Geodesic computation failed.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Body height model of the person holding the camera, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolderHeight {
    /// Height of an average person.
    pub average_human_height: f64,
    /// Distance from the top of the head down to the camera.
    pub camera_holding_offset: f64,
}

impl Default for HolderHeight {
    fn default() -> Self {
        Self {
            average_human_height: 1.75,
            camera_holding_offset: 0.20,
        }
    }
}

impl HolderHeight {
    /// Set the average human height.
    pub fn with_average_human_height(mut self, height: f64) -> Self {
        self.average_human_height = height;
        self
    }

    /// Set the camera holding offset.
    pub fn with_camera_holding_offset(mut self, offset: f64) -> Self {
        self.camera_holding_offset = offset;
        self
    }

    /// Height of the camera above the ground.
    pub fn camera_height(&self) -> f64 {
        self.average_human_height - self.camera_holding_offset
    }
}

/// Ground-aligned basis of the camera space.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundFrame {
    /// Camera space to ground frame, the inverse of the basis matrix.
    pub matrix: [[f64; 4]; 4],
    /// Inferred foot position of the photographer in camera space.
    pub standing_point: [f64; 3],
}

impl GroundFrame {
    /// Transform a homogeneous camera-space point into the ground frame.
    pub fn apply(&self, point: &[f64; 4]) -> [f64; 4] {
        linalg::mat44_mul_vec4(&self.matrix, point)
    }

    /// Planar ground coordinates `(x, z)` of a camera-space point.
    pub fn ground_position(&self, point: &[f64; 4]) -> [f64; 2] {
        let p = self.apply(point);
        [p[0], p[2]]
    }
}

/// Build the ground frame seen from `standing_point`.
///
/// # Arguments
///
/// * `p2` - Camera-space right-bottom corner.
/// * `p3` - Camera-space left-bottom corner.
/// * `standing_point` - Foot position of the photographer in camera space.
///
/// The axes are `z = |p3 - s|`, `y = |z x (p2 - s)|` and `x = |y x z|`. The basis
/// matrix holds them as columns with no translation and the returned frame stores
/// its inverse.
pub fn ground_frame_from_standing_point(
    p2: &[f64; 3],
    p3: &[f64; 3],
    standing_point: [f64; 3],
) -> Result<GroundFrame, GroundFrameError> {
    let z_axis = normalize_vec3(&sub_vec3(p3, &standing_point), MIN_NORM).ok_or(
        GroundFrameError::DegenerateGeometry("left-bottom corner coincides with the standing point"),
    )?;
    let v2 = normalize_vec3(&sub_vec3(p2, &standing_point), MIN_NORM).ok_or(
        GroundFrameError::DegenerateGeometry("right-bottom corner coincides with the standing point"),
    )?;
    let y_axis = normalize_vec3(&cross_vec3(&z_axis, &v2), MIN_NORM).ok_or(
        GroundFrameError::DegenerateGeometry("bottom corners are collinear with the standing point"),
    )?;
    let x_axis = normalize_vec3(&cross_vec3(&y_axis, &z_axis), MIN_NORM)
        .ok_or(GroundFrameError::DegenerateGeometry("ground axes are not independent"))?;

    let basis = [
        [x_axis[0], y_axis[0], z_axis[0], 0.0],
        [x_axis[1], y_axis[1], z_axis[1], 0.0],
        [x_axis[2], y_axis[2], z_axis[2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    let matrix = linalg::inverse_mat44(&basis, MIN_NORM)
        .ok_or(GroundFrameError::DegenerateGeometry("singular ground basis"))?;

    Ok(GroundFrame {
        matrix,
        standing_point,
    })
}

/// Compute the ground frame from three camera-space corners of the reference.
///
/// # Arguments
///
/// * `p1` - Camera-space right-upper corner.
/// * `p2` - Camera-space right-bottom corner, located at `geo_p2`.
/// * `p3` - Camera-space left-bottom corner, located at `geo_p3`.
/// * `geo_p2` - Geographic coordinate of the right-bottom corner.
/// * `geo_p3` - Geographic coordinate of the left-bottom corner.
/// * `consider_holder_height` - Whether the photographer stands below the camera.
/// * `holder` - Body height model used when `consider_holder_height` is set.
///
/// Without the holder height the camera itself is on the ground. Otherwise the
/// standing point is the camera height, converted to camera units with the scale
/// of the anchor pair, along the downward edge `p1 -> p2` of the reference.
pub fn compute_correction(
    p1: &[f64; 4],
    p2: &[f64; 4],
    p3: &[f64; 4],
    geo_p2: &GeoCoordinate,
    geo_p3: &GeoCoordinate,
    consider_holder_height: bool,
    holder: &HolderHeight,
) -> Result<GroundFrame, GroundFrameError> {
    let p1 = linalg::hnormalized_xyz(p1);
    let p2 = linalg::hnormalized_xyz(p2);
    let p3 = linalg::hnormalized_xyz(p3);

    let pairs = [
        (&p1, &p2, "right-upper and right-bottom corners coincide"),
        (&p1, &p3, "right-upper and left-bottom corners coincide"),
        (&p2, &p3, "bottom corners coincide"),
    ];
    for (a, b, reason) in pairs {
        if linalg::norm_vec3(&sub_vec3(a, b)) < MIN_NORM {
            return Err(GroundFrameError::DegenerateGeometry(reason));
        }
    }

    let standing_point = if consider_holder_height {
        let anchors_m = haversine_distance(geo_p2, geo_p3);
        if anchors_m < 1e-6 {
            return Err(GeoError::DegenerateGeometry("geographic anchors coincide").into());
        }
        // camera units per meter
        let scale = linalg::norm_vec3(&sub_vec3(&p2, &p3)) / anchors_m;
        let offset = holder.camera_height() * scale;

        let down = normalize_vec3(&sub_vec3(&p2, &p1), MIN_NORM).ok_or(
            GroundFrameError::DegenerateGeometry("upper and bottom corners coincide"),
        )?;

        log::trace!("holder offset {offset:.4} camera units along {down:?}");
        scale_vec3(&down, offset)
    } else {
        [0.0, 0.0, 0.0]
    };

    ground_frame_from_standing_point(&p2, &p3, standing_point)
}
