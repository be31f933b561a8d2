use geoloc_3d::{
    camera::{CameraIntrinsics, CameraMetadata},
    ground::compute_correction,
    linalg::homogeneous3,
    pose::{solve_pose, Pose},
};
use geoloc_geo::{solve_geo_triangulation, GeoCoordinate};

use crate::{
    bearing::{compute_flat_rotation, FlatRotation},
    error::LocatorError,
    params::LocatorParams,
    prism::{project_prism, Prism},
    reference::ReferenceImage,
};

/// Result of a localization.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Pose of the reference object in the camera frame.
    pub pose: Pose,
    /// Projected box around the reference object, if requested.
    pub prism: Option<Prism>,
    /// Geographic position of the camera, if requested.
    pub camera: Option<GeoCoordinate>,
    /// Orientation of the reference object on the ground, if requested.
    pub rotation: Option<FlatRotation>,
}

impl Location {
    /// Bearing from the camera to the reference object in radians.
    pub fn bearing(&self) -> Option<f64> {
        self.rotation.map(|r| r.bearing)
    }
}

/// Locate the camera from one matched reference object.
///
/// # Arguments
///
/// * `corners_3d` - Reference corners at unit depth: left-upper, right-upper,
///   right-bottom, left-bottom.
/// * `scene_corners` - The same corners found in the scene, in pixels.
/// * `geo_p2` - Geographic coordinate of the right-bottom corner.
/// * `geo_p3` - Geographic coordinate of the left-bottom corner.
/// * `intrinsics` - Pinhole intrinsics of the scene camera.
/// * `params` - What to compute and how.
///
/// The camera is located on the ground plane spanned by the bottom corners and its
/// standing point; in that plane it sits at the origin and the bottom corners are
/// triangulated against their geographic anchors.
///
/// # Errors
///
/// Any failure of a stage aborts the call.
pub fn calc_location(
    corners_3d: &[[f64; 3]; 4],
    scene_corners: &[[f64; 2]; 4],
    geo_p2: &GeoCoordinate,
    geo_p3: &GeoCoordinate,
    intrinsics: &CameraIntrinsics,
    params: &LocatorParams,
) -> Result<Location, LocatorError> {
    let pose = solve_pose(corners_3d, scene_corners, intrinsics, &params.pnp)?;

    let prism = if params.calc_projection {
        Some(project_prism(&pose, corners_3d)?)
    } else {
        None
    };

    if !params.calc_geo_location {
        return Ok(Location {
            pose,
            prism,
            camera: None,
            rotation: None,
        });
    }

    let camera_space = corners_3d.map(|c| pose.to_camera_space(&homogeneous3(&c)));

    let frame = compute_correction(
        &camera_space[1],
        &camera_space[2],
        &camera_space[3],
        geo_p2,
        geo_p3,
        params.consider_holder_height,
        &params.holder_height,
    )?;

    let p2_ground = frame.ground_position(&camera_space[2]);
    let p3_ground = frame.ground_position(&camera_space[3]);
    log::trace!("ground positions: right-bottom {p2_ground:?}, left-bottom {p3_ground:?}");

    let camera = solve_geo_triangulation(&[0.0, 0.0], &p2_ground, &p3_ground, geo_p2, geo_p3)?;
    let rotation = compute_flat_rotation(&camera, geo_p2, geo_p3)?;

    log::debug!(
        "camera located at {camera}, bearing {:.2} deg",
        rotation.bearing.to_degrees()
    );

    Ok(Location {
        pose,
        prism,
        camera: Some(camera),
        rotation: Some(rotation),
    })
}

/// Localization pipeline bound to a set of parameters.
#[derive(Debug, Clone, Default)]
pub struct GeoLocator {
    params: LocatorParams,
}

impl GeoLocator {
    /// Create a locator with the given parameters.
    pub fn new(params: LocatorParams) -> Self {
        Self { params }
    }

    /// The parameters of the locator.
    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    /// Locate the camera from the corners of `reference` found in the scene.
    pub fn locate(
        &self,
        reference: &ReferenceImage,
        scene_corners: &[[f64; 2]; 4],
        intrinsics: &CameraIntrinsics,
    ) -> Result<Location, LocatorError> {
        calc_location(
            &reference.corners_3d(),
            scene_corners,
            &reference.right_base,
            &reference.left_base,
            intrinsics,
            &self.params,
        )
    }

    /// Locate the camera from a reference to scene homography and the camera metadata.
    pub fn locate_with_homography(
        &self,
        reference: &ReferenceImage,
        homography: &[[f64; 3]; 3],
        metadata: &CameraMetadata,
    ) -> Result<Location, LocatorError> {
        let intrinsics = CameraIntrinsics::from_metadata(metadata)?;
        let scene_corners = reference.scene_corners(homography)?;
        self.locate(reference, &scene_corners, &intrinsics)
    }
}
