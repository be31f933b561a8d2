use thiserror::Error;

use crate::camera::CameraIntrinsics;
use crate::linalg;
use crate::pnp::{solve_pnp, ExtrinsicGuess, PnPError, PnPParams};
use crate::transforms::{rotation_matrix_to_vector, rotation_vector_to_matrix};

/// Error returned when a projection divides by a zero homogeneous coordinate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionError {
    /// The homogeneous divisor is zero or not finite.
    #[error("Singular projection: the homogeneous divisor is zero")]
    SingularProjection,
}

/// Pose of a reference plane relative to the camera.
///
/// All matrices map world (reference) coordinates into the camera frame, or into
/// the image for [`Pose::world_to_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Rodrigues axis-angle representation of the rotation.
    pub rotation_vector: [f64; 3],
    /// Translation vector.
    pub translation: [f64; 3],
    /// Rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Homogeneous rigid transform `[R | t; 0 0 0 1]`.
    pub rotation_translation: [[f64; 4]; 4],
    /// World to image projection `[K | 0] * [R | t; 0 0 0 1]`.
    pub world_to_image: [[f64; 4]; 3],
    /// Root-mean-square reprojection error of the solution in pixels.
    pub reproj_rmse: f64,
    /// Refinement iterations of the initial and the re-seeded solve.
    pub pnp_iterations: [usize; 2],
}

impl Pose {
    /// Assemble a pose from a rotation vector and a translation.
    pub fn from_rotation_vector(
        rotation_vector: &[f64; 3],
        translation: &[f64; 3],
        intrinsics: &CameraIntrinsics,
    ) -> Self {
        let rotation = rotation_vector_to_matrix(rotation_vector);
        let rotation_translation = linalg::rigid_mat44(&rotation, translation);
        let world_to_image = linalg::mat34_mul_mat44(
            &linalg::pad_mat33_to_mat34(&intrinsics.matrix()),
            &rotation_translation,
        );
        Self {
            rotation_vector: *rotation_vector,
            translation: *translation,
            rotation,
            rotation_translation,
            world_to_image,
            reproj_rmse: 0.0,
            pnp_iterations: [0, 0],
        }
    }

    /// Transform a homogeneous world point into the camera frame.
    pub fn to_camera_space(&self, point: &[f64; 4]) -> [f64; 4] {
        linalg::mat44_mul_vec4(&self.rotation_translation, point)
    }

    /// Project a homogeneous world point to pixel coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::SingularProjection`] when the point projects to infinity.
    pub fn project_world_space_to_image(&self, point: &[f64; 4]) -> Result<[f64; 2], ProjectionError> {
        let p = linalg::mat34_mul_vec4(&self.world_to_image, point);
        if !p[2].is_finite() || p[2].abs() < f64::EPSILON {
            return Err(ProjectionError::SingularProjection);
        }
        Ok([p[0] / p[2], p[1] / p[2]])
    }
}

/// Solve the pose of the reference plane from its four corners.
///
/// The PnP problem is solved twice: once from scratch and once re-seeded with the
/// first solution. Only the second pass decides success.
///
/// # Arguments
///
/// * `world_corners` - Reference corners at unit depth, left-upper, right-upper,
///   right-bottom and left-bottom.
/// * `image_corners` - The same corners found in the scene, in pixels.
/// * `intrinsics` - Pinhole intrinsics of the scene camera.
/// * `params` - PnP solver parameters.
///
/// # Errors
///
/// Returns [`PnPError::PoseSolveFailed`] when the refinement does not converge or
/// a corner ends up behind the camera.
pub fn solve_pose(
    world_corners: &[[f64; 3]; 4],
    image_corners: &[[f64; 2]; 4],
    intrinsics: &CameraIntrinsics,
    params: &PnPParams,
) -> Result<Pose, PnPError> {
    let first = solve_pnp(world_corners, image_corners, intrinsics, None, params)?;
    if !first.converged {
        log::debug!(
            "initial pnp pass stopped after {} iterations without converging",
            first.num_iterations
        );
    }

    let guess = ExtrinsicGuess {
        rvec: first.rvec,
        translation: first.translation,
    };
    let second = solve_pnp(world_corners, image_corners, intrinsics, Some(&guess), params)?;
    if !second.converged {
        return Err(PnPError::PoseSolveFailed(format!(
            "refinement did not converge in {} iterations",
            second.num_iterations
        )));
    }

    let rotation_vector = rotation_matrix_to_vector(&second.rotation);
    let mut pose = Pose::from_rotation_vector(&rotation_vector, &second.translation, intrinsics);
    pose.reproj_rmse = second.reproj_rmse;
    pose.pnp_iterations = [first.num_iterations, second.num_iterations];

    for corner in world_corners {
        let pc = pose.to_camera_space(&linalg::homogeneous3(corner));
        if pc[2] <= 0.0 {
            return Err(PnPError::PoseSolveFailed(
                "reference corner behind the camera".to_string(),
            ));
        }
    }

    log::debug!(
        "pose: rvec {:?}, t {:?}, rmse {:.3e} px",
        pose.rotation_vector,
        pose.translation,
        pose.reproj_rmse
    );

    Ok(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const SQUARE: [[f64; 3]; 4] = [
        [-0.6, -0.6, 1.0],
        [0.6, -0.6, 1.0],
        [0.6, 0.6, 1.0],
        [-0.6, 0.6, 1.0],
    ];

    fn project_all(pose: &Pose, corners: &[[f64; 3]; 4]) -> Result<[[f64; 2]; 4], ProjectionError> {
        let mut out = [[0.0; 2]; 4];
        for (o, c) in out.iter_mut().zip(corners.iter()) {
            *o = pose.project_world_space_to_image(&linalg::homogeneous3(c))?;
        }
        Ok(out)
    }

    #[test]
    fn test_solve_pose_fronto_parallel_square() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(100.0, 100.0, 50.0, 50.0);
        let truth = Pose::from_rotation_vector(&[0.0, 0.0, 0.0], &[0.0, 0.0, 5.0], &k);

        let image = project_all(&truth, &SQUARE)?;
        assert_relative_eq!(image[0][0], 40.0, epsilon = 1e-12);
        assert_relative_eq!(image[0][1], 40.0, epsilon = 1e-12);
        assert_relative_eq!(image[2][0], 60.0, epsilon = 1e-12);
        assert_relative_eq!(image[2][1], 60.0, epsilon = 1e-12);

        let pose = solve_pose(&SQUARE, &image, &k, &PnPParams::default())?;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(pose.rotation[i][j], expected, epsilon = 1e-6);
            }
            assert_relative_eq!(pose.translation[i], [0.0, 0.0, 5.0][i], epsilon = 1e-6);
        }
        assert_eq!(pose.rotation_translation[3], [0.0, 0.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_solve_pose_pixel_reference_at_unit_depth() -> Result<(), Box<dyn std::error::Error>> {
        // a 100x100 px reference image lifted to unit depth
        let k = CameraIntrinsics::new(100.0, 100.0, 50.0, 50.0);
        let corners = [
            [0.0, 0.0, 1.0],
            [100.0, 0.0, 1.0],
            [100.0, 100.0, 1.0],
            [0.0, 100.0, 1.0],
        ];
        let truth = Pose::from_rotation_vector(&[0.0, 0.0, 0.0], &[0.0, 0.0, 5.0], &k);
        let image = project_all(&truth, &corners)?;

        let pose = solve_pose(&corners, &image, &k, &PnPParams::default())?;
        for i in 0..3 {
            assert_relative_eq!(pose.rotation_vector[i], 0.0, epsilon = 1e-6);
            assert_relative_eq!(pose.translation[i], [0.0, 0.0, 5.0][i], epsilon = 1e-6);
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(pose.rotation[i][j], expected, epsilon = 1e-6);
            }
        }
        assert!(pose.reproj_rmse < 1e-6);
        Ok(())
    }

    #[test]
    fn test_solve_pose_random_poses() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(2755.0, 2802.0, 2000.0, 1500.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..25 {
            let rvec: [f64; 3] = [
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
            ];
            let t: [f64; 3] = [
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(4.0..20.0),
            ];
            let truth = Pose::from_rotation_vector(&rvec, &t, &k);
            let image = project_all(&truth, &SQUARE)?;

            let pose = solve_pose(&SQUARE, &image, &k, &PnPParams::default())?;
            for i in 0..3 {
                assert_relative_eq!(pose.translation[i], t[i], epsilon = 1e-6, max_relative = 1e-6);
                for j in 0..3 {
                    assert_relative_eq!(pose.rotation[i][j], truth.rotation[i][j], epsilon = 1e-6);
                }
            }
            assert!(pose.reproj_rmse < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_projection_matrices_agree() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(800.0, 820.0, 320.0, 240.0);
        let pose = Pose::from_rotation_vector(&[0.1, 0.2, -0.3], &[0.5, -0.2, 6.0], &k);
        let p = [0.3, -0.4, 1.0, 1.0];
        let via_world = pose.project_world_space_to_image(&p)?;
        let via_camera = k.project_camera_space_to_image(&pose.to_camera_space(&p))?;
        assert_relative_eq!(via_world[0], via_camera[0], epsilon = 1e-9);
        assert_relative_eq!(via_world[1], via_camera[1], epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_project_point_on_camera_plane() {
        let k = CameraIntrinsics::new(100.0, 100.0, 50.0, 50.0);
        let pose = Pose::from_rotation_vector(&[0.0, 0.0, 0.0], &[0.0, 0.0, -1.0], &k);
        assert_eq!(
            pose.project_world_space_to_image(&[0.5, 0.5, 1.0, 1.0]),
            Err(ProjectionError::SingularProjection)
        );
    }

    #[test]
    fn test_solve_pose_collinear_corners() {
        let k = CameraIntrinsics::new(100.0, 100.0, 50.0, 50.0);
        let image = [[10.0, 10.0], [20.0, 20.0], [30.0, 30.0], [40.0, 40.0]];
        assert!(matches!(
            solve_pose(&SQUARE, &image, &k, &PnPParams::default()),
            Err(PnPError::PoseSolveFailed(_))
        ));
    }
}
