//! Perspective-n-Point (PnP) solver for planar targets.
//!
//! The pose is initialized from the homography between the target plane and the
//! normalized image plane, then refined with Levenberg-Marquardt on the
//! reprojection error.

/// Homography based initialization for planar targets.
pub mod planar;

/// LM-based pose refinement.
pub mod refine;

mod ops;

pub use planar::solve_planar_homography;
pub use refine::{refine_pose_lm, LMResult, TerminationReason};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraIntrinsics;
use crate::transforms::rotation_vector_to_matrix;

/// Error types for the PnP solver.
#[derive(Debug, Error, PartialEq)]
pub enum PnPError {
    /// Invalid input data - insufficient correspondences.
    #[error("PnP solver requires at least {required} 2D-3D correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences required by the solver.
        required: usize,
        /// Actual number of correspondences provided.
        actual: usize,
    },

    /// Invalid input data - mismatched array lengths with descriptive labels.
    #[error("Mismatched array lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedArrayLengths {
        /// Label for the left-hand slice.
        left_name: &'static str,
        /// Length of the left-hand slice.
        left_len: usize,
        /// Label for the right-hand slice.
        right_name: &'static str,
        /// Length of the right-hand slice.
        right_len: usize,
    },

    /// The world points do not share a common `z` and no initial guess was given.
    #[error("World points must lie on a plane of constant z to initialize the pose")]
    NonPlanarPoints,

    /// The solver could not produce a valid pose.
    #[error("Pose solve failed: {0}")]
    PoseSolveFailed(String),
}

/// Parameters of the PnP solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PnPParams {
    /// Maximum number of LM iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the relative cost change.
    pub cost_tolerance: f64,
    /// Convergence threshold on the gradient infinity norm.
    pub gradient_tolerance: f64,
    /// Convergence threshold on the relative step norm.
    pub step_tolerance: f64,
    /// Initial damping factor (lambda).
    pub initial_lambda: f64,
    /// Damping above which the refinement stops at the current estimate.
    pub lambda_max: f64,
    /// Step of the central differences used for the Jacobian.
    pub jacobian_step: f64,
}

impl Default for PnPParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            cost_tolerance: 1e-12,
            gradient_tolerance: 1e-10,
            step_tolerance: 1e-10,
            initial_lambda: 1e-3,
            lambda_max: 1e10,
            jacobian_step: 1e-6,
        }
    }
}

impl PnPParams {
    /// Create default solver parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set cost tolerance.
    pub fn with_cost_tolerance(mut self, tol: f64) -> Self {
        self.cost_tolerance = tol;
        self
    }

    /// Set gradient tolerance.
    pub fn with_gradient_tolerance(mut self, tol: f64) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Set step tolerance.
    pub fn with_step_tolerance(mut self, tol: f64) -> Self {
        self.step_tolerance = tol;
        self
    }

    /// Set initial lambda.
    pub fn with_initial_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Set maximum lambda.
    pub fn with_lambda_max(mut self, lambda: f64) -> Self {
        self.lambda_max = lambda;
        self
    }

    /// Set the finite difference step.
    pub fn with_jacobian_step(mut self, step: f64) -> Self {
        self.jacobian_step = step;
        self
    }
}

/// Initial pose used to seed the refinement, world to camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrinsicGuess {
    /// Rodrigues axis-angle representation of the rotation.
    pub rvec: [f64; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

/// Result returned by the PnP solver.
///
/// The rotation matrix maps coordinates from the **world** frame to the
/// **camera** frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PnPResult {
    /// Estimated rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Estimated translation vector.
    pub translation: [f64; 3],
    /// Rodrigues axis-angle representation of the rotation.
    pub rvec: [f64; 3],
    /// Root-mean-square reprojection error in pixels.
    pub reproj_rmse: f64,
    /// Number of refinement iterations.
    pub num_iterations: usize,
    /// Whether the refinement converged before running out of iterations.
    pub converged: bool,
    /// Why the refinement stopped.
    pub termination: TerminationReason,
}

/// Solve for the camera pose from 2D-3D correspondences.
///
/// Without a guess the world points must share a common `z` and the pose is
/// initialized from the plane homography. With a guess the refinement starts
/// from it directly.
///
/// # Arguments
///
/// * `world` - 3D points in world coordinates.
/// * `image` - Their observed pixel coordinates.
/// * `intrinsics` - Pinhole intrinsics of the camera.
/// * `guess` - Optional initial pose.
/// * `params` - Solver parameters.
///
/// # Errors
///
/// Input validation errors, [`PnPError::NonPlanarPoints`] when the initialization
/// is impossible and [`PnPError::PoseSolveFailed`] for degenerate or non-finite
/// solutions. Running out of iterations is reported through
/// [`PnPResult::converged`], not as an error.
pub fn solve_pnp(
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
    guess: Option<&ExtrinsicGuess>,
    params: &PnPParams,
) -> Result<PnPResult, PnPError> {
    if world.len() != image.len() {
        return Err(PnPError::MismatchedArrayLengths {
            left_name: "world points",
            left_len: world.len(),
            right_name: "image points",
            right_len: image.len(),
        });
    }
    if world.len() < 4 {
        return Err(PnPError::InsufficientCorrespondences {
            required: 4,
            actual: world.len(),
        });
    }

    let initial = match guess {
        Some(guess) => *guess,
        None => solve_planar_homography(world, image, intrinsics)?,
    };

    log::trace!(
        "pnp initial pose: rvec {:?}, t {:?}",
        initial.rvec,
        initial.translation
    );

    let lm = refine_pose_lm(world, image, intrinsics, &initial, params)?;

    let finite = lm.rvec.iter().chain(lm.translation.iter()).all(|v| v.is_finite());
    if !finite {
        return Err(PnPError::PoseSolveFailed("non-finite pose".to_string()));
    }

    let rotation = rotation_vector_to_matrix(&lm.rvec);
    let reproj_rmse =
        ops::compute_reprojection_rmse(world, image, &rotation, &lm.translation, intrinsics);

    log::debug!(
        "pnp refine: {} iterations, {:?}, rmse {:.3e} px",
        lm.iterations,
        lm.termination,
        reproj_rmse
    );

    Ok(PnPResult {
        rotation,
        translation: lm.translation,
        rvec: lm.rvec,
        reproj_rmse,
        num_iterations: lm.iterations,
        converged: lm.termination != TerminationReason::MaxIterations,
        termination: lm.termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn project(world: &[[f64; 3]], r: &[[f64; 3]; 3], t: &[f64; 3], k: &CameraIntrinsics) -> Vec<[f64; 2]> {
        world
            .iter()
            .map(|p| ops::project_point(r, t, k, p).0)
            .collect()
    }

    #[test]
    fn test_solve_pnp_planar_square() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(800.0, 800.0, 320.0, 240.0);
        let rvec = [0.2, -0.3, 0.1];
        let t = [0.3, -0.2, 6.0];
        let r = rotation_vector_to_matrix(&rvec);

        let world = [
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let image = project(&world, &r, &t, &k);

        let res = solve_pnp(&world, &image, &k, None, &PnPParams::default())?;
        assert!(res.converged);
        assert!(res.reproj_rmse < 1e-6);
        for i in 0..3 {
            assert_relative_eq!(res.rvec[i], rvec[i], epsilon = 1e-6);
            assert_relative_eq!(res.translation[i], t[i], epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_solve_pnp_with_guess_non_planar() -> Result<(), Box<dyn std::error::Error>> {
        let k = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        let rvec = [0.05, 0.1, -0.02];
        let t = [0.1, 0.2, 4.0];
        let r = rotation_vector_to_matrix(&rvec);
        let world = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.5],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, -0.5],
            [0.5, 0.5, 1.0],
        ];
        let image = project(&world, &r, &t, &k);

        assert_eq!(
            solve_pnp(&world, &image, &k, None, &PnPParams::default()),
            Err(PnPError::NonPlanarPoints)
        );

        let guess = ExtrinsicGuess {
            rvec: [0.0, 0.0, 0.0],
            translation: [0.0, 0.0, 3.5],
        };
        let res = solve_pnp(&world, &image, &k, Some(&guess), &PnPParams::default())?;
        for i in 0..3 {
            assert_relative_eq!(res.rvec[i], rvec[i], epsilon = 1e-6);
            assert_relative_eq!(res.translation[i], t[i], epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_solve_pnp_input_validation() {
        let k = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        let world = [[0.0, 0.0, 1.0]; 3];
        let image = [[0.0, 0.0]; 3];
        assert_eq!(
            solve_pnp(&world, &image, &k, None, &PnPParams::default()),
            Err(PnPError::InsufficientCorrespondences {
                required: 4,
                actual: 3
            })
        );
        assert!(matches!(
            solve_pnp(&world, &image[..2], &k, None, &PnPParams::default()),
            Err(PnPError::MismatchedArrayLengths { .. })
        ));
    }

    #[test]
    fn test_params_builder() {
        let params = PnPParams::new()
            .with_max_iterations(5)
            .with_lambda_max(1e6)
            .with_jacobian_step(1e-5);
        assert_eq!(params.max_iterations, 5);
        assert_eq!(params.lambda_max, 1e6);
        assert_eq!(params.jacobian_step, 1e-5);
        assert_eq!(params.cost_tolerance, PnPParams::default().cost_tolerance);
    }
}
