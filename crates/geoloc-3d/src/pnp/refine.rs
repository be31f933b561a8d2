//! Levenberg-Marquardt pose refinement for PnP solutions.
//!
//! The pose is parameterized as `[rx, ry, rz, tx, ty, tz]` (rotation vector and
//! translation) and the Jacobian of the reprojection residuals is computed with
//! central differences.

use faer::prelude::SpSolver;

use super::ops::reprojection_residuals;
use super::{ExtrinsicGuess, PnPError, PnPParams};
use crate::camera::CameraIntrinsics;
use crate::transforms::rotation_vector_to_matrix;

const PARAM_DIM: usize = 6;

/// Factor for lambda adaptation.
const LAMBDA_FACTOR: f64 = 10.0;

/// Reason why the refinement terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Converged: cost change below tolerance.
    CostConverged,
    /// Converged: gradient norm below tolerance.
    GradientConverged,
    /// Converged: step norm below tolerance.
    StepConverged,
    /// Lambda exceeded its maximum: no step decreases the cost anymore.
    LambdaMaxExceeded,
    /// Maximum number of iterations reached.
    MaxIterations,
}

/// Output of [`refine_pose_lm`].
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Refined rotation vector.
    pub rvec: [f64; 3],
    /// Refined translation.
    pub translation: [f64; 3],
    /// Final cost (sum of squared residuals).
    pub final_cost: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Reason for termination.
    pub termination: TerminationReason,
}

/// Sum of squared residuals for the pose `x`, or `None` if a point is behind the camera.
fn evaluate(
    x: &[f64; PARAM_DIM],
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
) -> Option<Vec<f64>> {
    let rotation = rotation_vector_to_matrix(&[x[0], x[1], x[2]]);
    reprojection_residuals(world, image, &rotation, &[x[3], x[4], x[5]], intrinsics)
}

fn cost_of(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Compute numerical Jacobian using central differences, row-major `(2N, 6)`.
fn numerical_jacobian(
    x: &[f64; PARAM_DIM],
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
    step: f64,
) -> Result<Vec<f64>, PnPError> {
    let rows = 2 * world.len();
    let mut jacobian = vec![0.0; rows * PARAM_DIM];
    let inv_2eps = 1.0 / (2.0 * step);

    for i in 0..PARAM_DIM {
        let mut x_plus = *x;
        let mut x_minus = *x;
        x_plus[i] += step;
        x_minus[i] -= step;

        let (Some(r_plus), Some(r_minus)) = (
            evaluate(&x_plus, world, image, intrinsics),
            evaluate(&x_minus, world, image, intrinsics),
        ) else {
            return Err(PnPError::PoseSolveFailed(
                "point behind the camera while linearizing".to_string(),
            ));
        };

        for row in 0..rows {
            jacobian[row * PARAM_DIM + i] = (r_plus[row] - r_minus[row]) * inv_2eps;
        }
    }

    Ok(jacobian)
}

/// Refine a pose with Levenberg-Marquardt on the reprojection error.
///
/// Steps that increase the cost or push a point behind the camera are rejected
/// and the damping is increased.
///
/// # Arguments
///
/// * `world` - 3D points in world coordinates.
/// * `image` - Their observed pixel coordinates.
/// * `intrinsics` - Pinhole intrinsics of the camera.
/// * `initial` - Initial pose, world to camera.
/// * `params` - Refinement parameters.
///
/// # Errors
///
/// Returns [`PnPError::PoseSolveFailed`] when the initial pose places a point
/// behind the camera or the damped system cannot be solved.
pub fn refine_pose_lm(
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
    initial: &ExtrinsicGuess,
    params: &PnPParams,
) -> Result<LMResult, PnPError> {
    let mut x = [
        initial.rvec[0],
        initial.rvec[1],
        initial.rvec[2],
        initial.translation[0],
        initial.translation[1],
        initial.translation[2],
    ];

    let mut residuals = evaluate(&x, world, image, intrinsics).ok_or_else(|| {
        PnPError::PoseSolveFailed("initial pose places points behind the camera".to_string())
    })?;
    let mut current_cost = cost_of(&residuals);
    let mut lambda = params.initial_lambda;
    let mut iterations = 0;

    let result = |x: &[f64; PARAM_DIM], cost, iterations, termination| LMResult {
        rvec: [x[0], x[1], x[2]],
        translation: [x[3], x[4], x[5]],
        final_cost: cost,
        iterations,
        termination,
    };

    loop {
        if iterations >= params.max_iterations {
            return Ok(result(&x, current_cost, iterations, TerminationReason::MaxIterations));
        }

        let jacobian = numerical_jacobian(&x, world, image, intrinsics, params.jacobian_step)?;

        // normal equations J^T J and J^T r
        let rows = residuals.len();
        let mut jtj = [[0.0; PARAM_DIM]; PARAM_DIM];
        let mut jtr = [0.0; PARAM_DIM];
        for row in 0..rows {
            let j_row = &jacobian[row * PARAM_DIM..(row + 1) * PARAM_DIM];
            for a in 0..PARAM_DIM {
                jtr[a] += j_row[a] * residuals[row];
                for b in 0..PARAM_DIM {
                    jtj[a][b] += j_row[a] * j_row[b];
                }
            }
        }

        let gradient_norm = jtr.iter().fold(0.0f64, |acc, g| acc.max(g.abs()));
        if gradient_norm < params.gradient_tolerance {
            return Ok(result(&x, current_cost, iterations, TerminationReason::GradientConverged));
        }

        // solve the damped system: (J^T J + lambda * diag(J^T J)) delta = -J^T r
        let mat_a = faer::Mat::<f64>::from_fn(PARAM_DIM, PARAM_DIM, |i, j| {
            if i == j {
                jtj[i][j] + lambda * jtj[i][i].max(1e-12)
            } else {
                jtj[i][j]
            }
        });
        let rhs = faer::Mat::<f64>::from_fn(PARAM_DIM, 1, |i, _| -jtr[i]);
        let delta_mat = mat_a.partial_piv_lu().solve(rhs);

        let mut delta = [0.0; PARAM_DIM];
        for (i, d) in delta.iter_mut().enumerate() {
            *d = delta_mat.read(i, 0);
        }
        if delta.iter().any(|d| !d.is_finite()) {
            return Err(PnPError::PoseSolveFailed(
                "singular damped normal equations".to_string(),
            ));
        }

        let step_norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
        let x_norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if step_norm < params.step_tolerance * (x_norm + params.step_tolerance) {
            return Ok(result(&x, current_cost, iterations, TerminationReason::StepConverged));
        }

        let mut x_new = x;
        for (v, d) in x_new.iter_mut().zip(delta.iter()) {
            *v += d;
        }

        iterations += 1;

        let candidate = evaluate(&x_new, world, image, intrinsics)
            .map(|r| (cost_of(&r), r))
            .filter(|(cost, _)| cost.is_finite());

        match candidate {
            Some((new_cost, new_residuals)) if new_cost < current_cost => {
                let cost_change = current_cost - new_cost;
                x = x_new;
                residuals = new_residuals;
                let previous_cost = current_cost;
                current_cost = new_cost;

                if cost_change < params.cost_tolerance * previous_cost {
                    return Ok(result(&x, current_cost, iterations, TerminationReason::CostConverged));
                }
                lambda = (lambda / LAMBDA_FACTOR).max(1e-12);
            }
            _ => {
                lambda *= LAMBDA_FACTOR;
                if lambda > params.lambda_max {
                    return Ok(result(
                        &x,
                        current_cost,
                        iterations,
                        TerminationReason::LambdaMaxExceeded,
                    ));
                }
            }
        }

        log::trace!("lm iteration {iterations}: cost {current_cost:.6e}, lambda {lambda:.1e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnp::ops::project_point;
    use approx::assert_relative_eq;

    fn synthetic() -> (Vec<[f64; 3]>, Vec<[f64; 2]>, CameraIntrinsics, ExtrinsicGuess) {
        let k = CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0);
        let truth = ExtrinsicGuess {
            rvec: [0.1, -0.2, 0.05],
            translation: [0.2, 0.1, 5.0],
        };
        let r = rotation_vector_to_matrix(&truth.rvec);
        let world = vec![
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let image = world
            .iter()
            .map(|p| project_point(&r, &truth.translation, &k, p).0)
            .collect();
        (world, image, k, truth)
    }

    #[test]
    fn test_refine_from_perturbed_pose() -> Result<(), Box<dyn std::error::Error>> {
        let (world, image, k, truth) = synthetic();
        let initial = ExtrinsicGuess {
            rvec: [0.15, -0.1, 0.0],
            translation: [0.0, 0.3, 4.5],
        };
        let res = refine_pose_lm(&world, &image, &k, &initial, &PnPParams::default())?;
        assert_ne!(res.termination, TerminationReason::MaxIterations);
        assert!(res.final_cost < 1e-12);
        for i in 0..3 {
            assert_relative_eq!(res.rvec[i], truth.rvec[i], epsilon = 1e-6);
            assert_relative_eq!(res.translation[i], truth.translation[i], epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_refine_at_optimum_stops_immediately() -> Result<(), Box<dyn std::error::Error>> {
        let (world, image, k, truth) = synthetic();
        let res = refine_pose_lm(&world, &image, &k, &truth, &PnPParams::default())?;
        assert_ne!(res.termination, TerminationReason::MaxIterations);
        assert!(res.iterations <= 2);
        Ok(())
    }

    #[test]
    fn test_refine_iteration_limit() -> Result<(), Box<dyn std::error::Error>> {
        let (world, image, k, _) = synthetic();
        let initial = ExtrinsicGuess {
            rvec: [0.3, 0.0, -0.2],
            translation: [0.5, -0.5, 7.0],
        };
        let params = PnPParams::default().with_max_iterations(1);
        let res = refine_pose_lm(&world, &image, &k, &initial, &params)?;
        assert_eq!(res.termination, TerminationReason::MaxIterations);
        assert_eq!(res.iterations, 1);
        Ok(())
    }

    #[test]
    fn test_refine_behind_camera() {
        let (world, image, k, _) = synthetic();
        let initial = ExtrinsicGuess {
            rvec: [0.0, 0.0, 0.0],
            translation: [0.0, 0.0, -5.0],
        };
        assert!(matches!(
            refine_pose_lm(&world, &image, &k, &initial, &PnPParams::default()),
            Err(PnPError::PoseSolveFailed(_))
        ));
    }
}
