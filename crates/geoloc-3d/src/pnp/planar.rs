use super::{ExtrinsicGuess, PnPError};
use crate::camera::CameraIntrinsics;
use crate::homography::find_homography;
use crate::linalg::{cross_vec3, det_mat33, norm_vec3};
use crate::transforms::rotation_matrix_to_vector;

/// Initial pose of a planar target from the homography to the normalized image plane.
///
/// The world points must share a common `z0`. For points `(x, y, z0)` the
/// homography is proportional to `[r1 | r2 | z0 * r3 + t]`; its first two columns
/// are scaled to unit length on average, completed with their cross product and
/// projected onto the closest rotation.
///
/// # Arguments
///
/// * `world` - Planar 3D points in world coordinates.
/// * `image` - Their observed pixel coordinates.
/// * `intrinsics` - Pinhole intrinsics of the camera.
///
/// # Returns
///
/// The world to camera pose with the target in front of the camera.
pub fn solve_planar_homography(
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
) -> Result<ExtrinsicGuess, PnPError> {
    let z0 = world.first().map(|p| p[2]).unwrap_or(0.0);
    let extent = world
        .iter()
        .flat_map(|p| p.iter())
        .fold(1.0f64, |acc, v| acc.max(v.abs()));
    if world.iter().any(|p| (p[2] - z0).abs() > 1e-9 * extent) {
        return Err(PnPError::NonPlanarPoints);
    }

    let plane: Vec<[f64; 2]> = world.iter().map(|p| [p[0], p[1]]).collect();
    let normalized: Vec<[f64; 2]> = image
        .iter()
        .map(|uv| {
            [
                (uv[0] - intrinsics.cx) / intrinsics.fx,
                (uv[1] - intrinsics.cy) / intrinsics.fy,
            ]
        })
        .collect();

    let homo = find_homography(&plane, &normalized)
        .map_err(|e| PnPError::PoseSolveFailed(format!("plane homography: {e}")))?;

    let h1 = [homo[0][0], homo[1][0], homo[2][0]];
    let h2 = [homo[0][1], homo[1][1], homo[2][1]];
    let h3 = [homo[0][2], homo[1][2], homo[2][2]];

    let norm_sum = norm_vec3(&h1) + norm_vec3(&h2);
    if norm_sum < 1e-12 {
        return Err(PnPError::PoseSolveFailed(
            "degenerate plane homography".to_string(),
        ));
    }

    // the point (0, 0, z0) of the plane must be in front of the camera
    let mut lambda = 2.0 / norm_sum;
    if h3[2] < 0.0 {
        lambda = -lambda;
    }

    let r1 = [h1[0] * lambda, h1[1] * lambda, h1[2] * lambda];
    let r2 = [h2[0] * lambda, h2[1] * lambda, h2[2] * lambda];
    let r3 = cross_vec3(&r1, &r2);

    let rotation = closest_rotation(&[
        [r1[0], r2[0], r3[0]],
        [r1[1], r2[1], r3[1]],
        [r1[2], r2[2], r3[2]],
    ]);

    let translation = [
        h3[0] * lambda - z0 * rotation[0][2],
        h3[1] * lambda - z0 * rotation[1][2],
        h3[2] * lambda - z0 * rotation[2][2],
    ];

    Ok(ExtrinsicGuess {
        rvec: rotation_matrix_to_vector(&rotation),
        translation,
    })
}

/// Project a 3x3 matrix onto SO(3) in the Frobenius sense.
fn closest_rotation(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| m[i][j]);
    let svd = mat.svd();
    let uvt = svd.u() * svd.v().transpose();

    let mut rotation = [[0.0; 3]; 3];
    for (i, row) in rotation.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = uvt.read(i, j);
        }
    }

    if det_mat33(&rotation) < 0.0 {
        // flip the direction associated to the smallest singular value
        let u = svd.u();
        let v = svd.v();
        for (i, row) in rotation.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val -= 2.0 * u.read(i, 2) * v.read(j, 2);
            }
        }
    }

    rotation
}
