use crate::camera::CameraIntrinsics;
use crate::linalg::mat33_mul_vec3;

/// Project a world point, returning the pixel and the camera-space depth.
pub(crate) fn project_point(
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    intrinsics: &CameraIntrinsics,
    point: &[f64; 3],
) -> ([f64; 2], f64) {
    let rp = mat33_mul_vec3(rotation, point);
    let pc = [
        rp[0] + translation[0],
        rp[1] + translation[1],
        rp[2] + translation[2],
    ];
    let inv_z = 1.0 / pc[2];
    (
        [
            intrinsics.fx * pc[0] * inv_z + intrinsics.cx,
            intrinsics.fy * pc[1] * inv_z + intrinsics.cy,
        ],
        pc[2],
    )
}

/// Stack the reprojection residuals `projected - observed` as `[u0, v0, u1, v1, ...]`.
///
/// Returns `None` when a point falls behind the camera or projects to a non-finite pixel.
pub(crate) fn reprojection_residuals(
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    intrinsics: &CameraIntrinsics,
) -> Option<Vec<f64>> {
    let mut residuals = Vec::with_capacity(2 * world.len());
    for (pw, uv) in world.iter().zip(image.iter()) {
        let (proj, depth) = project_point(rotation, translation, intrinsics, pw);
        if depth <= 0.0 || !proj[0].is_finite() || !proj[1].is_finite() {
            return None;
        }
        residuals.push(proj[0] - uv[0]);
        residuals.push(proj[1] - uv[1]);
    }
    Some(residuals)
}

/// Root-mean-square pixel distance between projected and observed points.
///
/// Points behind the camera are projected anyway, which makes the error large.
pub(crate) fn compute_reprojection_rmse(
    world: &[[f64; 3]],
    image: &[[f64; 2]],
    rotation: &[[f64; 3]; 3],
    translation: &[f64; 3],
    intrinsics: &CameraIntrinsics,
) -> f64 {
    if world.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = world
        .iter()
        .zip(image.iter())
        .map(|(pw, uv)| {
            let (proj, _) = project_point(rotation, translation, intrinsics, pw);
            (proj[0] - uv[0]).powi(2) + (proj[1] - uv[1]).powi(2)
        })
        .sum();
    (sum_sq / world.len() as f64).sqrt()
}
