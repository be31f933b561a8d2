use thiserror::Error;

use crate::linalg;
use crate::pose::ProjectionError;

/// Error types for the homography estimation.
#[derive(Debug, Error, PartialEq)]
pub enum HomographyError {
    /// Fewer than four correspondences were given.
    #[error("Homography requires at least 4 correspondences, got {0}")]
    InsufficientCorrespondences(usize),

    /// Source and destination point sets have different lengths.
    #[error("Mismatched array lengths: src ({0}) != dst ({1})")]
    MismatchedArrayLengths(usize, usize),

    /// The points are degenerate, e.g. collinear or coincident.
    #[error("Degenerate point configuration: {0}")]
    Degenerate(&'static str),
}

/// Similarity transform that moves the centroid to the origin and scales the mean
/// distance to sqrt(2).
fn normalize_points_2d(points: &[[f64; 2]]) -> Result<(Vec<[f64; 2]>, [[f64; 3]; 3]), HomographyError> {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist < 1e-12 {
        return Err(HomographyError::Degenerate("points coincide"));
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let normalized = points
        .iter()
        .map(|p| [(p[0] - cx) * s, (p[1] - cy) * s])
        .collect();
    let transform = [[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]];

    Ok((normalized, transform))
}

/// Estimate the homography mapping `src` onto `dst` with the normalized DLT.
///
/// The homography is the right singular vector of the stacked linear constraints
/// associated to the smallest singular value, de-normalized and scaled so that
/// `h[2][2] == 1`.
///
/// # Arguments
///
/// * `src` - The source 2d points.
/// * `dst` - The destination 2d points.
///
/// # Returns
///
/// The 3x3 homography matrix from src to dst.
pub fn find_homography(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<[[f64; 3]; 3], HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::MismatchedArrayLengths(src.len(), dst.len()));
    }
    if src.len() < 4 {
        return Err(HomographyError::InsufficientCorrespondences(src.len()));
    }

    let (x1, t1) = normalize_points_2d(src)?;
    let (x2, t2) = normalize_points_2d(dst)?;

    // construct matrix A, two rows per correspondence and at least 9 rows
    // so that V is always 9x9
    let n = x1.len();
    let mut mat_a = faer::Mat::<f64>::zeros(2 * n.max(5), 9);
    for i in 0..n {
        let (p, q) = (x1[i], x2[i]);
        mat_a.write(2 * i, 0, p[0]);
        mat_a.write(2 * i, 1, p[1]);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -q[0] * p[0]);
        mat_a.write(2 * i, 7, -q[0] * p[1]);
        mat_a.write(2 * i, 8, -q[0]);

        mat_a.write(2 * i + 1, 3, p[0]);
        mat_a.write(2 * i + 1, 4, p[1]);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -q[1] * p[0]);
        mat_a.write(2 * i + 1, 7, -q[1] * p[1]);
        mat_a.write(2 * i + 1, 8, -q[1]);
    }

    // the null vector is the right singular vector of the smallest singular value
    let svd = mat_a.svd();
    let h = svd.v().col(8);
    let hn = [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], h[8]]];

    // hn has unit norm, a vanishing det means collinear points on either side
    if linalg::det_mat33(&hn).abs() < 1e-10 {
        return Err(HomographyError::Degenerate("rank deficient homography"));
    }

    // undo the normalization: H = T2^-1 * Hn * T1
    let t2_inv = linalg::inverse_mat33(&t2, 1e-12)
        .ok_or(HomographyError::Degenerate("singular normalization"))?;
    let mut homo = linalg::mat33_mul_mat33(&linalg::mat33_mul_mat33(&t2_inv, &hn), &t1);

    if homo[2][2].abs() < 1e-12 || !homo[2][2].is_finite() {
        return Err(HomographyError::Degenerate("homography maps to infinity"));
    }
    linalg::normalize_mat33_inplace(&mut homo);

    if linalg::det_mat33(&homo).abs() < 1e-12 {
        return Err(HomographyError::Degenerate("det is too small"));
    }

    Ok(homo)
}

/// Map a 2d point with a homography, including the perspective division.
pub fn perspective_transform(
    homo: &[[f64; 3]; 3],
    point: &[f64; 2],
) -> Result<[f64; 2], ProjectionError> {
    let p = linalg::mat33_mul_vec3(homo, &[point[0], point[1], 1.0]);
    if !p[2].is_finite() || p[2].abs() < f64::EPSILON {
        return Err(ProjectionError::SingularProjection);
    }
    Ok([p[0] / p[2], p[1] / p[2]])
}

/// Warp the four corners of a reference image into the scene with a homography.
///
/// This is the hand-off from a feature matcher: the homography maps reference pixels
/// onto scene pixels and the warped corners feed the pose solver.
pub fn project_corners(
    homo: &[[f64; 3]; 3],
    corners: &[[f64; 2]; 4],
) -> Result<[[f64; 2]; 4], ProjectionError> {
    let mut out = [[0.0; 2]; 4];
    for (dst, src) in out.iter_mut().zip(corners.iter()) {
        *dst = perspective_transform(homo, src)?;
    }
    Ok(out)
}
