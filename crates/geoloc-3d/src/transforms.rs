/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```no_run
/// use geoloc_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = axis_angle_to_rotation_matrix(&axis, angle).unwrap();
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]]);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], &'static str> {
    let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
    if magnitude < 1e-10 {
        return Err("cannot compute rotation matrix from a zero vector");
    }
    let (x, y, z) = (axis[0] / magnitude, axis[1] / magnitude, axis[2] / magnitude);

    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    let tmp1 = x * y * t;
    let tmp2 = z * s;
    let tmp3 = x * z * t;
    let tmp4 = y * s;
    let tmp5 = y * z * t;
    let tmp6 = x * s;

    Ok([
        [c + x * x * t, tmp1 - tmp2, tmp3 + tmp4],
        [tmp1 + tmp2, c + y * y * t, tmp5 - tmp6],
        [tmp3 - tmp4, tmp5 + tmp6, c + z * z * t],
    ])
}

/// Convert a rotation vector (axis scaled by angle) to a rotation matrix.
///
/// This is the Rodrigues formula, expanded to first order for tiny angles.
pub fn rotation_vector_to_matrix(rvec: &[f64; 3]) -> [[f64; 3]; 3] {
    let theta = (rvec[0] * rvec[0] + rvec[1] * rvec[1] + rvec[2] * rvec[2]).sqrt();
    if theta < 1e-9 {
        // first order expansion: I + [rvec]x
        return [
            [1.0, -rvec[2], rvec[1]],
            [rvec[2], 1.0, -rvec[0]],
            [-rvec[1], rvec[0], 1.0],
        ];
    }
    let (x, y, z) = (rvec[0] / theta, rvec[1] / theta, rvec[2] / theta);
    let (s, c) = theta.sin_cos();
    let t = 1.0 - c;
    [
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
        [x * y * t + z * s, c + y * y * t, y * z * t - x * s],
        [x * z * t - y * s, y * z * t + x * s, c + z * z * t],
    ]
}

/// Convert a rotation matrix to a rotation vector (axis scaled by angle).
///
/// The angle of the returned vector lies in `[0, PI]`.
///
/// PRECONDITION: `r` is orthonormal with determinant one.
pub fn rotation_matrix_to_vector(r: &[[f64; 3]; 3]) -> [f64; 3] {
    let trace = r[0][0] + r[1][1] + r[2][2];
    let cos = ((trace - 1.0) * 0.5).clamp(-1.0, 1.0);
    let theta = cos.acos();

    // twice the axis scaled by sin(theta)
    let w = [r[2][1] - r[1][2], r[0][2] - r[2][0], r[1][0] - r[0][1]];

    if theta < 1e-10 {
        return [w[0] * 0.5, w[1] * 0.5, w[2] * 0.5];
    }

    if std::f64::consts::PI - theta > 1e-6 {
        let k = theta / (2.0 * theta.sin());
        return [w[0] * k, w[1] * k, w[2] * k];
    }

    // near PI the skew part vanishes: recover the axis from the symmetric part,
    // S = cos I + (1 - cos) a a^T
    let one_minus_cos = 1.0 - cos;
    let aat = |i: usize, j: usize| {
        let s = 0.5 * (r[i][j] + r[j][i]) - if i == j { cos } else { 0.0 };
        s / one_minus_cos
    };
    let k = (0..3)
        .max_by(|&a, &b| aat(a, a).total_cmp(&aat(b, b)))
        .unwrap_or(0);
    let mut axis = [aat(0, k), aat(1, k), aat(2, k)];
    let n = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    for a in axis.iter_mut() {
        *a /= n;
    }

    // keep the sign consistent with the residual skew part
    let sign = if axis[0] * w[0] + axis[1] * w[1] + axis[2] * w[2] < 0.0 {
        -1.0
    } else {
        1.0
    };
    [
        axis[0] * theta * sign,
        axis[1] * theta * sign,
        axis[2] * theta * sign,
    ]
}
