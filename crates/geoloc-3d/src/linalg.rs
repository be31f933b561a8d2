//! Small dense linear algebra on row-major fixed-size arrays.
//!
//! Matrices are stored as `[[f64; C]; R]`, i.e. `m[row][col]`.

/// Compute the dot product of two 3D vectors.
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Compute the cross product `a x b`.
pub fn cross_vec3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Component-wise `a - b`.
pub fn sub_vec3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Multiply a 3D vector by a scalar.
pub fn scale_vec3(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Euclidean norm of a 3D vector.
pub fn norm_vec3(a: &[f64; 3]) -> f64 {
    dot_product3(a, a).sqrt()
}

/// Return the unit vector of `a`, or `None` if its norm is below `eps`.
pub fn normalize_vec3(a: &[f64; 3], eps: f64) -> Option<[f64; 3]> {
    let n = norm_vec3(a);
    if !n.is_finite() || n < eps {
        return None;
    }
    Some(scale_vec3(a, 1.0 / n))
}

/// Drop the homogeneous component of a 4D point.
pub fn hnormalized_xyz(p: &[f64; 4]) -> [f64; 3] {
    [p[0], p[1], p[2]]
}

/// Append a unit homogeneous component to a 3D point.
pub fn homogeneous3(p: &[f64; 3]) -> [f64; 4] {
    [p[0], p[1], p[2], 1.0]
}

/// Multiply a 3x3 matrix by a 3D vector.
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        dot_product3(&m[0], v),
        dot_product3(&m[1], v),
        dot_product3(&m[2], v),
    ]
}

/// Multiply two 3x3 matrices.
pub fn mat33_mul_mat33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Transpose a 3x3 matrix.
pub fn transpose_mat33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Determinant of a 3x3 matrix.
pub fn det_mat33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Inverse of a 3x3 matrix, or `None` if `|det| < eps`.
pub fn inverse_mat33(m: &[[f64; 3]; 3], eps: f64) -> Option<[[f64; 3]; 3]> {
    let det = det_mat33(m);
    if !det.is_finite() || det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

/// Scale a 3x3 matrix so that its bottom-right element is one.
///
/// PRECONDITION: `m[2][2]` is not zero.
pub fn normalize_mat33_inplace(m: &mut [[f64; 3]; 3]) {
    let s = 1.0 / m[2][2];
    for row in m.iter_mut() {
        for val in row.iter_mut() {
            *val *= s;
        }
    }
}

/// Multiply a 4x4 matrix by a 4D vector.
pub fn mat44_mul_vec4(m: &[[f64; 4]; 4], v: &[f64; 4]) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (o, row) in out.iter_mut().zip(m.iter()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
    }
    out
}

/// Multiply a 3x4 matrix by a 4D vector.
pub fn mat34_mul_vec4(m: &[[f64; 4]; 3], v: &[f64; 4]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, row) in out.iter_mut().zip(m.iter()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
    }
    out
}

/// Multiply a 3x4 matrix by a 4x4 matrix.
pub fn mat34_mul_mat44(a: &[[f64; 4]; 3], b: &[[f64; 4]; 4]) -> [[f64; 4]; 3] {
    let mut out = [[0.0; 4]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Pad a 3x3 matrix with a zero fourth column.
pub fn pad_mat33_to_mat34(m: &[[f64; 3]; 3]) -> [[f64; 4]; 3] {
    [
        [m[0][0], m[0][1], m[0][2], 0.0],
        [m[1][0], m[1][1], m[1][2], 0.0],
        [m[2][0], m[2][1], m[2][2], 0.0],
    ]
}

/// Assemble the homogeneous rigid transform `[R | t; 0 0 0 1]`.
pub fn rigid_mat44(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> [[f64; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for i in 0..3 {
        out[i][..3].copy_from_slice(&rotation[i]);
        out[i][3] = translation[i];
    }
    out[3][3] = 1.0;
    out
}

/// Inverse of a 4x4 matrix by cofactor expansion, or `None` if `|det| < eps`.
pub fn inverse_mat44(m: &[[f64; 4]; 4], eps: f64) -> Option<[[f64; 4]; 4]> {
    // 2x2 sub-determinants of the two top rows and the two bottom rows
    let s0 = m[0][0] * m[1][1] - m[1][0] * m[0][1];
    let s1 = m[0][0] * m[1][2] - m[1][0] * m[0][2];
    let s2 = m[0][0] * m[1][3] - m[1][0] * m[0][3];
    let s3 = m[0][1] * m[1][2] - m[1][1] * m[0][2];
    let s4 = m[0][1] * m[1][3] - m[1][1] * m[0][3];
    let s5 = m[0][2] * m[1][3] - m[1][2] * m[0][3];

    let c5 = m[2][2] * m[3][3] - m[3][2] * m[2][3];
    let c4 = m[2][1] * m[3][3] - m[3][1] * m[2][3];
    let c3 = m[2][1] * m[3][2] - m[3][1] * m[2][2];
    let c2 = m[2][0] * m[3][3] - m[3][0] * m[2][3];
    let c1 = m[2][0] * m[3][2] - m[3][0] * m[2][2];
    let c0 = m[2][0] * m[3][1] - m[3][0] * m[2][1];

    let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
    if !det.is_finite() || det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;

    Some([
        [
            (m[1][1] * c5 - m[1][2] * c4 + m[1][3] * c3) * inv_det,
            (-m[0][1] * c5 + m[0][2] * c4 - m[0][3] * c3) * inv_det,
            (m[3][1] * s5 - m[3][2] * s4 + m[3][3] * s3) * inv_det,
            (-m[2][1] * s5 + m[2][2] * s4 - m[2][3] * s3) * inv_det,
        ],
        [
            (-m[1][0] * c5 + m[1][2] * c2 - m[1][3] * c1) * inv_det,
            (m[0][0] * c5 - m[0][2] * c2 + m[0][3] * c1) * inv_det,
            (-m[3][0] * s5 + m[3][2] * s2 - m[3][3] * s1) * inv_det,
            (m[2][0] * s5 - m[2][2] * s2 + m[2][3] * s1) * inv_det,
        ],
        [
            (m[1][0] * c4 - m[1][1] * c2 + m[1][3] * c0) * inv_det,
            (-m[0][0] * c4 + m[0][1] * c2 - m[0][3] * c0) * inv_det,
            (m[3][0] * s4 - m[3][1] * s2 + m[3][3] * s0) * inv_det,
            (-m[2][0] * s4 + m[2][1] * s2 - m[2][3] * s0) * inv_det,
        ],
        [
            (-m[1][0] * c3 + m[1][1] * c1 - m[1][2] * c0) * inv_det,
            (m[0][0] * c3 - m[0][1] * c1 + m[0][2] * c0) * inv_det,
            (-m[3][0] * s3 + m[3][1] * s1 - m[3][2] * s0) * inv_det,
            (m[2][0] * s3 - m[2][1] * s1 + m[2][2] * s0) * inv_det,
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_and_dot() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross_vec3(&x, &y), [0.0, 0.0, 1.0]);
        assert_eq!(dot_product3(&x, &y), 0.0);
        assert_eq!(dot_product3(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_normalize_vec3() {
        let v = normalize_vec3(&[3.0, 0.0, 4.0], 1e-12).unwrap();
        assert_relative_eq!(v[0], 0.6);
        assert_relative_eq!(v[2], 0.8);
        assert!(normalize_vec3(&[0.0, 0.0, 0.0], 1e-12).is_none());
    }

    #[test]
    fn test_inverse_mat33() {
        let m = [[2.0, 0.0, 1.0], [1.0, 3.0, 0.0], [0.0, 1.0, 4.0]];
        let inv = inverse_mat33(&m, 1e-12).unwrap();
        let id = mat33_mul_mat33(&m, &inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(id[i][j], expected, epsilon = 1e-12);
            }
        }
        let singular = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        assert!(inverse_mat33(&singular, 1e-12).is_none());
    }

    #[test]
    fn test_inverse_mat44() {
        let m = [
            [4.0, 7.0, 2.0, 0.5],
            [3.0, 6.0, 1.0, -1.0],
            [2.0, 5.0, 3.0, 2.0],
            [0.0, 1.0, -2.0, 1.0],
        ];
        let inv = inverse_mat44(&m, 1e-12).unwrap();
        for j in 0..4 {
            let mut e = [0.0; 4];
            e[j] = 1.0;
            let col = mat44_mul_vec4(&inv, &e);
            let back = mat44_mul_vec4(&m, &col);
            for i in 0..4 {
                assert_relative_eq!(back[i], e[i], epsilon = 1e-12);
            }
        }

        let mut singular = m;
        singular[3] = singular[0];
        assert!(inverse_mat44(&singular, 1e-12).is_none());
    }

    #[test]
    fn test_rigid_and_projection() {
        let rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let rt = rigid_mat44(&rotation, &[1.0, 2.0, 3.0]);
        assert_eq!(rt[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(mat44_mul_vec4(&rt, &[1.0, 0.0, 0.0, 1.0]), [1.0, 3.0, 3.0, 1.0]);

        let k = [[10.0, 0.0, 5.0], [0.0, 10.0, 5.0], [0.0, 0.0, 1.0]];
        let p = mat34_mul_mat44(&pad_mat33_to_mat34(&k), &rt);
        let uvw = mat34_mul_vec4(&p, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uvw, [25.0, 45.0, 3.0]);
    }
}
