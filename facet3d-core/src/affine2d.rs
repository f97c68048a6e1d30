//! Exact 2D affine map between two triangles.
//!
//! A triangle `(p0, p1, p2)` is written as the homogeneous matrix
//!
//! ```text
//! T = | x0 x1 x2 |
//!     | y0 y1 y2 |
//!     |  1  1  1 |
//! ```
//!
//! and the affine map taking `src` onto `dst` is `M = T_dst * T_src^-1`.
//! The inverse is the closed-form adjugate over determinant; no pivoting
//! is needed for a fixed 3x3 size.

use nalgebra::{Matrix3, Point2, RowVector3};

/// Builds the homogeneous column matrix of a triangle.
pub fn triangle_matrix(points: &[Point2<f64>; 3]) -> Matrix3<f64> {
    Matrix3::new(
        points[0].x, points[1].x, points[2].x,
        points[0].y, points[1].y, points[2].y,
        1.0, 1.0, 1.0,
    )
}

/// Classical adjugate (transposed cofactor matrix) of a 3x3 matrix.
pub fn adjugate(m: &Matrix3<f64>) -> Matrix3<f64> {
    let (a, b, c) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (d, e, f) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (g, h, i) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    Matrix3::new(
        e * i - f * h, c * h - b * i, b * f - c * e,
        f * g - d * i, a * i - c * g, c * d - a * f,
        d * h - e * g, b * g - a * h, a * e - b * d,
    )
}

/// Inverse of a triangle's homogeneous matrix.
///
/// Collinear points give a zero determinant; the division is left unguarded
/// and the result then holds NaN or infinity.
pub fn triangle_inverse(points: &[Point2<f64>; 3]) -> Matrix3<f64> {
    let m = triangle_matrix(points);
    let adj = adjugate(&m);
    // Expansion along the first row, reusing the cofactors already in adj.
    let det = m[(0, 0)] * adj[(0, 0)] + m[(0, 1)] * adj[(1, 0)] + m[(0, 2)] * adj[(2, 0)];
    adj / det
}

/// Affine map onto `dst` given the precomputed inverse of the source triangle.
///
/// The bottom row is pinned to `[0, 0, 1]`.
pub fn solve_with_inverse(src_inverse: &Matrix3<f64>, dst: &[Point2<f64>; 3]) -> Matrix3<f64> {
    let mut m = triangle_matrix(dst) * src_inverse;
    m.set_row(2, &RowVector3::new(0.0, 0.0, 1.0));
    m
}

/// Computes the affine map `M` with `M * [src[i], 1] == [dst[i], 1]`.
///
/// Degenerate (collinear) `src` propagates non-finite values into `M`.
pub fn solve(src: &[Point2<f64>; 3], dst: &[Point2<f64>; 3]) -> Matrix3<f64> {
    solve_with_inverse(&triangle_inverse(src), dst)
}

/// Checked variant of [`solve`]: `None` when `src` is collinear or the result is not finite.
pub fn try_solve(src: &[Point2<f64>; 3], dst: &[Point2<f64>; 3]) -> Option<Matrix3<f64>> {
    let m = solve(src, dst);
    m.iter().all(|v| v.is_finite()).then_some(m)
}

/// Applies a homogeneous 2D affine matrix to a point.
pub fn apply(m: &Matrix3<f64>, p: &Point2<f64>) -> Point2<f64> {
    Point2::new(
        m[(0, 0)] * p.x + m[(0, 1)] * p.y + m[(0, 2)],
        m[(1, 0)] * p.x + m[(1, 1)] * p.y + m[(1, 2)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> [Point2<f64>; 3] {
        [Point2::new(a.0, a.1), Point2::new(b.0, b.1), Point2::new(c.0, c.1)]
    }

    #[test]
    fn test_adjugate_gives_inverse() {
        let m = Matrix3::new(2.0, 0.0, 1.0, 1.0, 3.0, 0.0, 0.0, 1.0, 4.0);
        let inv = adjugate(&m) / m.determinant();
        assert_relative_eq!(m * inv, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_solve_same_triangle_is_identity() {
        let t = tri((0.3, -1.0), (2.0, 0.5), (-0.7, 1.9));
        assert_relative_eq!(solve(&t, &t), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_solve_translation_and_scale() {
        let src = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let dst = tri((5.0, 5.0), (7.0, 5.0), (5.0, 8.0));
        let m = solve(&src, &dst);
        let expected = Matrix3::new(2.0, 0.0, 5.0, 0.0, 3.0, 5.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(m, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_maps_each_vertex() {
        let src = tri((1.0, 0.0), (-0.5, 0.866), (-0.5, -0.866));
        let dst = tri((3.2, -4.0), (0.1, 0.25), (-2.0, 7.5));
        let m = solve(&src, &dst);
        for (s, d) in src.iter().zip(dst.iter()) {
            let mapped = apply(&m, s);
            assert_relative_eq!(mapped, *d, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solve_shear_and_reflection() {
        let src = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        // Mirrored winding flips the sign of the determinant
        let dst = tri((0.0, 0.0), (0.0, 1.0), (1.0, 0.5));
        let m = solve(&src, &dst);
        assert!(m.determinant() < 0.0);
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_relative_eq!(apply(&m, s), *d, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bottom_row_is_exact() {
        let src = tri((0.1, 0.2), (3.0, 0.7), (1.1, 4.4));
        let dst = tri((9.0, 1.0), (-3.0, 2.0), (0.5, -6.0));
        let m = solve(&src, &dst);
        assert_eq!(m[(2, 0)], 0.0);
        assert_eq!(m[(2, 1)], 0.0);
        assert_eq!(m[(2, 2)], 1.0);
    }

    #[test]
    fn test_collinear_source_is_not_finite() {
        let src = tri((0.0, 0.0), (1.0, 1.0), (2.0, 2.0));
        let dst = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let m = solve(&src, &dst);
        assert!(m.iter().any(|v| !v.is_finite()));
        assert!(try_solve(&src, &dst).is_none());
    }

    #[test]
    fn test_try_solve_accepts_regular_triangles() {
        let src = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        assert!(try_solve(&src, &src).is_some());
    }
}
