//! The fixed reference triangle every instance is aligned from.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Point2, Point3};

use crate::affine2d;

/// Equilateral triangle in the z = 0 plane, vertices at 0°, 120° and 240°
/// on a circle centred at the origin.
///
/// The inverse of its homogeneous matrix is computed once here and reused
/// for every destination triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceTriangle {
    points: [Point2<f64>; 3],
    inverse: Matrix3<f64>,
}

impl ReferenceTriangle {
    pub fn regular(radius: f64) -> Self {
        let points = [0.0, 1.0, 2.0].map(|i: f64| {
            let angle = 2.0 * PI / 3.0 * i;
            Point2::new(radius * angle.cos(), radius * angle.sin())
        });
        Self::from_points(points)
    }

    /// Any non-collinear triangle may serve as reference.
    pub fn from_points(points: [Point2<f64>; 3]) -> Self {
        Self {
            points,
            inverse: affine2d::triangle_inverse(&points),
        }
    }

    pub fn points(&self) -> &[Point2<f64>; 3] {
        &self.points
    }

    /// Vertices embedded in 3D at z = 0.
    pub fn points3(&self) -> [Point3<f64>; 3] {
        self.points.map(|p| Point3::new(p.x, p.y, 0.0))
    }

    /// `T_ref^-1`, the right factor of every planar solve.
    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }
}

impl Default for ReferenceTriangle {
    fn default() -> Self {
        Self::regular(1.0)
    }
}
