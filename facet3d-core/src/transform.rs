//! Per-instance 4x4 transforms.
//!
//! Matrices are nalgebra column-major and act on column vectors
//! (`p' = M * p`). [`InstanceTransform::to_cols_array`] flattens in the same
//! order, column 0 first, which is the layout of a GPU `mat4` attribute.

use nalgebra::{Matrix3, Matrix4, Point3, RowVector3, Vector3};

/// Embeds a homogeneous 2D affine into a 4x4 matrix acting on the XY plane.
///
/// Z passes through unchanged. With `depth = Some([g, h, i])` the Z row
/// becomes `z' = g x + h y + z + i`; with `None` it is the identity row.
pub fn embed_planar(planar: &Matrix3<f64>, depth: Option<&RowVector3<f64>>) -> Matrix4<f64> {
    let (g, h, i) = depth.map_or((0.0, 0.0, 0.0), |d| (d[0], d[1], d[2]));
    Matrix4::new(
        planar[(0, 0)], planar[(0, 1)], 0.0, planar[(0, 2)],
        planar[(1, 0)], planar[(1, 1)], 0.0, planar[(1, 2)],
        g, h, 1.0, i,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// The transform placing one reference-triangle instance onto a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform(Matrix4<f64>);

impl InstanceTransform {
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self(matrix)
    }

    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Zero-scale transform: every point maps to `at`.
    pub fn collapsed(at: Point3<f64>) -> Self {
        let mut m = Matrix4::zeros();
        m[(0, 3)] = at.x;
        m[(1, 3)] = at.y;
        m[(2, 3)] = at.z;
        m[(3, 3)] = 1.0;
        Self(m)
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    pub fn into_matrix(self) -> Matrix4<f64> {
        self.0
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.0.transform_point(p)
    }

    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.0.transform_vector(v)
    }

    /// Image of the reference plane normal (local +Z).
    pub fn normal_axis(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 2).into_owned()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// The 16 entries, column-major, narrowed to `f32`.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (dst, src) in out.iter_mut().zip(self.0.iter()) {
            *dst = *src as f32;
        }
        out
    }

    /// One column narrowed to `f32`.
    pub fn column(&self, index: usize) -> [f32; 4] {
        let c = self.0.column(index);
        [c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32]
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<InstanceTransform> for Matrix4<f64> {
    fn from(t: InstanceTransform) -> Self {
        t.0
    }
}
