//! Per-triangle orthonormal frame.
//!
//! Local +Z (`forward`) is the face normal, local +X is `right` and local +Y
//! is `up`. The frame is right-handed: `right x up == forward`.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

use crate::config::UpPolicy;
use crate::error::{AlignError, AlignResult};

/// Shortest normal accepted as a direction.
const MIN_NORMAL_LENGTH: f64 = 1e-12;

/// Rigid local-to-world transform centred on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f64>,
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
    pub forward: Vector3<f64>,
}

impl Frame {
    /// Frame at `origin` looking along `direction`.
    ///
    /// Only the direction of `direction` matters. Its up vector comes from
    /// `policy`; if even the fallback is parallel to `direction`, the world
    /// axis least aligned with it is used.
    pub fn look_along(
        origin: Point3<f64>,
        direction: &Vector3<f64>,
        policy: &UpPolicy,
    ) -> AlignResult<Self> {
        let forward = direction
            .try_normalize(MIN_NORMAL_LENGTH)
            .ok_or(AlignError::ZeroNormal)?;

        // The least aligned axis is at least ~55 degrees off forward
        let hint = policy
            .select(&forward)
            .unwrap_or_else(|| least_aligned_axis(&forward));
        let right = hint.cross(&forward).normalize();
        let up = forward.cross(&right);

        Ok(Self {
            origin,
            right,
            up,
            forward,
        })
    }

    /// Frame at `origin` looking at `target`, the classic look-at form.
    pub fn look_at(origin: Point3<f64>, target: &Point3<f64>, policy: &UpPolicy) -> AlignResult<Self> {
        Self::look_along(origin, &(*target - origin), policy)
    }

    /// Rotation part, basis vectors as columns.
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.right, self.up, self.forward])
    }

    /// Local-to-world matrix.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_columns(&[
            self.right.push(0.0),
            self.up.push(0.0),
            self.forward.push(0.0),
            Vector4::new(self.origin.x, self.origin.y, self.origin.z, 1.0),
        ])
    }

    /// World-to-local matrix. Exact for a rigid frame: `R^T` and `-R^T * origin`.
    pub fn inverse_matrix(&self) -> Matrix4<f64> {
        let rt = self.basis().transpose();
        let t = -(rt * self.origin.coords);
        let mut m = rt.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
        m
    }

    /// Expresses a world point in this frame.
    pub fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        let d = p - self.origin;
        Point3::new(d.dot(&self.right), d.dot(&self.up), d.dot(&self.forward))
    }

    pub fn to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        self.origin + self.right * p.x + self.up * p.y + self.forward * p.z
    }
}

fn least_aligned_axis(v: &Vector3<f64>) -> Vector3<f64> {
    let a = v.abs();
    if a.x <= a.y && a.x <= a.z {
        Vector3::x()
    } else if a.y <= a.z {
        Vector3::y()
    } else {
        Vector3::z()
    }
}
