//! Alignment of the reference triangle onto a destination triangle.
//!
//! For each destination triangle:
//!
//! 1. a [`Frame`] is placed at the centroid, looking along the face normal;
//! 2. the three vertices are expressed in that frame and their XY
//!    coordinates taken as the planar destination;
//! 3. the 2D affine from the reference triangle to those points is solved;
//! 4. the affine is embedded in the frame's XY plane and composed as
//!    `frame * embedded`.
//!
//! Applying the result to the reference vertices (z = 0) gives back the
//! destination vertices, and the reference normal (+Z) maps onto the face
//! normal.

use nalgebra::{Point2, RowVector3};

use crate::affine2d;
use crate::config::{AlignConfig, DepthPolicy};
use crate::error::{AlignError, AlignResult, ConfigResult};
use crate::frame::Frame;
use crate::geometry::Triangle;
use crate::reference::ReferenceTriangle;
use crate::transform::{embed_planar, InstanceTransform};

/// Computes instance transforms for destination triangles.
///
/// Holds only immutable state, so one aligner can be shared across threads.
#[derive(Debug, Clone)]
pub struct TriangleAligner {
    config: AlignConfig,
    reference: ReferenceTriangle,
}

impl TriangleAligner {
    /// Aligner using the regular reference triangle of `config.reference_radius`.
    ///
    /// `config` is not checked; see [`TriangleAligner::try_new`].
    pub fn new(config: AlignConfig) -> Self {
        let reference = ReferenceTriangle::regular(config.reference_radius);
        Self { config, reference }
    }

    /// Like [`TriangleAligner::new`], rejecting a config that fails [`AlignConfig::validate`].
    pub fn try_new(config: AlignConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_reference(config: AlignConfig, reference: ReferenceTriangle) -> Self {
        Self { config, reference }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceTriangle {
        &self.reference
    }

    /// Transform taking the reference triangle onto `dst`.
    ///
    /// Degenerate input is reported as an error, never as a non-finite matrix.
    pub fn align(&self, dst: &Triangle) -> AlignResult<InstanceTransform> {
        if !dst.is_finite() {
            return Err(AlignError::NonFiniteInput);
        }
        let area = dst.area();
        if area <= self.config.min_area {
            return Err(AlignError::DegenerateTriangle { area });
        }

        let frame = Frame::look_along(dst.centroid(), &dst.normal, &self.config.up)?;
        let local = dst.vertices.map(|v| frame.to_local(&v));
        let planar_points = local.map(|p| Point2::new(p.x, p.y));

        // A normal lying in the triangle's plane squashes the projection.
        let projected = planar_area(&planar_points);
        if projected <= self.config.min_area {
            return Err(AlignError::DegenerateTriangle { area: projected });
        }

        let planar = affine2d::solve_with_inverse(self.reference.inverse(), &planar_points);
        let depth = match self.config.depth {
            DepthPolicy::Preserve => {
                Some(RowVector3::new(local[0].z, local[1].z, local[2].z) * self.reference.inverse())
            }
            DepthPolicy::Flatten => None,
        };

        let transform =
            InstanceTransform::from_matrix(frame.to_matrix() * embed_planar(&planar, depth.as_ref()));
        if transform.is_finite() {
            Ok(transform)
        } else {
            Err(AlignError::NonFiniteTransform)
        }
    }
}

impl Default for TriangleAligner {
    fn default() -> Self {
        Self::new(AlignConfig::default())
    }
}

fn planar_area(p: &[Point2<f64>; 3]) -> f64 {
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    (a.x * b.y - a.y * b.x).abs() * 0.5
}
