//! Pyramid instance geometry and per-instance attribute buffers.
//!
//! Each instance is a three-sided pyramid whose base is the reference
//! triangle. The template stores two vertex buffers: `origin`, with the apex
//! flattened onto the base centre, and `target`, with the apex raised to
//! `height` along local +Z. A renderer blends between them to grow the
//! pyramids out of the surface.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::batch::BatchReport;
use crate::geometry::IndexedMesh;
use crate::reference::ReferenceTriangle;
use crate::transform::InstanceTransform;

/// Pyramid template settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstancingConfig {
    /// Apex height of the raised pyramid, in reference-triangle units.
    pub height: f64,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self { height: 10.0 }
    }
}

/// Three side faces of a pyramid over the reference triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidTemplate {
    origin: [[Point3<f64>; 3]; 3],
    target: [[Point3<f64>; 3]; 3],
}

impl PyramidTemplate {
    pub fn new(reference: &ReferenceTriangle, config: &InstancingConfig) -> Self {
        let base = reference.points3();
        let centre = Point3::from((base[0].coords + base[1].coords + base[2].coords) / 3.0);
        let apex = centre + Vector3::z() * config.height;

        let side = |apex: Point3<f64>| {
            [0, 1, 2].map(|i| [apex, base[i], base[(i + 1) % 3]])
        };
        Self {
            origin: side(centre),
            target: side(apex),
        }
    }

    /// Number of vertices per instance.
    pub const VERTEX_COUNT: usize = 9;

    /// Flat positions, 3 floats per vertex.
    pub fn origin_buffer(&self) -> Vec<f32> {
        flatten(&self.origin)
    }

    /// Raised positions, 3 floats per vertex.
    pub fn target_buffer(&self) -> Vec<f32> {
        flatten(&self.target)
    }

    /// Side faces of one instance in world space, apex blended by `mix` in `[0, 1]`.
    pub fn instance_triangles(&self, transform: &InstanceTransform, mix: f64) -> [[Point3<f64>; 3]; 3] {
        let mix = mix.clamp(0.0, 1.0);
        let mut out = self.origin;
        for (face, target) in out.iter_mut().zip(self.target.iter()) {
            for (v, t) in face.iter_mut().zip(target.iter()) {
                *v = transform.transform_point(&v.lerp(t, mix));
            }
        }
        out
    }
}

fn flatten(faces: &[[Point3<f64>; 3]; 3]) -> Vec<f32> {
    faces
        .iter()
        .flatten()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect()
}

/// Per-instance attributes in the layout of an instanced draw call.
///
/// Each transform is split into four column buffers of 4 floats per
/// instance; `normals` holds the face normal, 3 floats per instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceBuffers {
    pub col0: Vec<f32>,
    pub col1: Vec<f32>,
    pub col2: Vec<f32>,
    pub col3: Vec<f32>,
    pub normals: Vec<f32>,
}

impl InstanceBuffers {
    pub fn with_capacity(instances: usize) -> Self {
        Self {
            col0: Vec::with_capacity(instances * 4),
            col1: Vec::with_capacity(instances * 4),
            col2: Vec::with_capacity(instances * 4),
            col3: Vec::with_capacity(instances * 4),
            normals: Vec::with_capacity(instances * 3),
        }
    }

    /// Packs a batch computed over `mesh`.
    pub fn from_report(report: &BatchReport, mesh: &IndexedMesh) -> Self {
        let mut buffers = Self::with_capacity(report.len());
        for (transform, face) in report.transforms.iter().zip(mesh.faces.iter()) {
            buffers.push(transform, [face.normal.x as f32, face.normal.y as f32, face.normal.z as f32]);
        }
        buffers
    }

    pub fn push(&mut self, transform: &InstanceTransform, normal: [f32; 3]) {
        self.col0.extend_from_slice(&transform.column(0));
        self.col1.extend_from_slice(&transform.column(1));
        self.col2.extend_from_slice(&transform.column(2));
        self.col3.extend_from_slice(&transform.column(3));
        self.normals.extend_from_slice(&normal);
    }

    pub fn instance_count(&self) -> usize {
        self.normals.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::TriangleAligner;
    use crate::batch::align_mesh;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_template_buffers() {
        let template = PyramidTemplate::new(&ReferenceTriangle::default(), &InstancingConfig::default());
        let origin = template.origin_buffer();
        let target = template.target_buffer();
        assert_eq!(origin.len(), PyramidTemplate::VERTEX_COUNT * 3);
        assert_eq!(target.len(), origin.len());
        // First side: apex, vertex 0 at (1, 0, 0), vertex 1 at 120°
        for (got, want) in origin[0..3].iter().zip([0.0f32, 0.0, 0.0]) {
            assert!((got - want).abs() < 1e-6);
        }
        for (got, want) in target[0..3].iter().zip([0.0f32, 0.0, 10.0]) {
            assert!((got - want).abs() < 1e-6);
        }
        assert_eq!(&origin[3..6], &[1.0, 0.0, 0.0]);
        assert!((origin[6] + 0.5).abs() < 1e-6);
        // Base vertices coincide in both buffers
        assert_eq!(&origin[3..9], &target[3..9]);
    }

    #[test]
    fn test_instance_apex_follows_normal() {
        let mesh = IndexedMesh::octahedron(3.0);
        let aligner = TriangleAligner::default();
        let report = align_mesh(&mesh, &aligner);
        let template = PyramidTemplate::new(aligner.reference(), &InstancingConfig { height: 2.0 });

        for (face, t) in report.transforms.iter().enumerate() {
            let triangle = mesh.triangle(face).unwrap();
            let flat = template.instance_triangles(t, 0.0);
            let raised = template.instance_triangles(t, 1.0);
            assert_abs_diff_eq!(flat[0][0], triangle.centroid(), epsilon = 1e-9);
            assert_abs_diff_eq!(
                raised[0][0],
                triangle.centroid() + triangle.normal * 2.0,
                epsilon = 1e-9
            );
            // Base corners sit on the face vertices
            for i in 0..3 {
                assert_abs_diff_eq!(raised[i][1], triangle.vertices[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_buffers_from_report() {
        let mesh = IndexedMesh::cube(1.0);
        let report = align_mesh(&mesh, &TriangleAligner::default());
        let buffers = InstanceBuffers::from_report(&report, &mesh);
        assert_eq!(buffers.instance_count(), 12);
        assert_eq!(buffers.col0.len(), 48);
        assert_eq!(buffers.col3.len(), 48);

        let cols = report.transforms[4].to_cols_array();
        assert_eq!(&buffers.col0[16..20], &cols[0..4]);
        assert_eq!(&buffers.col1[16..20], &cols[4..8]);
        assert_eq!(&buffers.col2[16..20], &cols[8..12]);
        assert_eq!(&buffers.col3[16..20], &cols[12..16]);
        assert_eq!(&buffers.normals[12..15], &[0.0, 1.0, 0.0]);
    }
}
