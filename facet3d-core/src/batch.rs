//! Alignment of every face of a mesh.
//!
//! Faces are independent, so the batch runs on rayon when
//! [`AlignConfig::parallel`](crate::AlignConfig) is set. Results are always
//! collected in face order and are identical to a sequential run. A face
//! that fails to align gets the configured substitute transform and is
//! listed in [`BatchReport::failures`]; it never stops the batch.

use log::{debug, info, warn};
use nalgebra::Point3;
use rayon::prelude::*;

use crate::align::TriangleAligner;
use crate::config::FailurePolicy;
use crate::error::AlignError;
use crate::geometry::{IndexedMesh, Triangle};
use crate::transform::InstanceTransform;

/// Why a face has no real transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceFailure {
    /// Alignment rejected the triangle.
    Align(AlignError),
    /// The face references a vertex outside the mesh.
    MissingVertex,
}

impl std::fmt::Display for FaceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Align(e) => write!(f, "{e}"),
            Self::MissingVertex => write!(f, "face references a missing vertex"),
        }
    }
}

/// Outcome of aligning a batch of triangles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One transform per input face, substitutes included.
    pub transforms: Vec<InstanceTransform>,
    /// Failed faces by index, ascending.
    pub failures: Vec<(usize, FaceFailure)>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.transforms.len() - self.failures.len()
    }

    pub fn is_failed(&self, face: usize) -> bool {
        self.failures.binary_search_by_key(&face, |(i, _)| *i).is_ok()
    }
}

/// Aligns every face of `mesh`.
pub fn align_mesh(mesh: &IndexedMesh, aligner: &TriangleAligner) -> BatchReport {
    debug!(
        "aligning {} faces over {} vertices (parallel: {})",
        mesh.face_count(),
        mesh.vertices.len(),
        aligner.config().parallel
    );
    let report = run(mesh.face_count(), aligner, |face| mesh.triangle(face));
    log_summary(&report);
    report
}

/// Aligns loose triangles.
pub fn align_triangles(triangles: &[Triangle], aligner: &TriangleAligner) -> BatchReport {
    let report = run(triangles.len(), aligner, |i| triangles.get(i).copied());
    log_summary(&report);
    report
}

fn run<F>(count: usize, aligner: &TriangleAligner, triangle: F) -> BatchReport
where
    F: Fn(usize) -> Option<Triangle> + Sync,
{
    let align_one = |face: usize| -> Result<InstanceTransform, (InstanceTransform, FaceFailure)> {
        match triangle(face) {
            Some(t) => aligner
                .align(&t)
                .map_err(|e| (substitute(aligner, Some(&t)), FaceFailure::Align(e))),
            None => Err((substitute(aligner, None), FaceFailure::MissingVertex)),
        }
    };

    let results: Vec<_> = if aligner.config().parallel {
        (0..count).into_par_iter().map(align_one).collect()
    } else {
        (0..count).map(align_one).collect()
    };

    let mut report = BatchReport {
        transforms: Vec::with_capacity(count),
        failures: Vec::new(),
    };
    for (face, result) in results.into_iter().enumerate() {
        match result {
            Ok(t) => report.transforms.push(t),
            Err((t, failure)) => {
                warn!("face {face}: {failure}");
                report.transforms.push(t);
                report.failures.push((face, failure));
            }
        }
    }
    report
}

fn substitute(aligner: &TriangleAligner, triangle: Option<&Triangle>) -> InstanceTransform {
    match aligner.config().failure {
        FailurePolicy::Identity => InstanceTransform::identity(),
        FailurePolicy::Collapse => {
            let at = triangle
                .map(Triangle::centroid)
                .filter(|c| c.coords.iter().all(|v| v.is_finite()))
                .unwrap_or_else(Point3::origin);
            InstanceTransform::collapsed(at)
        }
    }
}

fn log_summary(report: &BatchReport) {
    if report.failures.is_empty() {
        info!("aligned {} faces", report.len());
    } else {
        info!(
            "aligned {} of {} faces, {} substituted",
            report.succeeded(),
            report.len(),
            report.failures.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlignConfig;
    use nalgebra::Vector3;

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = IndexedMesh::octahedron(2.0);
        let parallel = align_mesh(&mesh, &TriangleAligner::new(AlignConfig::default()));
        let sequential =
            align_mesh(&mesh, &TriangleAligner::new(AlignConfig::default().with_parallel(false)));
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 8);
        assert!(parallel.failures.is_empty());
    }

    #[test]
    fn test_each_face_matches_single_alignment() {
        let mesh = IndexedMesh::cube(3.0);
        let aligner = TriangleAligner::default();
        let report = align_mesh(&mesh, &aligner);
        for (face, t) in report.transforms.iter().enumerate() {
            let single = aligner.align(&mesh.triangle(face).unwrap()).unwrap();
            assert_eq!(*t, single);
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let mut mesh = IndexedMesh::cube(2.0);
        // Collapse face 2 onto a single edge, zero the normal of face 5
        mesh.faces[2].indices[2] = mesh.faces[2].indices[1];
        mesh.faces[5].normal = Vector3::zeros();
        // And point face 7 past the vertex array
        mesh.faces[7].indices[0] = 100;

        let report = align_mesh(&mesh, &TriangleAligner::default());
        assert_eq!(report.len(), 12);
        assert_eq!(report.succeeded(), 9);
        assert!(report.is_failed(2) && report.is_failed(5) && report.is_failed(7));
        assert!(!report.is_failed(0));
        assert_eq!(report.failures[1], (5, FaceFailure::Align(AlignError::ZeroNormal)));
        assert_eq!(report.failures[2], (7, FaceFailure::MissingVertex));
        assert!(report.transforms.iter().all(InstanceTransform::is_finite));
    }

    #[test]
    fn test_collapse_substitute_sits_at_centroid() {
        let mut mesh = IndexedMesh::cube(2.0);
        mesh.faces[0].normal = Vector3::zeros();
        let report = align_mesh(&mesh, &TriangleAligner::default());
        let centroid = mesh.triangle(0).unwrap().centroid();
        assert_eq!(report.transforms[0], InstanceTransform::collapsed(centroid));
    }

    #[test]
    fn test_identity_substitute() {
        let mut mesh = IndexedMesh::cube(2.0);
        mesh.faces[0].normal = Vector3::zeros();
        let aligner =
            TriangleAligner::new(AlignConfig::default().with_failure(FailurePolicy::Identity));
        let report = align_mesh(&mesh, &aligner);
        assert_eq!(report.transforms[0], InstanceTransform::identity());
    }

    #[test]
    fn test_align_triangles_order_independent() {
        let mesh = IndexedMesh::octahedron(1.0);
        let triangles: Vec<Triangle> = (0..mesh.face_count()).filter_map(|i| mesh.triangle(i)).collect();
        let aligner = TriangleAligner::default();
        let forward = align_triangles(&triangles, &aligner);

        let reversed: Vec<Triangle> = triangles.iter().rev().copied().collect();
        let backward = align_triangles(&reversed, &aligner);
        let n = triangles.len();
        for i in 0..n {
            assert_eq!(forward.transforms[i], backward.transforms[n - 1 - i]);
        }
    }

    #[test]
    fn test_empty_mesh() {
        let report = align_mesh(&IndexedMesh::new(), &TriangleAligner::default());
        assert!(report.is_empty());
        assert_eq!(report.succeeded(), 0);
    }
}
