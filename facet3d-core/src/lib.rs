//! facet3d core: per-triangle instance alignment.
//!
//! Given a fixed reference triangle and a destination triangle with its face
//! normal, [`TriangleAligner::align`] computes the 4x4 transform that places
//! the reference triangle exactly onto the destination. [`align_mesh`] runs
//! it over every face of an [`IndexedMesh`], and [`InstanceBuffers`] packs
//! the results for an instanced draw call.
//!
//! ```
//! use facet3d_core::{align_mesh, AlignConfig, IndexedMesh, TriangleAligner};
//!
//! let mesh = IndexedMesh::cube(2.0);
//! let aligner = TriangleAligner::new(AlignConfig::default());
//! let report = align_mesh(&mesh, &aligner);
//! assert_eq!(report.transforms.len(), 12);
//! assert!(report.failures.is_empty());
//! ```

pub mod affine2d;
pub mod align;
pub mod batch;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod instancing;
pub mod reference;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use align::TriangleAligner;
pub use batch::{align_mesh, align_triangles, BatchReport, FaceFailure};
pub use config::{AlignConfig, DepthPolicy, FailurePolicy, UpPolicy};
pub use error::{AlignError, AlignResult, ConfigError, ConfigResult, MeshError, MeshResult};
pub use frame::Frame;
pub use geometry::{Face, IndexedMesh, Triangle};
pub use instancing::{InstanceBuffers, InstancingConfig, PyramidTemplate};
pub use reference::ReferenceTriangle;
pub use transform::InstanceTransform;
