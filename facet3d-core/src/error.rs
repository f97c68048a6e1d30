//! Error types for triangle alignment and mesh ingestion.

use thiserror::Error;

/// Result type for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for mesh loading and validation.
pub type MeshResult<T> = Result<T, MeshError>;

/// Reasons a destination triangle cannot be aligned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AlignError {
    /// The face normal has (near-)zero length, so no frame can face it.
    #[error("face normal has zero length")]
    ZeroNormal,

    /// The triangle (or its projection onto the normal plane) has no area.
    #[error("degenerate triangle: area {area:e}")]
    DegenerateTriangle {
        /// Area that fell below the configured minimum.
        area: f64,
    },

    /// A vertex or the normal contains NaN or infinity.
    #[error("triangle contains non-finite coordinates")]
    NonFiniteInput,

    /// The composed transform contains NaN or infinity.
    #[error("alignment produced a non-finite transform")]
    NonFiniteTransform,
}

/// An [`AlignConfig`](crate::AlignConfig) value outside its usable range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("reference_radius must be finite and positive, got {0}")]
    ReferenceRadius(f64),

    #[error("min_area must be finite and non-negative, got {0}")]
    MinArea(f64),

    #[error("up.parallel_epsilon must be finite and positive, got {0}")]
    ParallelEpsilon(f64),

    /// An up vector that is zero or not finite.
    #[error("up.{field} must be a finite non-zero vector, got {value:?}")]
    UpVector {
        /// `world_up` or `fallback_up`.
        field: &'static str,
        value: [f64; 3],
    },
}

/// Errors raised while building an indexed mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Binary STL shorter than its fixed header.
    #[error("file too small to be a valid STL ({len} bytes)")]
    TooShort {
        /// Number of bytes available.
        len: usize,
    },

    /// Binary STL declares more facets than it contains.
    #[error("unexpected end of file: expected {expected} facets, found {actual}")]
    Truncated {
        /// Facet count from the header.
        expected: usize,
        /// Facets actually present.
        actual: usize,
    },

    /// ASCII STL syntax error.
    #[error("failed to parse ASCII STL: {0}")]
    Parse(String),

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count}")]
    IndexOutOfRange {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}
