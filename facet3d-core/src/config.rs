//! Configuration and presets for triangle alignment.
//!
//! [`AlignConfig`] controls the look-at up-vector policy, how depth residue
//! is handled, degeneracy thresholds and batch behaviour. It deserializes
//! from JSON with every field optional.
//!
//! # Presets
//!
//! - [`AlignConfig::default()`] - Exact vertex reproduction, parallel batches
//! - [`AlignConfig::flat()`] - Depth residue discarded, embedded affine acts purely in-plane
//! - [`AlignConfig::strict()`] - Rejects very thin or tiny faces
//!
//! # Example
//!
//! ```
//! use facet3d_core::{AlignConfig, DepthPolicy, FailurePolicy};
//!
//! let config = AlignConfig::default()
//!     .with_depth(DepthPolicy::Flatten)
//!     .with_failure(FailurePolicy::Identity)
//!     .with_parallel(false);
//! assert_eq!(config.depth, DepthPolicy::Flatten);
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Up-vector selection for the per-triangle look-at frame.
///
/// The frame's right axis is `up x forward`. When the preferred up is
/// (nearly) parallel to the face normal that cross product vanishes, so the
/// fallback axis is used instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpPolicy {
    /// Preferred world up.
    pub world_up: [f64; 3],
    /// Up used when `world_up` is parallel to the normal.
    pub fallback_up: [f64; 3],
    /// Minimum `|world_up x forward|` (both unit) before switching to the fallback.
    pub parallel_epsilon: f64,
}

impl Default for UpPolicy {
    fn default() -> Self {
        Self {
            world_up: [0.0, 1.0, 0.0],
            fallback_up: [1.0, 0.0, 0.0],
            parallel_epsilon: 1e-6,
        }
    }
}

impl UpPolicy {
    /// Picks the up vector for a unit `forward` direction.
    ///
    /// Returns `None` when neither `world_up` nor `fallback_up` is a usable
    /// direction that stays more than `parallel_epsilon` away from `forward`.
    pub fn select(&self, forward: &Vector3<f64>) -> Option<Vector3<f64>> {
        usable_up(self.world_up, forward, self.parallel_epsilon)
            .or_else(|| usable_up(self.fallback_up, forward, self.parallel_epsilon))
    }
}

/// Unit `axis` if it is finite, non-zero and `|axis x forward| > epsilon`.
fn usable_up(axis: [f64; 3], forward: &Vector3<f64>, epsilon: f64) -> Option<Vector3<f64>> {
    let axis = Vector3::from(axis);
    if !axis.iter().all(|c| c.is_finite()) {
        return None;
    }
    let axis = axis.try_normalize(0.0)?;
    (axis.cross(forward).norm() > epsilon).then_some(axis)
}

/// What happens to the depth coordinate left over after projecting a
/// destination triangle into its local frame.
///
/// The residue is zero when the supplied normal is the triangle's geometric
/// normal, and both policies then agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Solve a depth row alongside the planar affine so every destination
    /// vertex is reproduced exactly, even with an approximate normal.
    #[default]
    Preserve,

    /// Drop the depth coordinate. Vertices land on the plane through the
    /// centroid perpendicular to the supplied normal.
    Flatten,
}

/// Transform substituted for a face that failed to align in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Zero-scale matrix placed at the face centroid (origin if the centroid is not finite).
    #[default]
    Collapse,

    /// Identity matrix.
    Identity,
}

/// Configuration for triangle alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Circumradius of the reference triangle.
    pub reference_radius: f64,

    /// Look-at up-vector policy.
    pub up: UpPolicy,

    /// Depth residue handling.
    pub depth: DepthPolicy,

    /// Faces with 3D or projected area at or below this are rejected.
    pub min_area: f64,

    /// Substitute transform for rejected faces in a batch.
    pub failure: FailurePolicy,

    /// Whether to use parallel processing (via rayon) for batches.
    pub parallel: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            reference_radius: 1.0,
            up: UpPolicy::default(),
            depth: DepthPolicy::default(),
            min_area: 1e-12,
            failure: FailurePolicy::default(),
            parallel: true,
        }
    }
}

impl AlignConfig {
    /// Checks every numeric field, as needed for values loaded from a file.
    ///
    /// ```
    /// use facet3d_core::{AlignConfig, ConfigError};
    ///
    /// assert!(AlignConfig::default().validate().is_ok());
    /// let bad = AlignConfig::default().with_reference_radius(0.0);
    /// assert_eq!(bad.validate(), Err(ConfigError::ReferenceRadius(0.0)));
    /// ```
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.reference_radius.is_finite() && self.reference_radius > 0.0) {
            return Err(ConfigError::ReferenceRadius(self.reference_radius));
        }
        if !(self.min_area.is_finite() && self.min_area >= 0.0) {
            return Err(ConfigError::MinArea(self.min_area));
        }
        let epsilon = self.up.parallel_epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ConfigError::ParallelEpsilon(epsilon));
        }
        for (field, value) in [("world_up", self.up.world_up), ("fallback_up", self.up.fallback_up)] {
            let v = Vector3::from(value);
            if !v.iter().all(|c| c.is_finite()) || v.norm() == 0.0 {
                return Err(ConfigError::UpVector { field, value });
            }
        }
        Ok(())
    }

    /// Planar alignment with the depth coordinate discarded.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            depth: DepthPolicy::Flatten,
            ..Self::default()
        }
    }

    /// Rejects faces smaller than `1e-8` square units.
    ///
    /// ```
    /// use facet3d_core::AlignConfig;
    ///
    /// assert!(AlignConfig::strict().min_area > AlignConfig::default().min_area);
    /// ```
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min_area: 1e-8,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reference_radius(mut self, radius: f64) -> Self {
        self.reference_radius = radius;
        self
    }

    #[must_use]
    pub fn with_up(mut self, up: UpPolicy) -> Self {
        self.up = up;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: DepthPolicy) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    #[must_use]
    pub fn with_failure(mut self, failure: FailurePolicy) -> Self {
        self.failure = failure;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_up_is_y() {
        let up = UpPolicy::default();
        let forward = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(up.select(&forward), Some(Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_up_falls_back_for_vertical_forward() {
        let up = UpPolicy::default();
        assert_eq!(up.select(&Vector3::y()), Some(Vector3::x()));
        assert_eq!(up.select(&-Vector3::y()), Some(Vector3::x()));
    }

    #[test]
    fn test_unusable_fallback_is_skipped() {
        let up = UpPolicy {
            fallback_up: [0.0, 0.0, 0.0],
            ..UpPolicy::default()
        };
        assert_eq!(up.select(&Vector3::y()), None);
        assert_eq!(up.select(&Vector3::z()), Some(Vector3::y()));

        let up = UpPolicy {
            fallback_up: [f64::NAN, 0.0, 0.0],
            ..UpPolicy::default()
        };
        assert_eq!(up.select(&-Vector3::y()), None);
    }

    #[test]
    fn test_epsilon_boundary_uses_fallback() {
        // |Y x forward| is exactly sin(theta) for this forward
        let theta: f64 = 1e-3;
        let forward = Vector3::new(0.0, theta.cos(), theta.sin());
        let up = UpPolicy {
            parallel_epsilon: Vector3::y().cross(&forward).norm(),
            ..UpPolicy::default()
        };
        assert_eq!(up.select(&forward), Some(Vector3::x()));
    }

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(AlignConfig::default().validate(), Ok(()));
        assert_eq!(AlignConfig::flat().validate(), Ok(()));
        assert_eq!(AlignConfig::strict().validate(), Ok(()));
        assert_eq!(AlignConfig::default().with_min_area(0.0).validate(), Ok(()));
    }

    #[test]
    fn test_validate_reference_radius() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = AlignConfig::default().with_reference_radius(radius).validate();
            assert!(matches!(result, Err(ConfigError::ReferenceRadius(_))), "{radius}");
        }
    }

    #[test]
    fn test_validate_min_area() {
        for min_area in [-1e-12, f64::NAN, f64::INFINITY] {
            let result = AlignConfig::default().with_min_area(min_area).validate();
            assert!(matches!(result, Err(ConfigError::MinArea(_))), "{min_area}");
        }
    }

    #[test]
    fn test_validate_parallel_epsilon() {
        for parallel_epsilon in [0.0, -1e-6, f64::NAN] {
            let config = AlignConfig::default().with_up(UpPolicy {
                parallel_epsilon,
                ..UpPolicy::default()
            });
            assert!(matches!(config.validate(), Err(ConfigError::ParallelEpsilon(_))));
        }
    }

    #[test]
    fn test_validate_up_vectors() {
        let config: AlignConfig =
            serde_json::from_str(r#"{ "up": { "fallback_up": [0, 0, 0] } }"#).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UpVector {
                field: "fallback_up",
                value: [0.0, 0.0, 0.0]
            })
        );

        let config = AlignConfig::default().with_up(UpPolicy {
            world_up: [0.0, f64::INFINITY, 0.0],
            ..UpPolicy::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UpVector { field: "world_up", .. })
        ));
    }

    #[test]
    fn test_presets() {
        assert_eq!(AlignConfig::flat().depth, DepthPolicy::Flatten);
        assert_eq!(AlignConfig::default().depth, DepthPolicy::Preserve);
        assert!(AlignConfig::default().parallel);
    }

    #[test]
    fn test_partial_json() {
        let config: AlignConfig =
            serde_json::from_str(r#"{ "depth": "flatten", "parallel": false }"#).unwrap();
        assert_eq!(config.depth, DepthPolicy::Flatten);
        assert!(!config.parallel);
        assert_eq!(config.reference_radius, 1.0);
        assert_eq!(config.up, UpPolicy::default());
    }

    #[test]
    fn test_json_round_trip_of_up_policy() {
        let config = AlignConfig::default().with_up(UpPolicy {
            world_up: [0.0, 0.0, 1.0],
            fallback_up: [0.0, 1.0, 0.0],
            parallel_epsilon: 1e-3,
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: AlignConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
