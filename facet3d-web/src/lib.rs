//! facet3d web bindings.
//!
//! Hands the per-instance column buffers of a mesh to a browser renderer.
//! The JS side uploads `col0..col3` as four `vec4` instanced attributes
//! (together one column-major `mat4` per instance), `normals` as a `vec3`
//! attribute, and `origin`/`target` as the per-vertex pyramid template.

use facet3d_core::{
    align_mesh, stl, AlignConfig, DepthPolicy, IndexedMesh, InstanceBuffers, InstancingConfig,
    PyramidTemplate, TriangleAligner,
};
use wasm_bindgen::prelude::*;

/// Instance data for one mesh, computed once at load time
#[wasm_bindgen]
pub struct FacetInstances {
    buffers: InstanceBuffers,
    template: PyramidTemplate,
    failed: usize,
}

#[wasm_bindgen]
impl FacetInstances {
    /// Parse STL bytes and align one pyramid per face.
    ///
    /// `flatten` selects the planar-only depth policy.
    #[wasm_bindgen(constructor)]
    pub fn new(stl_bytes: &[u8], height: f64, flatten: bool) -> Result<FacetInstances, JsValue> {
        let mesh = stl::parse_stl(stl_bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::from_mesh(&mesh, height, flatten))
    }

    /// Instances over the built-in octahedron, for demos without an asset.
    pub fn octahedron(radius: f64, height: f64) -> FacetInstances {
        Self::from_mesh(&IndexedMesh::octahedron(radius), height, false)
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.buffers.instance_count()
    }

    /// Faces that received a substitute transform
    #[wasm_bindgen(getter)]
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn col0(&self) -> Vec<f32> {
        self.buffers.col0.clone()
    }

    pub fn col1(&self) -> Vec<f32> {
        self.buffers.col1.clone()
    }

    pub fn col2(&self) -> Vec<f32> {
        self.buffers.col2.clone()
    }

    pub fn col3(&self) -> Vec<f32> {
        self.buffers.col3.clone()
    }

    pub fn normals(&self) -> Vec<f32> {
        self.buffers.normals.clone()
    }

    pub fn origin(&self) -> Vec<f32> {
        self.template.origin_buffer()
    }

    pub fn target(&self) -> Vec<f32> {
        self.template.target_buffer()
    }
}

impl FacetInstances {
    fn from_mesh(mesh: &IndexedMesh, height: f64, flatten: bool) -> Self {
        let depth = if flatten {
            DepthPolicy::Flatten
        } else {
            DepthPolicy::Preserve
        };
        // No thread pool in the browser
        let config = AlignConfig::default().with_depth(depth).with_parallel(false);
        let aligner = TriangleAligner::new(config);

        let report = align_mesh(mesh, &aligner);
        log::debug!("{} instances, {} substituted", report.len(), report.failures.len());

        Self {
            buffers: InstanceBuffers::from_report(&report, mesh),
            template: PyramidTemplate::new(aligner.reference(), &InstancingConfig { height }),
            failed: report.failures.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octahedron_buffers() {
        let instances = FacetInstances::octahedron(2.0, 0.5);
        assert_eq!(instances.count(), 8);
        assert_eq!(instances.failed(), 0);
        assert_eq!(instances.col0().len(), 32);
        assert_eq!(instances.normals().len(), 24);
        assert_eq!(instances.origin().len(), PyramidTemplate::VERTEX_COUNT * 3);
        assert!((instances.target()[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_flatten_matches_for_planar_faces() {
        let mesh = IndexedMesh::cube(1.0);
        let preserve = FacetInstances::from_mesh(&mesh, 1.0, false);
        let flat = FacetInstances::from_mesh(&mesh, 1.0, true);
        for (a, b) in preserve.col3().iter().zip(flat.col3().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
