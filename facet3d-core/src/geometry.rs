//! Geometry primitives: destination triangles and indexed meshes.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, MeshResult};

/// A destination triangle with its face normal.
///
/// Vertex order defines correspondence with the reference triangle and the
/// handedness of the resulting transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f64>; 3],
    pub normal: Vector3<f64>,
}

impl Triangle {
    pub fn new(vertices: [Point3<f64>; 3], normal: Vector3<f64>) -> Self {
        Self { vertices, normal }
    }

    /// Builds a triangle whose normal is its geometric normal.
    pub fn from_vertices(vertices: [Point3<f64>; 3]) -> Self {
        let mut triangle = Self::new(vertices, Vector3::zeros());
        triangle.normal = triangle.geometric_normal();
        triangle
    }

    pub fn centroid(&self) -> Point3<f64> {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Unnormalized `(v1 - v0) x (v2 - v0)`; its length is twice the area.
    pub fn cross(&self) -> Vector3<f64> {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a))
    }

    pub fn area(&self) -> f64 {
        self.cross().norm() * 0.5
    }

    /// Unit normal from the vertex winding, zero for a degenerate triangle.
    pub fn geometric_normal(&self) -> Vector3<f64> {
        self.cross().try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .flat_map(|v| v.coords.iter())
            .chain(self.normal.iter())
            .all(|c| c.is_finite())
    }
}

/// A face: three indices into the shared vertex array and a face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub indices: [u32; 3],
    pub normal: Vector3<f64>,
}

impl Face {
    pub fn new(indices: [u32; 3], normal: Vector3<f64>) -> Self {
        Self { indices, normal }
    }
}

/// A triangle mesh with a shared vertex array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
}

impl IndexedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolves a face into a [`Triangle`]; `None` if the face or one of its indices is out of range.
    pub fn triangle(&self, face: usize) -> Option<Triangle> {
        let f = self.faces.get(face)?;
        let vertex = |i: u32| self.vertices.get(i as usize).copied();
        Some(Triangle::new(
            [vertex(f.indices[0])?, vertex(f.indices[1])?, vertex(f.indices[2])?],
            f.normal,
        ))
    }

    /// Checks that every face index refers to an existing vertex.
    pub fn validate(&self) -> MeshResult<()> {
        let vertex_count = self.vertices.len();
        for (face, f) in self.faces.iter().enumerate() {
            if let Some(&index) = f.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Replaces every face normal with the geometric normal of its winding.
    pub fn recompute_normals(&mut self) {
        for face in 0..self.faces.len() {
            if let Some(triangle) = self.triangle(face) {
                self.faces[face].normal = triangle.geometric_normal();
            }
        }
    }

    fn from_indices(vertices: Vec<Point3<f64>>, indices: &[[u32; 3]]) -> Self {
        let mut mesh = Self {
            vertices,
            faces: indices
                .iter()
                .map(|&idx| Face::new(idx, Vector3::zeros()))
                .collect(),
        };
        mesh.recompute_normals();
        mesh
    }

    /// Axis-aligned cube centred at the origin; its top and bottom faces
    /// have vertical normals.
    pub fn cube(size: f64) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let indices = [
            // Front
            [4, 5, 6],
            [4, 6, 7],
            // Back
            [0, 3, 2],
            [0, 2, 1],
            // Top
            [3, 7, 6],
            [3, 6, 2],
            // Bottom
            [0, 1, 5],
            [0, 5, 4],
            // Right
            [1, 2, 6],
            [1, 6, 5],
            // Left
            [0, 4, 7],
            [0, 7, 3],
        ];
        Self::from_indices(vertices, &indices)
    }

    /// Regular octahedron with vertices on the axes at `radius`.
    pub fn octahedron(radius: f64) -> Self {
        let r = radius;
        let vertices = vec![
            Point3::new(r, 0.0, 0.0),
            Point3::new(-r, 0.0, 0.0),
            Point3::new(0.0, r, 0.0),
            Point3::new(0.0, -r, 0.0),
            Point3::new(0.0, 0.0, r),
            Point3::new(0.0, 0.0, -r),
        ];
        let indices = [
            [0, 2, 4],
            [1, 4, 2],
            [0, 4, 3],
            [1, 3, 4],
            [0, 5, 2],
            [1, 2, 5],
            [0, 3, 5],
            [1, 5, 3],
        ];
        Self::from_indices(vertices, &indices)
    }
}
