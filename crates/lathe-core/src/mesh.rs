//! Indexed triangle mesh kernel
//!
//! The authoritative geometric representation inside the core. Meshes are
//! indexed triangle lists; closed solids are expected to be manifold and
//! orientation-consistent (outward-facing, right-hand rule).

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CadError, CadResult};

/// A principal axis for rotation transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Rotation matrix about this axis by a signed angle in radians
    /// (right-hand rule)
    pub fn rotation(self, angle: f64) -> DMat4 {
        match self {
            Axis::X => DMat4::from_rotation_x(angle),
            Axis::Y => DMat4::from_rotation_y(angle),
            Axis::Z => DMat4::from_rotation_z(angle),
        }
    }
}

/// An indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions
    pub vertices: Vec<DVec3>,
    /// Triangular faces as vertex indices (0-based, counter-clockwise
    /// from outside)
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertex and face lists
    pub fn from_parts(vertices: Vec<DVec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Check if the mesh has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Structural validation: at least one vertex and face, all indices in
    /// range, no face with repeated indices.
    ///
    /// Manifoldness and closure are checked but not required: a mesh that
    /// fails them is logged and accepted.
    pub fn validate(&self) -> CadResult<()> {
        if self.vertices.is_empty() {
            return Err(CadError::InvalidMesh("mesh has no vertices".into()));
        }
        if self.faces.is_empty() {
            return Err(CadError::InvalidMesh("mesh has no faces".into()));
        }

        let n = self.vertices.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&idx| idx >= n) {
                return Err(CadError::InvalidMesh(format!(
                    "face {} references vertex out of range (vertex count {})",
                    i, n
                )));
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(CadError::InvalidMesh(format!(
                    "face {} has repeated vertex indices",
                    i
                )));
            }
        }

        if !self.is_closed_manifold() {
            tracing::warn!(
                faces = self.faces.len(),
                "mesh is not a closed orientable manifold; proceeding"
            );
        }

        Ok(())
    }

    /// Check that every edge is shared by exactly two faces with opposite
    /// orientation.
    pub fn is_closed_manifold(&self) -> bool {
        let mut edges: HashMap<(u32, u32), i32> = HashMap::new();
        for face in &self.faces {
            for k in 0..3 {
                let a = face[k];
                let b = face[(k + 1) % 3];
                // Count a->b as +1 and b->a as -1 on the undirected key
                let (key, delta) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
                *edges.entry(key).or_insert(0) += delta;
            }
        }
        // A closed orientable surface pairs every half-edge with its twin
        !edges.is_empty() && edges.values().all(|&count| count == 0)
    }

    /// Outward normal of face `i` from its winding; zero if degenerate
    pub fn face_normal(&self, i: usize) -> DVec3 {
        let [a, b, c] = self.faces[i];
        let a = self.vertices[a as usize];
        let b = self.vertices[b as usize];
        let c = self.vertices[c as usize];
        let n = (b - a).cross(c - a);
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            DVec3::ZERO
        }
    }

    /// Apply an affine transform, producing a new mesh.
    ///
    /// Vertices are transformed as points. An improper motion (negative
    /// determinant) reverses face winding so normals stay outward.
    pub fn transformed(&self, matrix: &DMat4) -> TriangleMesh {
        let vertices = self
            .vertices
            .iter()
            .map(|&v| matrix.transform_point3(v))
            .collect();

        let faces = if matrix.determinant() < 0.0 {
            self.faces.iter().map(|&[a, b, c]| [a, c, b]).collect()
        } else {
            self.faces.clone()
        };

        TriangleMesh { vertices, faces }
    }

    /// Translate by (dx, dy, dz)
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> TriangleMesh {
        self.transformed(&DMat4::from_translation(DVec3::new(dx, dy, dz)))
    }

    /// Rotate about a principal axis by a signed angle in radians
    pub fn rotated(&self, axis: Axis, angle: f64) -> TriangleMesh {
        self.transformed(&axis.rotation(angle))
    }

    /// Axis-aligned bounding box, or None for a mesh without vertices
    pub fn bounding_box(&self) -> Option<(DVec3, DVec3)> {
        let mut iter = self.vertices.iter();
        let first = *iter.next()?;
        let (mut min, mut max) = (first, first);
        for &v in iter {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Enclosed volume via the divergence theorem.
    ///
    /// Meaningful only for closed, outward-oriented meshes; each face
    /// contributes the signed volume of its tetrahedron to the origin.
    pub fn volume(&self) -> f64 {
        let mut total = 0.0;
        for face in &self.faces {
            let a = self.vertices[face[0] as usize];
            let b = self.vertices[face[1] as usize];
            let c = self.vertices[face[2] as usize];
            total += a.dot(b.cross(c)) / 6.0;
        }
        total
    }

    /// Append another mesh, offsetting its face indices by the running
    /// vertex count.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|&[a, b, c]| {
                [a + offset, b + offset, c + offset]
            }));
    }
}
