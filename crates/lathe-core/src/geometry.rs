//! Geometry descriptors
//!
//! `GeometryData` pairs an authoritative triangle mesh with advisory
//! analytical metadata. The metadata survives proper rigid motions only;
//! scaling, shear, reflection and boolean composition collapse the kind
//! to `Mesh` and clear the parameters.

use std::collections::HashMap;

use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::constants::{CYLINDER_SEGMENTS, SPHERE_RINGS, SPHERE_SEGMENTS};
use crate::error::CadResult;
use crate::mesh::{Axis, TriangleMesh};
use crate::primitive;

/// Analytical kind of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Axis-aligned box, centered at origin
    Box { width: f64, height: f64, depth: f64 },
    /// Cylinder along +Z, centered at origin
    Cylinder { radius: f64, height: f64 },
    /// UV sphere centered at origin
    Sphere { radius: f64 },
    /// Shape carried entirely by the mesh
    Mesh,
}

/// A triangle mesh plus advisory analytical metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryData {
    /// Analytical kind; advisory for downstream readers
    pub kind: PrimitiveKind,
    /// Named primitive parameters; advisory, mirrors `kind`
    pub parameters: HashMap<String, f64>,
    /// The authoritative geometric state
    pub mesh: TriangleMesh,
}

impl GeometryData {
    /// Build box geometry with the default tessellation
    pub fn boxed(width: f64, height: f64, depth: f64) -> CadResult<Self> {
        let mesh = primitive::box_mesh(width, height, depth)?;
        Ok(Self {
            kind: PrimitiveKind::Box {
                width,
                height,
                depth,
            },
            parameters: HashMap::from([
                ("width".to_string(), width),
                ("height".to_string(), height),
                ("depth".to_string(), depth),
            ]),
            mesh,
        })
    }

    /// Build cylinder geometry with the default circular resolution
    pub fn cylinder(radius: f64, height: f64) -> CadResult<Self> {
        let mesh = primitive::cylinder_mesh(radius, height, CYLINDER_SEGMENTS)?;
        Ok(Self {
            kind: PrimitiveKind::Cylinder { radius, height },
            parameters: HashMap::from([
                ("radius".to_string(), radius),
                ("height".to_string(), height),
            ]),
            mesh,
        })
    }

    /// Build sphere geometry with the default UV resolution
    pub fn sphere(radius: f64) -> CadResult<Self> {
        let mesh = primitive::sphere_mesh(radius, SPHERE_RINGS, SPHERE_SEGMENTS)?;
        Ok(Self {
            kind: PrimitiveKind::Sphere { radius },
            parameters: HashMap::from([("radius".to_string(), radius)]),
            mesh,
        })
    }

    /// Wrap a mesh with no analytical metadata
    pub fn from_mesh(mesh: TriangleMesh) -> Self {
        Self {
            kind: PrimitiveKind::Mesh,
            parameters: HashMap::new(),
            mesh,
        }
    }

    /// Apply an affine transform.
    ///
    /// A proper rigid motion keeps `kind` and `parameters`; anything else
    /// (scale, shear, reflection) demotes the geometry to `Mesh`.
    pub fn transformed(&self, matrix: &DMat4) -> GeometryData {
        let mesh = self.mesh.transformed(matrix);
        if is_proper_rigid(matrix) {
            GeometryData {
                kind: self.kind,
                parameters: self.parameters.clone(),
                mesh,
            }
        } else {
            GeometryData::from_mesh(mesh)
        }
    }

    /// Translate by (dx, dy, dz); always rigid
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> GeometryData {
        self.transformed(&DMat4::from_translation(glam::DVec3::new(dx, dy, dz)))
    }

    /// Rotate about a principal axis by a signed angle in radians
    pub fn rotated(&self, axis: Axis, angle: f64) -> GeometryData {
        self.transformed(&axis.rotation(angle))
    }
}

/// True if the linear part of `matrix` is orthonormal with positive
/// determinant (rotation + translation only).
fn is_proper_rigid(matrix: &DMat4) -> bool {
    const TOL: f64 = 1e-9;
    let m = glam::DMat3::from_mat4(*matrix);
    if m.determinant() <= 0.0 {
        return false;
    }
    let gram = m.transpose() * m;
    let err = (gram - glam::DMat3::IDENTITY).to_cols_array();
    err.iter().all(|e| e.abs() < TOL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_rigid_transform_keeps_metadata() {
        let geom = GeometryData::boxed(2.0, 2.0, 2.0).unwrap();
        let moved = geom
            .translated(1.0, 2.0, 3.0)
            .rotated(Axis::Z, 0.5);
        assert!(matches!(moved.kind, PrimitiveKind::Box { .. }));
        assert_eq!(moved.parameters.len(), 3);
    }

    #[test]
    fn test_scale_collapses_metadata() {
        let geom = GeometryData::cylinder(1.0, 2.0).unwrap();
        let scaled = geom.transformed(&DMat4::from_scale(DVec3::splat(2.0)));
        assert_eq!(scaled.kind, PrimitiveKind::Mesh);
        assert!(scaled.parameters.is_empty());
    }

    #[test]
    fn test_reflection_collapses_metadata() {
        let geom = GeometryData::boxed(1.0, 1.0, 1.0).unwrap();
        let mirrored = geom.transformed(&DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0)));
        assert_eq!(mirrored.kind, PrimitiveKind::Mesh);
    }
}
