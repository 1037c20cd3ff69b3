//! Part value objects
//!
//! A `Part` is a named geometry plus free-form numeric annotations. Parts
//! are immutable values: every transform produces a new Part and leaves
//! the original untouched.

use std::collections::HashMap;

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CadResult;
use crate::geometry::GeometryData;
use crate::mesh::{Axis, TriangleMesh};

/// A named, immutable geometric value object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: Uuid,
    pub name: String,
    /// The part's geometry; owned exclusively by this part
    pub geometry: GeometryData,
    /// Free-form user annotations, not constraint variables
    pub parameters: HashMap<String, f64>,
}

impl Part {
    /// Create a part from existing geometry
    pub fn new(name: impl Into<String>, geometry: GeometryData) -> Self {
        let parameters = geometry.parameters.clone();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            geometry,
            parameters,
        }
    }

    /// Create a box primitive; all dimensions must be positive and finite
    pub fn boxed(width: f64, height: f64, depth: f64) -> CadResult<Self> {
        Ok(Self::new("Box", GeometryData::boxed(width, height, depth)?))
    }

    /// Create a cylinder primitive; radius and height must be positive
    /// and finite
    pub fn cylinder(radius: f64, height: f64) -> CadResult<Self> {
        Ok(Self::new("Cylinder", GeometryData::cylinder(radius, height)?))
    }

    /// Create a UV sphere primitive
    pub fn sphere(radius: f64) -> CadResult<Self> {
        Ok(Self::new("Sphere", GeometryData::sphere(radius)?))
    }

    /// The part's triangle mesh
    pub fn mesh(&self) -> &TriangleMesh {
        &self.geometry.mesh
    }

    /// Translate, returning a new part
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Part {
        self.with_geometry(self.geometry.translated(x, y, z))
    }

    /// Rotate about a principal axis by a signed angle in radians,
    /// returning a new part
    pub fn rotate(&self, angle: f64, axis: Axis) -> Part {
        self.with_geometry(self.geometry.rotated(axis, angle))
    }

    /// Apply an arbitrary affine transform, returning a new part
    pub fn transformed(&self, matrix: &DMat4) -> Part {
        self.with_geometry(self.geometry.transformed(matrix))
    }

    /// Deep copy as an independent part (fresh id)
    pub fn clone_part(&self) -> Part {
        Part {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Axis-aligned bounding box of the part's mesh
    pub fn bounding_box(&self) -> Option<(DVec3, DVec3)> {
        self.geometry.mesh.bounding_box()
    }

    /// Enclosed volume of the part's mesh
    pub fn volume(&self) -> f64 {
        self.geometry.mesh.volume()
    }

    fn with_geometry(&self, geometry: GeometryData) -> Part {
        Part {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            geometry,
            parameters: self.parameters.clone(),
        }
    }
}
