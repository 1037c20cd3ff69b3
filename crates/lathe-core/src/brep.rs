//! Boundary-representation export adapter
//!
//! Translates triangle meshes into the vocabulary an external BRep writer
//! consumes: every triangle becomes a planar face bounded by three edges
//! over three vertex points, faces are grouped into one compound per part.
//! The writer itself is an external collaborator behind `BrepBackend`;
//! without one, STEP export fails loudly instead of falling back.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{CadError, CadResult};
use crate::part::Part;

/// STEP application protocol handed to the external writer
pub const STEP_SCHEMA: &str = "AP214";

/// A straight edge between two vertex points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrepEdge {
    pub start: DVec3,
    pub end: DVec3,
}

/// A planar triangular face bounded by three edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrepFace {
    pub points: [DVec3; 3],
}

impl BrepFace {
    /// The face's bounding edges, in winding order
    pub fn edges(&self) -> [BrepEdge; 3] {
        let [a, b, c] = self.points;
        [
            BrepEdge { start: a, end: b },
            BrepEdge { start: b, end: c },
            BrepEdge { start: c, end: a },
        ]
    }
}

/// A named collection of faces, one per part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrepCompound {
    pub name: String,
    pub faces: Vec<BrepFace>,
}

/// Build the compound handed to the BRep writer for one part
pub fn compound_from_part(part: &Part) -> BrepCompound {
    let mesh = part.mesh();
    let faces = mesh
        .faces
        .iter()
        .map(|&[a, b, c]| BrepFace {
            points: [
                mesh.vertices[a as usize],
                mesh.vertices[b as usize],
                mesh.vertices[c as usize],
            ],
        })
        .collect();
    BrepCompound {
        name: part.name.clone(),
        faces,
    }
}

/// An external boundary-representation writer
pub trait BrepBackend: Send + Sync {
    /// Name of this backend
    fn name(&self) -> &str;

    /// Check if the backend can be used
    fn is_available(&self) -> bool;

    /// Serialize the compounds under the given schema, yielding an opaque
    /// byte stream
    fn write(&self, compounds: &[BrepCompound], schema: &str) -> CadResult<Vec<u8>>;
}

/// Placeholder backend used when no BRep writer is linked in
#[derive(Debug, Default)]
pub struct NullBackend;

impl BrepBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn write(&self, _compounds: &[BrepCompound], _schema: &str) -> CadResult<Vec<u8>> {
        Err(CadError::BackendUnavailable(
            "no BRep writer backend available".into(),
        ))
    }
}

/// The backend used by document STEP export
pub fn default_backend() -> Box<dyn BrepBackend> {
    Box::new(NullBackend)
}

/// Export parts as STEP through the given backend
pub fn export_step(parts: &[Part], backend: &dyn BrepBackend) -> CadResult<Vec<u8>> {
    if !backend.is_available() {
        return Err(CadError::BackendUnavailable(format!(
            "BRep backend '{}' is not available",
            backend.name()
        )));
    }
    let compounds: Vec<BrepCompound> = parts.iter().map(compound_from_part).collect();
    backend.write(&compounds, STEP_SCHEMA)
}
