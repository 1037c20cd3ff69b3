//! Global constants for lathe-core

/// Default number of segments for cylinder tessellation
pub const CYLINDER_SEGMENTS: u32 = 32;

/// Default number of latitude rings for sphere tessellation
pub const SPHERE_RINGS: u32 = 16;

/// Default number of longitude segments for sphere tessellation
pub const SPHERE_SEGMENTS: u32 = 32;

/// Default depth of a document's undo/redo history
pub const HISTORY_DEPTH: usize = 128;

/// Vertex comparison precision when re-indexing meshes
/// (multiply by this, then round to int)
pub const VERTEX_PRECISION: f64 = 1.0e9;

/// Plane-side classification tolerance for the BSP engine
pub const PLANE_EPSILON: f64 = 1.0e-5;
