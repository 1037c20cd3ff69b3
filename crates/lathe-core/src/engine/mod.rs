//! Boolean engine abstraction
//!
//! Booleans are defined by contract (commutative union, neutral elements,
//! validated output) rather than by a particular algorithm. `BooleanEngine`
//! is the seam: backends can be substituted without changing the core
//! surface. The default engine is the in-tree BSP implementation.

mod bsp;

use serde::{Deserialize, Serialize};

use crate::error::CadResult;
use crate::mesh::TriangleMesh;

/// Regularized boolean operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    /// Lower-case operation name, used in derived part names
    pub fn name(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
        }
    }
}

/// A polyhedral boolean backend over triangle meshes
pub trait BooleanEngine: Send + Sync {
    /// Name of this engine
    fn name(&self) -> &str;

    /// Check if the engine can be used
    fn is_available(&self) -> bool;

    /// Compute `op` over two triangulated solids. The result may be empty
    /// (the regularized empty set); a non-empty result must be a valid
    /// triangle mesh.
    fn boolean(&self, op: BooleanOp, a: &TriangleMesh, b: &TriangleMesh)
        -> CadResult<TriangleMesh>;
}

/// BSP-tree CSG engine (csg.js clip/invert recipes)
#[derive(Debug, Default)]
pub struct BspEngine;

impl BspEngine {
    pub fn new() -> Self {
        Self
    }
}

impl BooleanEngine for BspEngine {
    fn name(&self) -> &str {
        "bsp"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn boolean(
        &self,
        op: BooleanOp,
        a: &TriangleMesh,
        b: &TriangleMesh,
    ) -> CadResult<TriangleMesh> {
        // Empty operands resolve by the set-theoretic identities
        match op {
            BooleanOp::Union => {
                if a.is_empty() {
                    return Ok(b.clone());
                }
                if b.is_empty() {
                    return Ok(a.clone());
                }
            }
            BooleanOp::Difference => {
                if a.is_empty() {
                    return Ok(TriangleMesh::new());
                }
                if b.is_empty() {
                    return Ok(a.clone());
                }
            }
            BooleanOp::Intersection => {
                if a.is_empty() || b.is_empty() {
                    return Ok(TriangleMesh::new());
                }
            }
        }

        // Disjoint bounding boxes short-circuit the tree passes
        if !boxes_overlap(a, b) {
            match op {
                BooleanOp::Union => {
                    let mut merged = a.clone();
                    merged.merge(b);
                    return Ok(merged);
                }
                BooleanOp::Difference => return Ok(a.clone()),
                BooleanOp::Intersection => return Ok(TriangleMesh::new()),
            }
        }

        let mut tree_a = bsp::BspNode::new(bsp::mesh_to_polygons(a));
        let mut tree_b = bsp::BspNode::new(bsp::mesh_to_polygons(b));

        match op {
            BooleanOp::Union => {
                tree_a.clip_to(&tree_b);
                tree_b.clip_to(&tree_a);
                tree_b.invert();
                tree_b.clip_to(&tree_a);
                tree_b.invert();
                tree_a.build(tree_b.all_polygons());
            }
            BooleanOp::Difference => {
                tree_a.invert();
                tree_a.clip_to(&tree_b);
                tree_b.clip_to(&tree_a);
                tree_b.invert();
                tree_b.clip_to(&tree_a);
                tree_b.invert();
                tree_a.build(tree_b.all_polygons());
                tree_a.invert();
            }
            BooleanOp::Intersection => {
                tree_a.invert();
                tree_b.clip_to(&tree_a);
                tree_b.invert();
                tree_a.clip_to(&tree_b);
                tree_b.clip_to(&tree_a);
                tree_a.build(tree_b.all_polygons());
                tree_a.invert();
            }
        }

        Ok(bsp::polygons_to_mesh(&tree_a.all_polygons()))
    }
}

fn boxes_overlap(a: &TriangleMesh, b: &TriangleMesh) -> bool {
    let (Some((min_a, max_a)), Some((min_b, max_b))) =
        (a.bounding_box(), b.bounding_box())
    else {
        return false;
    };
    min_a.x <= max_b.x
        && max_a.x >= min_b.x
        && min_a.y <= max_b.y
        && max_a.y >= min_b.y
        && min_a.z <= max_b.z
        && max_a.z >= min_b.z
}

/// The engine used by the boolean operations on Parts
pub fn default_engine() -> Box<dyn BooleanEngine> {
    Box::new(BspEngine::new())
}
