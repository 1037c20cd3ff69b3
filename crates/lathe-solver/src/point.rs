//! Solver variable handles

use serde::{Deserialize, Serialize};

/// Handle to a solver point.
///
/// Each point owns three consecutive scalar unknowns (x, y, z) in the
/// solver's variable vector; handles are only valid for the solver that
/// created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointVar(pub(crate) usize);

impl PointVar {
    /// Insertion-order index of this point
    pub fn index(&self) -> usize {
        self.0
    }

    /// Offset of this point's x component in the variable vector
    pub(crate) fn base(&self) -> usize {
        self.0 * 3
    }
}
