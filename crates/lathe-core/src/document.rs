//! Documents: ordered parts plus bounded undo/redo history
//!
//! History entries are reverse edits, not snapshots of the whole document:
//! each entry owns only what it needs to undo one mutation. Both stacks are
//! bounded; exceeding the cap discards the oldest entry.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::brep;
use crate::constants::HISTORY_DEPTH;
use crate::error::{CadError, CadResult};
use crate::mesh::TriangleMesh;
use crate::part::Part;
use crate::stl;

/// A recorded reverse operation for one mutation. Applying an edit yields
/// its own inverse, which feeds the opposite stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Edit {
    /// Re-insert a removed part at its old index
    Insert { index: usize, part: Part },
    /// Remove the part added at this index
    Remove { index: usize },
    /// Put the previous part back at this index
    Replace { index: usize, part: Part },
}

/// A mutable, history-bearing container of parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    parts: Vec<Part>,
    history: VecDeque<Edit>,
    redo: VecDeque<Edit>,
    capacity: usize,
}

impl Document {
    /// Create an empty document with the default history depth
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, HISTORY_DEPTH)
    }

    /// Create an empty document with a custom history depth
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
            history: VecDeque::new(),
            redo: VecDeque::new(),
            capacity,
        }
    }

    /// The parts, in insertion order
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Get a part by index
    pub fn get_part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Find the first part with the given name
    pub fn find_part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Append a part
    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
        self.push_history(Edit::Remove {
            index: self.parts.len() - 1,
        });
        self.redo.clear();
    }

    /// Remove the part at `index`. Returns false if the index is out of
    /// range.
    pub fn remove_part(&mut self, index: usize) -> bool {
        if index >= self.parts.len() {
            return false;
        }
        let part = self.parts.remove(index);
        self.push_history(Edit::Insert { index, part });
        self.redo.clear();
        true
    }

    /// Swap in a new part at `index`. Returns false if the index is out of
    /// range.
    pub fn replace_part(&mut self, index: usize, part: Part) -> bool {
        if index >= self.parts.len() {
            return false;
        }
        let old = std::mem::replace(&mut self.parts[index], part);
        self.push_history(Edit::Replace { index, part: old });
        self.redo.clear();
        true
    }

    /// Undo the most recent mutation. Returns false if there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(edit) = self.history.pop_back() else {
            return false;
        };
        let inverse = self.apply(edit);
        push_bounded(&mut self.redo, inverse, self.capacity);
        true
    }

    /// Redo the most recently undone mutation. Returns false if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.redo.pop_back() else {
            return false;
        };
        let inverse = self.apply(edit);
        push_bounded(&mut self.history, inverse, self.capacity);
        true
    }

    /// Concatenate all parts' meshes into one, offsetting face indices by
    /// the running vertex count.
    pub fn get_mesh_data(&self) -> TriangleMesh {
        let mut combined = TriangleMesh::new();
        for part in &self.parts {
            combined.merge(part.mesh());
        }
        combined
    }

    /// Export the document in the named format, producing the encoded
    /// bytes. The caller chooses the filesystem destination.
    pub fn export(&self, format: &str) -> CadResult<Vec<u8>> {
        match format {
            "STL" => stl::encode(&self.get_mesh_data()),
            "STEP" => {
                let backend = brep::default_backend();
                brep::export_step(&self.parts, backend.as_ref())
            }
            other => Err(CadError::UnsupportedFormat(other.to_string())),
        }
    }

    fn push_history(&mut self, edit: Edit) {
        push_bounded(&mut self.history, edit, self.capacity);
    }

    /// Apply a reverse edit and return its inverse
    fn apply(&mut self, edit: Edit) -> Edit {
        match edit {
            Edit::Insert { index, part } => {
                self.parts.insert(index, part);
                Edit::Remove { index }
            }
            Edit::Remove { index } => {
                let part = self.parts.remove(index);
                Edit::Insert { index, part }
            }
            Edit::Replace { index, part } => {
                let old = std::mem::replace(&mut self.parts[index], part);
                Edit::Replace { index, part: old }
            }
        }
    }
}

fn push_bounded(stack: &mut VecDeque<Edit>, edit: Edit, capacity: usize) {
    if stack.len() == capacity {
        stack.pop_front();
    }
    stack.push_back(edit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(name: &str) -> Part {
        let mut part = Part::boxed(1.0, 1.0, 1.0).unwrap();
        part.name = name.to_string();
        part
    }

    #[test]
    fn test_add_and_lookup() {
        let mut doc = Document::new("doc");
        doc.add_part(cube("a"));
        doc.add_part(cube("b"));
        assert_eq!(doc.parts().len(), 2);
        assert_eq!(doc.get_part(1).unwrap().name, "b");
        assert!(doc.get_part(2).is_none());
        assert_eq!(doc.find_part("a").unwrap().name, "a");
    }

    #[test]
    fn test_undo_empty_returns_false() {
        let mut doc = Document::new("doc");
        assert!(!doc.undo());
        assert!(!doc.redo());
    }

    #[test]
    fn test_remove_undo_redo_scenario() {
        // Add three parts, remove the middle one, undo twice, redo once
        let mut doc = Document::new("doc");
        doc.add_part(cube("p0"));
        doc.add_part(cube("p1"));
        doc.add_part(cube("p2"));
        assert!(doc.remove_part(1));

        assert!(doc.undo()); // un-remove p1
        assert!(doc.undo()); // un-add p2
        let names: Vec<_> = doc.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p0", "p1"]);

        assert!(doc.redo()); // re-add p2
        assert!(doc.redo()); // re-remove p1
        let names: Vec<_> = doc.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p0", "p2"]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut doc = Document::new("doc");
        let initial: Vec<String> = Vec::new();

        doc.add_part(cube("a"));
        doc.add_part(cube("b"));
        doc.add_part(cube("c"));
        assert!(doc.replace_part(1, cube("b2")));
        assert!(doc.remove_part(0));
        let end: Vec<_> = doc.parts().iter().map(|p| p.name.clone()).collect();

        for _ in 0..5 {
            assert!(doc.undo());
        }
        let names: Vec<_> = doc.parts().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, initial);

        for _ in 0..5 {
            assert!(doc.redo());
        }
        let names: Vec<_> = doc.parts().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, end);
    }

    #[test]
    fn test_forward_mutation_clears_redo() {
        let mut doc = Document::new("doc");
        doc.add_part(cube("a"));
        doc.add_part(cube("b"));
        assert!(doc.undo());
        doc.add_part(cube("c"));
        assert!(!doc.redo());
        let names: Vec<_> = doc.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut doc = Document::with_capacity("doc", 2);
        doc.add_part(cube("a"));
        doc.add_part(cube("b"));
        doc.add_part(cube("c"));
        // Oldest entry was discarded: only two undos are possible
        assert!(doc.undo());
        assert!(doc.undo());
        assert!(!doc.undo());
        assert_eq!(doc.parts().len(), 1);
    }

    #[test]
    fn test_out_of_range_mutations_fail() {
        let mut doc = Document::new("doc");
        doc.add_part(cube("a"));
        assert!(!doc.remove_part(3));
        assert!(!doc.replace_part(1, cube("x")));
        // Failed mutations record no history
        assert!(doc.undo());
        assert!(!doc.undo());
    }

    #[test]
    fn test_combined_mesh_offsets() {
        let mut doc = Document::new("doc");
        doc.add_part(cube("a"));
        doc.add_part(Part::boxed(1.0, 1.0, 1.0).unwrap().translate(5.0, 0.0, 0.0));
        let combined = doc.get_mesh_data();
        assert_eq!(combined.vertex_count(), 16);
        assert_eq!(combined.triangle_count(), 24);
        assert!((combined.volume() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_unknown_format() {
        let doc = Document::new("doc");
        assert!(matches!(
            doc.export("OBJ"),
            Err(CadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            doc.export("DXF"),
            Err(CadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            doc.export("JSON"),
            Err(CadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            doc.export("gltf"),
            Err(CadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_export_step_without_backend() {
        let mut doc = Document::new("doc");
        doc.add_part(cube("a"));
        assert!(matches!(
            doc.export("STEP"),
            Err(CadError::BackendUnavailable(_))
        ));
    }
}
