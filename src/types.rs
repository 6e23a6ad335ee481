//! Core types for the arbor directory-tree mirror.

use serde::{Deserialize, Serialize};

/// NodeId: index of a node slot in the tree arena.
///
/// Ids stay valid for the lifetime of the tree; deleted nodes keep their slot
/// and report themselves as inert rather than dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Index of this id in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}
