//! Tree node representation.

use crate::types::NodeId;
use std::path::{Path, PathBuf};

/// Node variant: a leaf file or a folder owning ordered children.
#[derive(Debug, Clone)]
pub enum NodeKind {
    File,
    Folder {
        /// Child ids in insertion order.
        children: Vec<NodeId>,
        /// Set only on the tree root; immutable after construction.
        is_root: bool,
    },
}

/// One slot in the tree arena.
///
/// The parent reference is a plain index, never an owning link; the arena
/// owns every node and a deleted node keeps its slot, flagged inert.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) path: PathBuf,
    pub(crate) parent: Option<NodeId>,
    pub(crate) deleted: bool,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn file(path: PathBuf) -> Self {
        Node {
            path,
            parent: None,
            deleted: false,
            kind: NodeKind::File,
        }
    }

    pub fn folder(path: PathBuf, is_root: bool) -> Self {
        Node {
            path,
            parent: None,
            deleted: false,
            kind: NodeKind::Folder {
                children: Vec::new(),
                is_root,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { is_root: true, .. })
    }

    /// Last path segment.
    pub fn leaf_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Folder { children, .. } => children,
            NodeKind::File => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Folder { children, .. } => Some(children),
            NodeKind::File => None,
        }
    }
}
