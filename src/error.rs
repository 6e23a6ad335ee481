//! Error taxonomy for tree and storage operations.

use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a storage-access service implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by tree operations.
///
/// Duplicate insertion is not part of this taxonomy: inserting a node whose
/// path or name collides with an existing sibling is silently rejected and
/// surfaces as `Ok(None)` / `Ok(false)` from the insertion APIs.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Operation attempted on an inert (already deleted) node.
    #[error("node has been deleted: {}", .0.display())]
    DeletedNode(PathBuf),

    /// The id does not refer to any slot in this tree.
    #[error("unknown node id {0:?}")]
    UnknownNode(NodeId),

    /// Rename target is empty or contains a path separator.
    #[error("invalid name {0:?}: must be non-empty and contain no path separators")]
    InvalidRename(String),

    /// A folder cannot be inserted into its own child collection.
    #[error("cannot insert a folder into itself")]
    RecursiveFolder,

    /// The tree root never has a parent.
    #[error("the tree root cannot be attached to a folder")]
    RootAttach,

    /// Operation requires a folder node.
    #[error("not a folder: {}", .0.display())]
    NotAFolder(PathBuf),

    /// Operation requires a file node.
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// A physical move failed; in-memory state is unchanged.
    #[error("move from {} to {} failed", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: StorageError,
    },

    /// Underlying storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An observer rejected the operation during the preview phase.
    #[error("operation vetoed: {0}")]
    Vetoed(String),
}
