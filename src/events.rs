//! Structural change notifications.
//!
//! Every structural operation runs a preview phase before any physical I/O
//! and a commit phase after it succeeds. Observers may veto during preview;
//! commit and refresh notifications are fire-and-forget so an observer can
//! never mask an operation that already happened.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Payload describing a structural change to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeChange {
    Created {
        path: PathBuf,
    },
    Renamed {
        from: PathBuf,
        to: PathBuf,
    },
    Moved {
        from: PathBuf,
        to: PathBuf,
    },
    Deleted {
        path: PathBuf,
    },
    Modified {
        path: PathBuf,
        old: Vec<u8>,
        new: Vec<u8>,
    },
}

impl NodeChange {
    /// Path of the node after the change applies.
    pub fn path(&self) -> &Path {
        match self {
            NodeChange::Created { path }
            | NodeChange::Deleted { path }
            | NodeChange::Modified { path, .. } => path,
            NodeChange::Renamed { to, .. } | NodeChange::Moved { to, .. } => to,
        }
    }
}

/// Observer of tree mutations, e.g. a UI layer.
///
/// Default implementations accept everything and ignore notifications, so an
/// observer only overrides the hooks it cares about.
pub trait TreeObserver {
    /// Inspect a pending change. Returning `Err` vetoes the operation before
    /// any physical I/O runs; the message surfaces as `TreeError::Vetoed`.
    fn preview(&mut self, change: &NodeChange) -> Result<(), String> {
        let _ = change;
        Ok(())
    }

    /// A change was applied physically and in memory.
    fn committed(&mut self, change: &NodeChange) {
        let _ = change;
    }

    /// A folder finished reconciling its children against storage.
    fn refreshed(&mut self, folder: &Path) {
        let _ = folder;
    }
}
