//! Reconciliation: make a folder's in-memory children match the live
//! storage listing with minimal disruption to existing node identities.
//!
//! Folders are handled before files, and matched folders refresh recursively,
//! so refreshing the root reconciles the entire tree depth-first. A file that
//! fails to load is logged and skipped; one bad file never aborts its folder.

use crate::error::TreeError;
use crate::factory::NodeFactory;
use crate::storage::ProjectIo;
use crate::tree::{same_path, Tree};
use crate::types::NodeId;
use tracing::{debug, warn};

impl<IO: ProjectIo, F: NodeFactory> Tree<IO, F> {
    pub(crate) fn reconcile(&mut self, folder: NodeId) -> Result<(), TreeError> {
        let dir = self.nodes[folder.0].path.clone();

        let listed_dirs = self.io.list_directories(&dir)?;

        // Stale folders out first: anything we mirror that storage no longer
        // reports is destroyed (marked inert, detached).
        for child in self.nodes[folder.0].children().to_vec() {
            if !self.nodes[child.0].is_folder() {
                continue;
            }
            let still_there = listed_dirs
                .iter()
                .any(|listed| same_path(listed, &self.nodes[child.0].path));
            if !still_there {
                self.mark_stale(folder, child);
            }
        }

        // Matched folders refresh in place; unmatched paths become new nodes,
        // loading their own subtrees during construction.
        for listed in &listed_dirs {
            match self.kind_child_at(folder, listed, true) {
                Some(existing) => self.refresh(existing)?,
                None => {
                    self.insert_folder(folder, listed.clone())?;
                }
            }
        }

        let listed_files = self.io.list_files(&dir)?;

        for child in self.nodes[folder.0].children().to_vec() {
            if self.nodes[child.0].is_folder() {
                continue;
            }
            let still_there = listed_files
                .iter()
                .any(|listed| same_path(listed, &self.nodes[child.0].path));
            if !still_there {
                self.mark_stale(folder, child);
            }
        }

        for listed in &listed_files {
            if self.kind_child_at(folder, listed, false).is_some() {
                continue;
            }
            // Sole locally-recovered failure: log and keep loading the rest.
            if let Err(err) = self.insert_file(folder, listed.clone()) {
                warn!(
                    path = %listed.display(),
                    error = %err,
                    "skipping file during reconciliation"
                );
            }
        }

        debug!(
            dir = %dir.display(),
            dirs = listed_dirs.len(),
            files = listed_files.len(),
            "reconciled folder"
        );
        Ok(())
    }
}
