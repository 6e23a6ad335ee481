//! Storage-access service boundary.
//!
//! The tree never touches the filesystem directly; every physical read, write,
//! move, and delete goes through a [`ProjectIo`] implementation. `DiskIo` is
//! the real-filesystem backend, `MemoryIo` a deterministic in-memory backend
//! used by tests.

pub mod disk;
pub mod mem;

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Primitive storage operations consumed by the tree.
///
/// All operations are synchronous and may fail with a [`StorageError`], which
/// the tree propagates uncaught except where reconciliation explicitly
/// recovers (per-file load failures).
pub trait ProjectIo {
    /// Paths of the immediate subdirectories of `dir`.
    fn list_directories(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Paths of the immediate files of `dir`.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;

    fn create_directory(&self, path: &Path) -> Result<(), StorageError>;

    fn create_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError>;

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError>;

    /// Relocate a file or an entire directory subtree.
    fn move_path(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Delete a file or an entire directory subtree.
    fn delete(&self, path: &Path) -> Result<(), StorageError>;

    /// Raw file content; implementations may serve this from a cache.
    fn read_raw(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Text file content; implementations may serve this from a cache.
    fn read_text(&self, path: &Path) -> Result<String, StorageError>;

    /// Absolute form of `path`.
    fn absolute_path(&self, path: &Path) -> Result<PathBuf, StorageError>;

    /// Display name for the tree root.
    fn root_name(&self) -> String;

    /// Reveal `path` in the platform file browser.
    fn open_in_explorer(&self, path: &Path) -> Result<(), StorageError>;
}
