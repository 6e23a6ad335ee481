//! In-memory storage backend.
//!
//! Deterministic `ProjectIo` implementation backed by a path-keyed map.
//! Used by unit, scenario, and property tests; clones share the same state so
//! a test can mutate the "filesystem" behind a live tree.

use crate::error::StorageError;
use crate::storage::ProjectIo;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<PathBuf, Entry>,
    root_name: String,
    opened: Vec<PathBuf>,
}

/// Shared-state in-memory `ProjectIo`.
#[derive(Debug, Clone, Default)]
pub struct MemoryIo {
    state: Arc<Mutex<State>>,
}

/// Treat `./x` and `x` as the same path.
fn norm(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

impl MemoryIo {
    pub fn new(root_name: impl Into<String>) -> Self {
        let io = MemoryIo::default();
        io.state.lock().root_name = root_name.into();
        io
    }

    /// Seed a directory entry without going through the service contract.
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.state.lock().entries.insert(path.into(), Entry::Dir);
    }

    /// Seed a file entry without going through the service contract.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .entries
            .insert(path.into(), Entry::File(content.into()));
    }

    /// Drop an entry, simulating an external change behind the tree's back.
    pub fn remove(&self, path: &Path) {
        self.state.lock().entries.remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().entries.contains_key(path)
    }

    pub fn content(&self, path: &Path) -> Option<Vec<u8>> {
        match self.state.lock().entries.get(path) {
            Some(Entry::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Paths handed to `open_in_explorer`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.lock().opened.clone()
    }

    fn list(&self, dir: &Path, want_dirs: bool) -> Vec<PathBuf> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .filter(|(path, entry)| {
                let is_dir = matches!(entry, Entry::Dir);
                is_dir == want_dirs
                    && path
                        .parent()
                        .map(|parent| norm(parent) == norm(dir))
                        .unwrap_or(false)
            })
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl ProjectIo for MemoryIo {
    fn list_directories(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        Ok(self.list(dir, true))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        Ok(self.list(dir, false))
    }

    fn create_directory(&self, path: &Path) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if let Some(Entry::File(_)) = state.entries.get(path) {
            return Err(StorageError::AlreadyExists(path.to_path_buf()));
        }
        state.entries.insert(path.to_path_buf(), Entry::Dir);
        Ok(())
    }

    fn create_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        self.write_file(path, content)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if let Some(Entry::Dir) = state.entries.get(path) {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
                reason: "is a directory".to_string(),
            });
        }
        state
            .entries
            .insert(path.to_path_buf(), Entry::File(content.to_vec()));
        Ok(())
    }

    fn move_path(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if !state.entries.contains_key(from) {
            return Err(StorageError::NotFound(from.to_path_buf()));
        }
        if state.entries.contains_key(to) {
            return Err(StorageError::AlreadyExists(to.to_path_buf()));
        }
        if to.starts_with(from) {
            return Err(StorageError::InvalidPath {
                path: to.to_path_buf(),
                reason: "destination is inside the source".to_string(),
            });
        }
        // Relocate the entry itself and, for directories, everything under it.
        let moved: Vec<(PathBuf, Entry)> = state
            .entries
            .iter()
            .filter(|(path, _)| *path == from || path.starts_with(from))
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect();
        for (path, entry) in moved {
            state.entries.remove(&path);
            let relocated = match path.strip_prefix(from) {
                Ok(rest) if !rest.as_os_str().is_empty() => to.join(rest),
                _ => to.to_path_buf(),
            };
            state.entries.insert(relocated, entry);
        }
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let doomed: Vec<PathBuf> = state
            .entries
            .keys()
            .filter(|key| *key == path || key.starts_with(path))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        for key in doomed {
            state.entries.remove(&key);
        }
        Ok(())
    }

    fn read_raw(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match self.state.lock().entries.get(path) {
            Some(Entry::File(data)) => Ok(data.clone()),
            Some(Entry::Dir) => Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
                reason: "is a directory".to_string(),
            }),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }

    fn read_text(&self, path: &Path) -> Result<String, StorageError> {
        let raw = self.read_raw(path)?;
        String::from_utf8(raw).map_err(|err| StorageError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })
    }

    fn absolute_path(&self, path: &Path) -> Result<PathBuf, StorageError> {
        Ok(norm(path).to_path_buf())
    }

    fn root_name(&self) -> String {
        self.state.lock().root_name.clone()
    }

    fn open_in_explorer(&self, path: &Path) -> Result<(), StorageError> {
        self.state.lock().opened.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_single_level() {
        let io = MemoryIo::new("proj");
        io.add_dir("/p/sub");
        io.add_dir("/p/sub/deeper");
        io.add_file("/p/a.txt", "a");
        io.add_file("/p/sub/b.txt", "b");

        assert_eq!(
            io.list_directories(Path::new("/p")).unwrap(),
            vec![PathBuf::from("/p/sub")]
        );
        assert_eq!(
            io.list_files(Path::new("/p")).unwrap(),
            vec![PathBuf::from("/p/a.txt")]
        );
    }

    #[test]
    fn test_move_relocates_subtree() {
        let io = MemoryIo::new("proj");
        io.add_dir("/p/sub");
        io.add_file("/p/sub/b.txt", "b");

        io.move_path(Path::new("/p/sub"), Path::new("/p/sub2"))
            .unwrap();

        assert!(!io.contains(Path::new("/p/sub")));
        assert!(io.contains(Path::new("/p/sub2")));
        assert_eq!(io.content(Path::new("/p/sub2/b.txt")), Some(b"b".to_vec()));
    }

    #[test]
    fn test_move_to_occupied_destination_fails() {
        let io = MemoryIo::new("proj");
        io.add_file("/p/a.txt", "a");
        io.add_file("/p/b.txt", "b");

        let err = io
            .move_path(Path::new("/p/a.txt"), Path::new("/p/b.txt"))
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_delete_removes_subtree() {
        let io = MemoryIo::new("proj");
        io.add_dir("/p/sub");
        io.add_file("/p/sub/b.txt", "b");

        io.delete(Path::new("/p/sub")).unwrap();
        assert!(!io.contains(Path::new("/p/sub/b.txt")));
        assert!(matches!(
            io.delete(Path::new("/p/sub")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_dot_prefixed_listing_matches() {
        let io = MemoryIo::new("proj");
        io.add_file("./a.txt", "a");
        assert_eq!(
            io.list_files(Path::new(".")).unwrap(),
            vec![PathBuf::from("./a.txt")]
        );
    }
}
