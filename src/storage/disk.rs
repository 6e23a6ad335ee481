//! Real-filesystem storage backend.
//!
//! `DiskIo` serves raw and text reads from an in-process cache, invalidating
//! on write, move, and delete. Listings, moves, and deletes map directly onto
//! `std::fs`.

use crate::error::StorageError;
use crate::storage::ProjectIo;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem-backed `ProjectIo` with a read cache.
#[derive(Debug)]
pub struct DiskIo {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    match source.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_path_buf()),
        _ => StorageError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

impl DiskIo {
    /// Create a backend rooted at `root`; the root's directory name becomes
    /// the tree root's display name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskIo {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn list(&self, dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        let entries = fs::read_dir(dir).map_err(|err| io_err(dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| io_err(dir, err))?;
            let file_type = entry.file_type().map_err(|err| io_err(dir, err))?;
            if file_type.is_dir() == want_dirs {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn invalidate(&self, path: &Path) {
        let mut cache = self.cache.lock();
        cache.retain(|cached, _| !cached.starts_with(path));
    }
}

impl ProjectIo for DiskIo {
    fn list_directories(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        self.list(dir, true)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        self.list(dir, false)
    }

    fn create_directory(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|err| io_err(path, err))
    }

    fn create_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        self.write_file(path, content)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        fs::write(path, content).map_err(|err| io_err(path, err))?;
        self.cache
            .lock()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn move_path(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        fs::rename(from, to).map_err(|err| io_err(from, err))?;
        self.invalidate(from);
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), StorageError> {
        let meta = fs::symlink_metadata(path).map_err(|err| io_err(path, err))?;
        if meta.is_dir() {
            fs::remove_dir_all(path).map_err(|err| io_err(path, err))?;
        } else {
            fs::remove_file(path).map_err(|err| io_err(path, err))?;
        }
        self.invalidate(path);
        Ok(())
    }

    fn read_raw(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        if let Some(data) = self.cache.lock().get(path) {
            return Ok(data.clone());
        }
        let data = fs::read(path).map_err(|err| io_err(path, err))?;
        self.cache.lock().insert(path.to_path_buf(), data.clone());
        Ok(data)
    }

    fn read_text(&self, path: &Path) -> Result<String, StorageError> {
        let raw = self.read_raw(path)?;
        String::from_utf8(raw).map_err(|err| StorageError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })
    }

    fn absolute_path(&self, path: &Path) -> Result<PathBuf, StorageError> {
        dunce::canonicalize(path).map_err(|err| io_err(path, err))
    }

    fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn open_in_explorer(&self, path: &Path) -> Result<(), StorageError> {
        #[cfg(target_os = "macos")]
        let program = "open";
        #[cfg(target_os = "windows")]
        let program = "explorer";
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let program = "xdg-open";

        std::process::Command::new(program)
            .arg(path)
            .spawn()
            .map(|_| ())
            .map_err(|err| io_err(path, err))
    }
}
