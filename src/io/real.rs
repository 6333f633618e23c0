//! Implementations of [`FileSystem`].
//!
//! [`RealFileSystem`] is used in production; [`MemoryFileSystem`] keeps files
//! in a map and records every write, which lets tests assert that a rolled
//! back file was never written at all.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::atomic::write_bytes_atomically;
use super::traits::FileSystem;

/// Production file system implementation.
#[derive(Debug, Default, Clone)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        write_bytes_atomically(path, content.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory file system for tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
    writes: RwLock<Vec<PathBuf>>,
    read_only: RwLock<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content.into());
        }
    }

    /// Make writes to `path` fail with `PermissionDenied`.
    pub fn deny_writes(&self, path: impl Into<PathBuf>) {
        if let Ok(mut read_only) = self.read_only.write() {
            read_only.push(path.into());
        }
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// Paths written so far, in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.read().map(|w| w.clone()).unwrap_or_default()
    }
}

fn poisoned() -> io::Error {
    io::Error::other("memory file system lock poisoned")
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .map_err(|_| poisoned())?
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        let denied = self
            .read_only
            .read()
            .map_err(|_| poisoned())?
            .iter()
            .any(|p| p == path);
        if denied {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            ));
        }
        self.files
            .write()
            .map_err(|_| poisoned())?
            .insert(path.to_path_buf(), content.to_string());
        self.writes
            .write()
            .map_err(|_| poisoned())?
            .push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fs_records_writes() {
        let fs = MemoryFileSystem::new().with_file("/a.py", "x = 1\n");
        assert_eq!(fs.read_to_string(Path::new("/a.py")).unwrap(), "x = 1\n");

        fs.write_atomic(Path::new("/a.py"), "x = 2\n").unwrap();
        assert_eq!(fs.get(Path::new("/a.py")).as_deref(), Some("x = 2\n"));
        assert_eq!(fs.writes(), vec![PathBuf::from("/a.py")]);

        fs.deny_writes("/a.py");
        assert_eq!(
            fs.write_atomic(Path::new("/a.py"), "x = 3\n")
                .unwrap_err()
                .kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn real_fs_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.js");
        let fs = RealFileSystem::new();
        fs::write(&path, "let a = 1;").unwrap();
        fs.write_atomic(&path, "const a = 1;\n").unwrap();
        assert_eq!(fs.read_to_string(&path).unwrap(), "const a = 1;\n");
        assert!(fs.exists(&path));
    }
}
