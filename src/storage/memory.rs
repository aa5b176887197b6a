//! In-Memory Adapter
//!
//! Process-local storage backend for tests and embedding without a disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::StorageAdapter;
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    directories: BTreeSet<PathBuf>,
    read_only: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryState {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    fn children<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a PathBuf> + 'a {
        self.files
            .keys()
            .filter(move |file| file.parent() == Some(dir))
    }
}

// == Memory Adapter ==
/// Thread-safe storage adapter that keeps directories and files in memory.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter with `root` (and its ancestors) already present.
    pub fn with_directory(root: impl AsRef<Path>) -> Self {
        let adapter = Self::new();
        adapter.lock().directories.extend(ancestors(root.as_ref()));
        adapter
    }

    /// Marks a directory as read-only (or writable again).
    pub fn set_read_only(&self, dir: impl AsRef<Path>, read_only: bool) {
        let dir = dir.as_ref().to_path_buf();
        let mut state = self.lock();
        if read_only {
            state.read_only.insert(dir);
        } else {
            state.read_only.remove(&dir);
        }
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ancestors(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    path.ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

fn not_found(operation: &'static str, path: &Path) -> CacheError {
    CacheError::io(
        operation,
        path,
        io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
    )
}

fn denied(operation: &'static str, path: &Path) -> CacheError {
    CacheError::io(
        operation,
        path,
        io::Error::new(io::ErrorKind::PermissionDenied, "directory is read-only"),
    )
}

impl StorageAdapter for MemoryAdapter {
    fn is_directory(&self, path: &Path) -> bool {
        self.lock().is_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.is_dir(path) || state.is_file(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        let state = self.lock();
        (state.is_dir(path) || state.is_file(path)) && !state.read_only.contains(path)
    }

    fn create_directory(&self, path: &Path, _permissions: u32, recursive: bool) -> Result<()> {
        let mut state = self.lock();
        if state.is_dir(path) {
            return Ok(());
        }
        if state.is_file(path) {
            return Err(CacheError::io(
                "create directory",
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "path exists as a file"),
            ));
        }

        // Every level that would be created, up to the first existing directory
        let missing: Vec<PathBuf> = ancestors(path).take_while(|p| !state.is_dir(p)).collect();
        if missing.len() > 1 && !recursive {
            return Err(not_found("create directory", path));
        }
        if let Some(file) = missing.iter().find(|p| state.is_file(p)) {
            return Err(CacheError::io(
                "create directory",
                path,
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is a file", file.display()),
                ),
            ));
        }

        let base = missing
            .last()
            .and_then(|top| top.parent())
            .filter(|p| !p.as_os_str().is_empty());
        if base.map_or(false, |base| state.read_only.contains(base)) {
            return Err(denied("create directory", path));
        }

        state.directories.extend(missing);
        Ok(())
    }

    fn delete_directory_contents(&self, path: &Path) -> Result<usize> {
        let mut state = self.lock();
        if !state.is_dir(path) {
            return Err(not_found("list directory", path));
        }
        if state.read_only.contains(path) {
            return Err(denied("delete files in", path));
        }

        let doomed: Vec<PathBuf> = state.children(path).cloned().collect();
        for file in &doomed {
            state.files.remove(file);
        }
        Ok(doomed.len())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        if !state.is_file(path) {
            return Err(not_found("delete file", path));
        }
        if path.parent().is_some_and(|p| state.read_only.contains(p)) {
            return Err(denied("delete file", path));
        }
        state.files.remove(path);
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("read file", path))
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !state.is_dir(parent) {
            return Err(not_found("write file", path));
        }
        if state.read_only.contains(parent) {
            return Err(denied("write file", path));
        }
        if state.is_dir(path) {
            return Err(CacheError::io(
                "write file",
                path,
                io::Error::new(io::ErrorKind::Other, "path is a directory"),
            ));
        }
        state.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        if !state.is_dir(path) {
            return Err(not_found("list directory", path));
        }
        Ok(state.children(path).cloned().collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_directory_registers_ancestors() {
        let adapter = MemoryAdapter::with_directory("/srv/cache");
        assert!(adapter.is_directory(Path::new("/srv/cache")));
        assert!(adapter.is_directory(Path::new("/srv")));
        assert!(adapter.is_writable(Path::new("/srv/cache")));
    }

    #[test]
    fn test_write_requires_parent_directory() {
        let adapter = MemoryAdapter::with_directory("/srv");
        let err = adapter
            .write_file(Path::new("/srv/ns/entry"), b"x")
            .unwrap_err();
        assert!(err.is_not_found());

        adapter
            .create_directory(Path::new("/srv/ns"), 0o777, true)
            .unwrap();
        adapter.write_file(Path::new("/srv/ns/entry"), b"x").unwrap();
        assert_eq!(adapter.read_file(Path::new("/srv/ns/entry")).unwrap(), b"x");
    }

    #[test]
    fn test_read_only_directory_rejects_writes() {
        let adapter = MemoryAdapter::with_directory("/srv");
        adapter.set_read_only("/srv", true);

        assert!(!adapter.is_writable(Path::new("/srv")));
        assert!(adapter.write_file(Path::new("/srv/entry"), b"x").is_err());
        assert!(adapter
            .create_directory(Path::new("/srv/ns"), 0o777, true)
            .is_err());
    }

    #[test]
    fn test_delete_directory_contents_only_direct_children() {
        let adapter = MemoryAdapter::with_directory("/srv/a/b");
        adapter.write_file(Path::new("/srv/a/one"), b"1").unwrap();
        adapter.write_file(Path::new("/srv/a/b/two"), b"2").unwrap();

        assert_eq!(adapter.delete_directory_contents(Path::new("/srv/a")).unwrap(), 1);
        assert!(adapter.exists(Path::new("/srv/a/b/two")));
        assert!(adapter.is_directory(Path::new("/srv/a")));
    }

    #[test]
    fn test_delete_missing_file_is_an_error() {
        let adapter = MemoryAdapter::with_directory("/srv");
        assert!(adapter.delete_file(Path::new("/srv/nope")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_directory_over_file_fails() {
        let adapter = MemoryAdapter::with_directory("/srv");
        adapter.write_file(Path::new("/srv/taken"), b"x").unwrap();
        assert!(adapter
            .create_directory(Path::new("/srv/taken"), 0o777, true)
            .is_err());
    }

    #[test]
    fn test_recursive_create_respects_read_only_base() {
        let adapter = MemoryAdapter::with_directory("/srv");
        adapter.set_read_only("/srv", true);

        let err = adapter
            .create_directory(Path::new("/srv/a/b"), 0o777, true)
            .unwrap_err();

        assert!(matches!(
            err,
            CacheError::Io { ref source, .. } if source.kind() == io::ErrorKind::PermissionDenied
        ));
        assert!(!adapter.exists(Path::new("/srv/a")));
        assert!(!adapter.exists(Path::new("/srv/a/b")));
    }

    #[test]
    fn test_recursive_create_through_file_fails() {
        let adapter = MemoryAdapter::with_directory("/srv");
        adapter.write_file(Path::new("/srv/f"), b"x").unwrap();

        assert!(adapter
            .create_directory(Path::new("/srv/f/x/y"), 0o777, true)
            .is_err());
        assert!(!adapter.is_directory(Path::new("/srv/f")));
        assert!(!adapter.exists(Path::new("/srv/f/x")));
    }

    #[test]
    fn test_recursive_create_below_writable_base() {
        let adapter = MemoryAdapter::with_directory("/srv");
        adapter.set_read_only("/", true);

        adapter
            .create_directory(Path::new("/srv/a/b"), 0o777, true)
            .unwrap();
        assert!(adapter.is_directory(Path::new("/srv/a")));
        assert!(adapter.is_directory(Path::new("/srv/a/b")));

        let err = adapter
            .create_directory(Path::new("/srv/x/y"), 0o777, false)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
