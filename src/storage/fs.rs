//! Filesystem Adapter
//!
//! Default storage backend operating on the local filesystem.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::StorageAdapter;
use crate::error::{CacheError, Result};

// == File Adapter ==
/// Storage adapter backed by `std::fs`.
///
/// Writes go to a temporary file in the destination directory which is then
/// renamed over the target, so concurrent readers never see a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAdapter;

impl FileAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl StorageAdapter for FileAdapter {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Judged by opening an anonymous file for write, not from the mode bits.
    fn is_writable(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => tempfile::tempfile_in(path).is_ok(),
            Ok(_) => fs::OpenOptions::new().append(true).open(path).is_ok(),
            Err(_) => false,
        }
    }

    fn create_directory(&self, path: &Path, permissions: u32, recursive: bool) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(recursive);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(permissions);
        }
        #[cfg(not(unix))]
        let _ = permissions;

        match builder.create(path) {
            Ok(()) => Ok(()),
            // Lost a race against another creator
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            Err(e) => Err(CacheError::io("create directory", path, e)),
        }
    }

    fn delete_directory_contents(&self, path: &Path) -> Result<usize> {
        let mut removed = 0;
        for file in self.list_files(path)? {
            match fs::remove_file(&file) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io("delete file", file, e)),
            }
        }
        Ok(removed)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| CacheError::io("delete file", path, e))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| CacheError::io("read file", path, e))
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        // The temp file is removed on drop if any step below fails
        let mut temp =
            NamedTempFile::new_in(dir).map_err(|e| CacheError::io("create temp file in", dir, e))?;
        temp.write_all(bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| CacheError::io("write temp file for", path, e))?;
        temp.persist(path)
            .map_err(|e| CacheError::io("rename temp file onto", path, e.error))?;

        Ok(())
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(path).map_err(|e| CacheError::io("list directory", path, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io("list directory", path, e))?;
            let is_file = entry
                .file_type()
                .map(|t| t.is_file())
                .map_err(|e| CacheError::io("inspect", entry.path(), e))?;
            if is_file {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}
