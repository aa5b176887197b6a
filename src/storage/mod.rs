//! Storage Module
//!
//! Capability interface mediating all filesystem access on behalf of the cache
//! engine, with a real filesystem implementation and an in-memory substitute.

mod fs;
mod memory;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use fs::FileAdapter;
pub use memory::MemoryAdapter;

// == Public Constants ==
/// Permissions requested for namespace directories (the process umask still applies)
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o777;

// == Storage Adapter ==
/// Synchronous storage operations used by the cache engine.
///
/// Every fallible operation surfaces its failure as a [`CacheError`]; nothing is
/// swallowed. Failures for paths that do not exist carry
/// [`std::io::ErrorKind::NotFound`] so callers can tell a vanished file apart
/// from a genuine fault.
///
/// [`CacheError`]: crate::error::CacheError
pub trait StorageAdapter: Send + Sync {
    /// Returns true if `path` is an existing directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` exists and may be written to.
    fn is_writable(&self, path: &Path) -> bool;

    /// Creates a directory at `path`.
    ///
    /// Succeeds if the directory already exists. Fails if `path` exists as a
    /// non-directory or the parent cannot be written.
    fn create_directory(&self, path: &Path, permissions: u32, recursive: bool) -> Result<()>;

    /// Removes every regular file directly inside `path`, leaving `path` and any
    /// subdirectories in place. Returns how many files were removed.
    fn delete_directory_contents(&self, path: &Path) -> Result<usize>;

    /// Removes the file at `path`. A missing file is an error.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Reads the full contents of the file at `path`.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replaces the contents of the file at `path`.
    ///
    /// Readers must observe either the previous or the new contents, never a
    /// partially written file.
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Lists the regular files directly inside `path`.
    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

impl<A: StorageAdapter + ?Sized> StorageAdapter for std::sync::Arc<A> {
    fn is_directory(&self, path: &Path) -> bool {
        (**self).is_directory(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        (**self).is_writable(path)
    }

    fn create_directory(&self, path: &Path, permissions: u32, recursive: bool) -> Result<()> {
        (**self).create_directory(path, permissions, recursive)
    }

    fn delete_directory_contents(&self, path: &Path) -> Result<usize> {
        (**self).delete_directory_contents(path)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (**self).delete_file(path)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        (**self).write_file(path, bytes)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        (**self).list_files(path)
    }
}
