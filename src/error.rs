//! Error types for the file cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the file cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Bad namespace name, storage path, TTL or stored record
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Value cannot be represented in the record encoding
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The storage adapter failed to complete an operation
    #[error("Failed to {operation} {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored record could not be decoded or failed validation
    #[error("Corrupted cache entry {}: {reason}", .path.display())]
    Corrupted { path: PathBuf, reason: String },

    /// A stored value did not match the requested type
    #[error("Failed to convert cached value: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl CacheError {
    // == Constructors ==
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    // == Classification ==
    /// Returns true for adapter errors caused by a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// Returns true for backend faults: I/O failures and corrupted records.
    pub fn is_cache_exception(&self) -> bool {
        matches!(self, CacheError::Io { .. } | CacheError::Corrupted { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;
