//! Simple File Cache - A filesystem-backed key-value cache
//!
//! Stores each entry as one JSON file under `<storage_path>/<namespace>/`,
//! with per-entry TTL expiry and a pluggable storage backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{CacheEntry, CacheStats, FileCache, Interval, Ttl};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use storage::{FileAdapter, MemoryAdapter, StorageAdapter};
