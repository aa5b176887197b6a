//! Cache Module
//!
//! Provides the file-backed cache engine with TTL expiration and namespaces.

mod entry;
mod finite;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp, CacheEntry};
pub use stats::CacheStats;
pub use store::FileCache;
pub use ttl::{Interval, Ttl};

// == Public Constants ==
/// On-disk record format version written by this crate
pub const FORMAT_VERSION: &str = "1.0";

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// Maximum namespace name length in characters
pub const MAX_NAMESPACE_LENGTH: usize = 64;
