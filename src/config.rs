//! Configuration Module
//!
//! Handles cache instance configuration, optionally loaded from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_NAMESPACE;

/// Cache instance configuration.
///
/// Values are validated when the cache is constructed, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Namespace identifier, one subdirectory of `storage_path`
    pub name: String,
    /// Root directory holding every namespace
    pub storage_path: PathBuf,
}

impl CacheConfig {
    /// Creates a config for the given namespace and root directory.
    pub fn new(name: impl Into<String>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage_path: storage_path.into(),
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FILE_CACHE_NAMESPACE` - Namespace name (default: "default")
    /// - `FILE_CACHE_DIR` - Storage root (default: the platform temp directory)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("FILE_CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.name),
            storage_path: env::var_os("FILE_CACHE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
        }
    }

    /// Replaces the namespace name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the storage root.
    pub fn with_storage_path(mut self, storage_path: impl Into<PathBuf>) -> Self {
        self.storage_path = storage_path.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAMESPACE.to_string(),
            storage_path: env::temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.name, "default");
        assert_eq!(config.storage_path, env::temp_dir());
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_name("sessions")
            .with_storage_path("/var/cache/app");
        assert_eq!(config, CacheConfig::new("sessions", "/var/cache/app"));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("FILE_CACHE_NAMESPACE");
        env::remove_var("FILE_CACHE_DIR");

        let config = CacheConfig::from_env();
        assert_eq!(config, CacheConfig::default());
    }
}
