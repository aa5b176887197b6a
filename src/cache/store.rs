//! Cache Store Module
//!
//! Main cache engine mapping namespaced keys to entry files through a storage adapter.
//!
//! Layout: `<storage_path>/<namespace>/<sha256-hex(key)>`, one JSON record per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats, Ttl, MAX_NAMESPACE_LENGTH};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::storage::{FileAdapter, StorageAdapter, DEFAULT_DIR_PERMISSIONS};

// == File Cache ==
/// Filesystem-backed cache for one namespace.
///
/// No locking is performed: concurrent writers to the same key race and the
/// last completed write wins.
#[derive(Debug)]
pub struct FileCache<A = FileAdapter> {
    /// Namespace identifier
    name: String,
    /// Root directory shared by all namespaces
    storage_path: PathBuf,
    /// `storage_path/name`, created on first write
    namespace_path: PathBuf,
    /// Backend performing every filesystem operation
    adapter: A,
    /// Read statistics for this instance
    stats: StatsRecorder,
}

impl FileCache<FileAdapter> {
    // == Constructor ==
    /// Opens a cache on the local filesystem.
    ///
    /// # Errors
    /// `InvalidArgument` if the namespace name is malformed or the storage path
    /// is missing, not a directory, or not writable.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_adapter(config, FileAdapter::new())
    }
}

impl<A: StorageAdapter> FileCache<A> {
    /// Opens a cache that performs all storage through `adapter`.
    ///
    /// Nothing is created on disk until the first write.
    pub fn with_adapter(config: CacheConfig, adapter: A) -> Result<Self> {
        let CacheConfig { name, storage_path } = config;

        validate_namespace(&name)?;
        validate_storage_path(&adapter, &storage_path)?;

        let namespace_path = storage_path.join(&name);
        debug!(
            "Opened cache namespace '{}' at {}",
            name,
            namespace_path.display()
        );

        Ok(Self {
            name,
            storage_path,
            namespace_path,
            adapter,
            stats: StatsRecorder::default(),
        })
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Directory holding this namespace's entry files.
    pub fn namespace_path(&self) -> &Path {
        &self.namespace_path
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Returns the file an entry for `key` is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.namespace_path.join(hash_key(key))
    }

    /// Returns current read statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Get ==
    /// Retrieves a value, converting it into `T`, or returns `default` on a
    /// miss or an expired entry.
    ///
    /// # Errors
    /// `Io`/`Corrupted` if an existing entry cannot be read or decoded (the
    /// entry is deleted first), `Deserialize` if the stored value is not a `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        match self.get_value(key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(default),
        }
    }

    /// Retrieves the raw stored value, or None on a miss or an expired entry.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);

        if !self.adapter.exists(&path) {
            debug!("Cache miss for key '{}'", key);
            self.stats.record_miss();
            return Ok(None);
        }

        let bytes = match self.adapter.read_file(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                // Deleted between the existence check and the read
                debug!("Cache entry for key '{}' vanished before read", key);
                self.stats.record_miss();
                return Ok(None);
            }
            Err(e) => {
                warn!("Failed to read cache entry for key '{}': {}", key, e);
                self.discard(&path);
                return Err(e);
            }
        };

        let entry = match CacheEntry::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding corrupted cache entry for key '{}': {}", key, e);
                self.discard(&path);
                self.stats.record_discard();
                return Err(CacheError::Corrupted {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        if entry.is_expired() {
            debug!("Cache entry for key '{}' expired", key);
            self.discard(&path);
            self.stats.record_expiration();
            self.stats.record_miss();
            return Ok(None);
        }

        match entry.get_value() {
            Some(value) => {
                debug!("Cache hit for key '{}'", key);
                self.stats.record_hit();
                Ok(Some(value.clone()))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores a value under `key`, replacing any existing entry.
    ///
    /// # Arguments
    /// * `key` - Any string; it is hashed into the file name
    /// * `value` - Any value serde_json can represent
    /// * `ttl` - Entry lifetime, e.g. `Ttl::Never` or `Ttl::Seconds(60)`
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Ttl>,
    ) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        let bytes = entry.to_bytes()?;

        self.ensure_namespace()?;
        self.adapter.write_file(&self.path_for(key), &bytes)?;

        debug!(
            "Stored key '{}' in namespace '{}' (expires_at={:?})",
            key,
            self.name,
            entry.expires_at()
        );
        Ok(())
    }

    // == Delete ==
    /// Removes the entry for `key`. Deleting an absent key succeeds.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if !self.adapter.exists(&path) {
            return Ok(());
        }

        self.remove(&path)?;
        debug!("Deleted key '{}' from namespace '{}'", key, self.name);
        Ok(())
    }

    // == Has ==
    /// Returns true if an entry file exists for `key`.
    ///
    /// Expiry is not checked: an expired entry that has not been read yet
    /// still counts as present.
    pub fn has(&self, key: &str) -> bool {
        self.adapter.exists(&self.path_for(key))
    }

    // == Clear ==
    /// Deletes every entry in this namespace, keeping the directory itself.
    ///
    /// Not coordinated with concurrent writers. A racing `set` either lands
    /// before the sweep and is removed, or lands after it and survives. If
    /// its temporary file is swept mid-write, that `set` fails with a
    /// not-found I/O error. Readers never see a partial record either way.
    pub fn clear(&self) -> Result<()> {
        if !self.adapter.is_directory(&self.namespace_path) {
            return Ok(());
        }

        let removed = self.adapter.delete_directory_contents(&self.namespace_path)?;
        info!(
            "Cleared namespace '{}': removed {} entries",
            self.name, removed
        );
        Ok(())
    }

    // == Batch Operations ==
    /// Reads several keys independently, mapping each to its value or `default`.
    pub fn get_multiple<I, K, T>(&self, keys: I, default: T) -> Result<HashMap<String, T>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        T: DeserializeOwned + Clone,
    {
        let mut values = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            let value = self.get(key, default.clone())?;
            values.insert(key.to_string(), value);
        }
        Ok(values)
    }

    /// Stores every pair with the same TTL.
    ///
    /// Every pair is attempted; returns `Ok(true)` only if all of them were
    /// stored. Successful writes are kept when others fail.
    ///
    /// # Errors
    /// `InvalidArgument` if the TTL itself is out of range.
    pub fn set_multiple<I, K, T>(&self, entries: I, ttl: impl Into<Ttl>) -> Result<bool>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Serialize,
    {
        let ttl = ttl.into();
        ttl.expires_at(Utc::now())?;

        let mut success = true;
        for (key, value) in entries {
            if let Err(e) = self.set(key.as_ref(), &value, ttl) {
                warn!("Failed to store key '{}': {}", key.as_ref(), e);
                success = false;
            }
        }
        Ok(success)
    }

    /// Deletes every key; returns true only if all deletions succeeded.
    pub fn delete_multiple<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut success = true;
        for key in keys {
            if let Err(e) = self.delete(key.as_ref()) {
                warn!("Failed to delete key '{}': {}", key.as_ref(), e);
                success = false;
            }
        }
        success
    }

    // == Purge Expired ==
    /// Removes all expired and undecodable entries from this namespace.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> Result<usize> {
        if !self.adapter.is_directory(&self.namespace_path) {
            return Ok(0);
        }

        let mut removed = 0;
        for path in self.adapter.list_files(&self.namespace_path)? {
            if !is_entry_file(&path) {
                continue;
            }

            let bytes = match self.adapter.read_file(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };

            let expired = match CacheEntry::from_bytes(&bytes) {
                Ok(entry) if entry.is_expired() => true,
                Ok(_) => continue,
                Err(_) => false,
            };

            if self.remove(&path)? {
                if expired {
                    self.stats.record_expiration();
                } else {
                    self.stats.record_discard();
                }
                removed += 1;
            }
        }

        if removed > 0 {
            info!(
                "Purged {} stale entries from namespace '{}'",
                removed, self.name
            );
        } else {
            debug!("Purge found no stale entries in namespace '{}'", self.name);
        }
        Ok(removed)
    }

    // == Internal Helpers ==
    fn ensure_namespace(&self) -> Result<()> {
        if self.adapter.is_directory(&self.namespace_path) {
            return Ok(());
        }
        self.adapter
            .create_directory(&self.namespace_path, DEFAULT_DIR_PERMISSIONS, true)
    }

    /// Deletes a file, returning false if it had already vanished.
    fn remove(&self, path: &Path) -> Result<bool> {
        match self.adapter.delete_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Best-effort delete of an entry that is about to be reported as bad.
    fn discard(&self, path: &Path) {
        if let Err(e) = self.remove(path) {
            warn!("Failed to discard cache entry {}: {}", path.display(), e);
        }
    }
}

// == Validation ==
fn validate_namespace(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if name.is_empty() || name.chars().count() > MAX_NAMESPACE_LENGTH || !valid_chars {
        return Err(CacheError::InvalidArgument(format!(
            "Namespace '{}' is not valid: use 1 to {} of the characters a-zA-Z0-9_-.",
            name, MAX_NAMESPACE_LENGTH
        )));
    }
    if name == "." || name == ".." {
        return Err(CacheError::InvalidArgument(format!(
            "Namespace '{}' would resolve outside its own directory",
            name
        )));
    }
    Ok(())
}

fn validate_storage_path<A: StorageAdapter>(adapter: &A, path: &Path) -> Result<()> {
    let problem = if !adapter.exists(path) {
        "does not exist"
    } else if !adapter.is_directory(path) {
        "is not a directory"
    } else if !adapter.is_writable(path) {
        "is not writable"
    } else {
        return Ok(());
    };

    Err(CacheError::InvalidArgument(format!(
        "Storage path {} {}",
        path.display(),
        problem
    )))
}

// == Key Hashing ==
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Entry files are named by a 64-character lowercase hex digest.
fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.len() == 64 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
}
