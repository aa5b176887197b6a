//! Cache Entry Module
//!
//! Defines individual cache entries with TTL support and their versioned on-disk
//! record format.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::finite::ensure_finite;
use crate::cache::{Ttl, FORMAT_VERSION};
use crate::error::{CacheError, Result};

// == Record Field Names ==
pub const FIELD_VALUE: &str = "value";
pub const FIELD_EXPIRES_AT: &str = "expires_at";
pub const FIELD_CREATED_AT: &str = "created_at";
pub const FIELD_VERSION: &str = "version";

// == Entry Record ==
/// On-disk layout of an entry, discriminated by its `version` field.
///
/// A new layout gets a new variant; unknown versions fail to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version")]
enum EntryRecord {
    #[serde(rename = "1.0")]
    V1 {
        /// Payload encoded as a JSON document
        value: String,
        expires_at: Option<i64>,
        created_at: i64,
    },
}

// == Cache Entry ==
/// Represents a single cached value with creation and expiry metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    value: Value,
    /// Creation timestamp (unix seconds), informational only
    created_at: i64,
    /// Expiration timestamp (unix seconds), None = no expiration
    expires_at: Option<i64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - Any value serde_json can represent
    /// * `ttl` - Lifetime of the entry, resolved against the current time
    ///
    /// # Errors
    /// `InvalidValue` if the value cannot be encoded (e.g. a map with
    /// non-string keys, or a NaN or infinite float), `InvalidArgument` if the
    /// TTL overflows.
    pub fn new<T: Serialize + ?Sized>(value: &T, ttl: impl Into<Ttl>) -> Result<Self> {
        ensure_finite(value).map_err(|e| CacheError::InvalidValue(e.to_string()))?;
        let value =
            serde_json::to_value(value).map_err(|e| CacheError::InvalidValue(e.to_string()))?;
        Self::from_value(value, ttl.into())
    }

    /// Creates a new cache entry from an already-encoded payload.
    pub fn from_value(value: Value, ttl: Ttl) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            value,
            created_at: now.timestamp(),
            expires_at: ttl.expires_at(now)?,
        })
    }

    // == Accessors ==
    /// Returns the payload regardless of expiry.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current second is strictly past its
    /// expiry timestamp. The clock is read on every call.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => expires < current_timestamp(),
            None => false,
        }
    }

    // == Get Value ==
    /// Returns the payload, or None if the entry has expired.
    pub fn get_value(&self) -> Option<&Value> {
        if self.is_expired() {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Returns the payload, or `default` if the entry has expired.
    pub fn get_value_or(&self, default: Value) -> Value {
        self.get_value().cloned().unwrap_or(default)
    }

    // == Serialize ==
    /// Produces the on-disk record for this entry.
    pub fn serialize(&self) -> Result<Value> {
        let payload = serde_json::to_string(&self.value)
            .map_err(|e| CacheError::InvalidValue(e.to_string()))?;
        let record = EntryRecord::V1 {
            value: payload,
            expires_at: self.expires_at,
            created_at: self.created_at,
        };
        serde_json::to_value(record).map_err(|e| CacheError::InvalidValue(e.to_string()))
    }

    /// Encodes the on-disk record as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let record = self.serialize()?;
        serde_json::to_vec(&record).map_err(|e| CacheError::InvalidValue(e.to_string()))
    }

    // == Deserialize ==
    /// Rebuilds an entry from an on-disk record.
    ///
    /// The expiry is carried over as a TTL relative to now and resolved again
    /// through the constructor, so it is re-anchored to the current clock.
    ///
    /// # Errors
    /// `InvalidArgument` if the record is invalid or its payload is malformed.
    pub fn deserialize(record: &Value) -> Result<Self> {
        Self::validate_or_fail(record)?;

        let EntryRecord::V1 {
            value,
            expires_at,
            created_at,
        } = serde_json::from_value(record.clone())
            .map_err(|e| CacheError::InvalidArgument(format!("Invalid record: {}", e)))?;

        let value: Value = serde_json::from_str(&value)
            .map_err(|e| CacheError::InvalidArgument(format!("Malformed payload: {}", e)))?;

        let now = current_timestamp();
        let ttl = Ttl::from(expires_at.map(|at| at.saturating_sub(now)));

        let mut entry = Self::from_value(value, ttl)?;
        entry.created_at = created_at;
        Ok(entry)
    }

    /// Decodes raw record bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: Value = serde_json::from_slice(bytes)
            .map_err(|e| CacheError::InvalidArgument(format!("Malformed record: {}", e)))?;
        Self::deserialize(&record)
    }

    // == Record Validation ==
    /// Returns true iff the record has every field, the current format version
    /// and an integer or null expiry.
    pub fn is_valid_record(record: &Value) -> bool {
        let Some(fields) = record.as_object() else {
            return false;
        };

        let has_all_fields = [FIELD_VALUE, FIELD_EXPIRES_AT, FIELD_CREATED_AT, FIELD_VERSION]
            .iter()
            .all(|field| fields.contains_key(*field));
        if !has_all_fields {
            return false;
        }

        if fields.get(FIELD_VERSION).and_then(Value::as_str) != Some(FORMAT_VERSION) {
            return false;
        }

        is_integer_or_null(fields, FIELD_EXPIRES_AT)
    }

    /// Fails with `InvalidArgument` unless [`CacheEntry::is_valid_record`] holds.
    pub fn validate_or_fail(record: &Value) -> Result<()> {
        if Self::is_valid_record(record) {
            Ok(())
        } else {
            Err(CacheError::InvalidArgument("Invalid record".to_string()))
        }
    }
}

fn is_integer_or_null(fields: &Map<String, Value>, field: &str) -> bool {
    match fields.get(field) {
        Some(Value::Null) => true,
        Some(Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}
