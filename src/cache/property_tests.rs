//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine's behaviour over generated keys, payloads
//! and namespace names.

use proptest::prelude::*;
use serde_json::Value;

use crate::cache::{CacheEntry, FileCache, Ttl};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::storage::{MemoryAdapter, StorageAdapter};

// == Test Configuration ==
const ROOT: &str = "/prop-cache";

fn memory_cache(name: &str) -> FileCache<MemoryAdapter> {
    FileCache::with_adapter(
        CacheConfig::new(name, ROOT),
        MemoryAdapter::with_directory(ROOT),
    )
    .unwrap()
}

// == Strategies ==
/// Generates arbitrary cache keys, including separators and unicode
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_]{1,64}",
        "[ -~]{0,32}",
        any::<String>(),
    ]
}

/// Generates valid namespace names
fn namespace_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,64}".prop_filter("dot segments", |name| name != "." && name != "..")
}

/// Generates nested JSON documents. Floats are limited to exactly
/// representable values so text round-trips are exact.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1_000_000i32..1_000_000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
        ".{0,24}".prop_map(Value::from),
    ];

    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(".{0,8}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: whatever is stored is read back unchanged before expiry.
    #[test]
    fn prop_roundtrip_storage(
        key in key_strategy(),
        value in json_strategy(),
        ttl in prop_oneof![Just(None), (60i64..100_000).prop_map(Some)],
    ) {
        let cache = memory_cache("default");

        cache.set(&key, &value, ttl).unwrap();

        prop_assert_eq!(cache.get_value(&key).unwrap(), Some(value));
    }

    // The record encoding itself preserves payload and metadata.
    #[test]
    fn prop_entry_bytes_roundtrip(value in json_strategy()) {
        let entry = CacheEntry::new(&value, Ttl::Never).unwrap();
        let restored = CacheEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();

        prop_assert_eq!(restored.value(), &value);
        prop_assert_eq!(restored.created_at(), entry.created_at());
        prop_assert_eq!(restored.expires_at(), None);
    }

    // Overwrite: the second value replaces the first, using a single file.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in json_strategy(),
        second in json_strategy(),
    ) {
        let cache = memory_cache("default");

        cache.set(&key, &first, Ttl::Never).unwrap();
        cache.set(&key, &second, Ttl::Never).unwrap();

        prop_assert_eq!(cache.get_value(&key).unwrap(), Some(second));
        prop_assert_eq!(cache.adapter().file_count(), 1);
    }

    // Delete: after deleting, reads fall back to the default.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in json_strategy()) {
        let cache = memory_cache("default");

        cache.set(&key, &value, Ttl::Never).unwrap();
        prop_assert!(cache.has(&key));

        cache.delete(&key).unwrap();
        prop_assert!(!cache.has(&key));
        prop_assert_eq!(cache.get(&key, Value::from("default")).unwrap(), Value::from("default"));
    }

    // Distinct keys never share an entry file.
    #[test]
    fn prop_distinct_keys_distinct_paths(a in key_strategy(), b in key_strategy()) {
        prop_assume!(a != b);
        let cache = memory_cache("default");
        prop_assert_ne!(cache.path_for(&a), cache.path_for(&b));
    }

    // Namespace isolation: the same key in two namespaces holds two values.
    #[test]
    fn prop_namespace_isolation(
        first_ns in namespace_strategy(),
        second_ns in namespace_strategy(),
        key in key_strategy(),
    ) {
        prop_assume!(first_ns != second_ns);
        let adapter = std::sync::Arc::new(MemoryAdapter::with_directory(ROOT));
        let first = FileCache::with_adapter(CacheConfig::new(first_ns, ROOT), adapter.clone()).unwrap();
        let second = FileCache::with_adapter(CacheConfig::new(second_ns, ROOT), adapter.clone()).unwrap();

        first.set(&key, "first", Ttl::Never).unwrap();
        second.set(&key, "second", Ttl::Never).unwrap();

        prop_assert_eq!(first.get(&key, String::new()).unwrap(), "first");
        prop_assert_eq!(second.get(&key, String::new()).unwrap(), "second");
    }

    // Every name matching the allowed pattern opens a cache.
    #[test]
    fn prop_valid_namespace_accepted(name in namespace_strategy()) {
        let cache = memory_cache(&name);
        prop_assert_eq!(cache.name(), name.as_str());
    }

    // Names with a disallowed character are rejected without touching storage.
    #[test]
    fn prop_invalid_namespace_rejected(
        prefix in "[A-Za-z0-9_.-]{0,20}",
        bad in "[^A-Za-z0-9_.-]",
        suffix in "[A-Za-z0-9_.-]{0,20}",
    ) {
        let name = format!("{}{}{}", prefix, bad, suffix);
        let adapter = MemoryAdapter::with_directory(ROOT);

        let result = FileCache::with_adapter(CacheConfig::new(name, ROOT), adapter);
        prop_assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    // Already-expired entries always read as the default and are removed.
    #[test]
    fn prop_expired_entries_read_as_default(
        key in key_strategy(),
        value in json_strategy(),
        age in 1i64..1_000_000,
    ) {
        let cache = memory_cache("default");
        cache.set(&key, &value, Ttl::Seconds(-age)).unwrap();

        prop_assert_eq!(cache.get_value(&key).unwrap(), None);
        prop_assert!(!cache.adapter().exists(&cache.path_for(&key)));
    }
}
