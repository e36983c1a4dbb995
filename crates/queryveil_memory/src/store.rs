// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use moka::future::Cache;
use parking_lot::Mutex;
use queryveil_store::{Error, Pattern, Store, StoredEntry};

use crate::builder::MemoryStoreBuilder;

/// Maps a reference tag to the keys of the entries filed under it.
type ReferenceIndex = Arc<Mutex<HashMap<String, HashSet<String>>>>;

/// Per-entry expiration driven by the TTL stored on each [`StoredEntry`].
///
/// Entries without a TTL fall back to the store-level `time_to_live`, if any.
struct PerEntryExpiry;

impl moka::Expiry<String, StoredEntry> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &StoredEntry, _created_at: Instant) -> Option<Duration> {
        entry.ttl()
    }
}

/// An in-process bounded backend backed by moka.
///
/// This store provides:
/// - Concurrent access with `TinyLFU` eviction once capacity is reached
/// - Per-entry TTL expiration
/// - Reference-tag invalidation via a side index that moka's eviction
///   notifications keep in sync
/// - Raw pattern deletion by scanning the live keyspace
///
/// # Examples
///
/// ```
/// use queryveil_memory::MemoryStore;
/// use queryveil_store::{Store, StoredEntry};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), queryveil_store::Error> {
/// let store = MemoryStore::new();
///
/// store.set("key", StoredEntry::new(json!(42), vec![])).await?;
/// let entry = store.get("key").await?;
/// assert_eq!(*entry.unwrap().payload(), json!(42));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Cache<String, StoredEntry>,
    references: ReferenceIndex,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a new unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory store with a maximum capacity.
    ///
    /// Once the capacity is reached, entries are evicted using the `TinyLFU`
    /// policy (combination of LRU eviction and LFU admission).
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory store.
    #[must_use]
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::new()
    }

    pub(crate) fn from_builder(builder: &MemoryStoreBuilder) -> Self {
        let references: ReferenceIndex = Arc::default();
        let index = Arc::clone(&references);

        // Keep the reference index in sync with every removal moka performs,
        // whether explicit, size-based, or TTL-based.
        let mut moka_builder = Cache::builder()
            .expire_after(PerEntryExpiry)
            .eviction_listener(move |key: Arc<String>, entry: StoredEntry, _cause| {
                let mut index = index.lock();
                for tag in entry.references() {
                    if let Some(keys) = index.get_mut(tag) {
                        keys.remove(key.as_str());
                        if keys.is_empty() {
                            index.remove(tag);
                        }
                    }
                }
            });

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(ttl) = builder.time_to_live {
            moka_builder = moka_builder.time_to_live(ttl);
        }

        if let Some(tti) = builder.time_to_idle {
            moka_builder = moka_builder.time_to_idle(tti);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            references,
        }
    }

    /// Returns the number of entries currently held.
    ///
    /// The count is approximate while evictions are pending.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), Error> {
        {
            let mut index = self.references.lock();
            for tag in entry.references() {
                index.entry(tag.clone()).or_default().insert(key.to_owned());
            }
        }
        self.inner.insert(key.to_owned(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let _ = self.inner.remove(key).await;
        Ok(())
    }

    async fn invalidate_reference(&self, reference: &str) -> Result<u64, Error> {
        let keys = self.references.lock().remove(reference).unwrap_or_default();

        let mut removed = 0;
        for key in keys {
            if self.inner.remove(&key).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, Error> {
        let pattern = Pattern::new(pattern)?;
        let matched: Vec<String> = self
            .inner
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| String::clone(&key))
            .collect();

        let mut removed = 0;
        for key in matched {
            if self.inner.remove(&key).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        self.references.lock().clear();
        Ok(())
    }
}
