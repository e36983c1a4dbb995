// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! This module provides a builder API for `MemoryStore` that abstracts the
//! underlying moka configuration, providing a stable API surface without
//! exposing moka's types.

use std::time::Duration;

use crate::store::MemoryStore;

/// Builder for configuring a `MemoryStore`.
///
/// # Examples
///
/// ```
/// use queryveil_memory::MemoryStore;
/// use std::time::Duration;
///
/// let store = MemoryStore::builder()
///     .max_capacity(1000)
///     .time_to_live(Duration::from_secs(300))
///     .time_to_idle(Duration::from_secs(60))
///     .name("query-cache")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) time_to_live: Option<Duration>,
    pub(crate) time_to_idle: Option<Duration>,
    pub(crate) name: Option<String>,
}

impl MemoryStoreBuilder {
    /// Creates a new builder with default settings.
    ///
    /// The default configuration creates an unbounded store with `TinyLFU`
    /// eviction and no store-level time-based expiration; per-entry TTLs
    /// still apply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum capacity of the store.
    ///
    /// Once the capacity is reached, entries will be evicted to make room for
    /// new entries. If not set, the store is unbounded.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the store.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the store-level time-to-live for all entries.
    ///
    /// A per-entry TTL set on a `StoredEntry` takes precedence over this
    /// store-level setting.
    #[must_use]
    pub fn time_to_live(mut self, duration: Duration) -> Self {
        self.time_to_live = Some(duration);
        self
    }

    /// Sets the time-to-idle for all entries.
    ///
    /// Entries expire after this duration of inactivity (no reads or writes).
    #[must_use]
    pub fn time_to_idle(mut self, duration: Duration) -> Self {
        self.time_to_idle = Some(duration);
        self
    }

    /// Sets a name for the store.
    ///
    /// The name may appear in logs or debugging output from the underlying
    /// cache implementation.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured `MemoryStore`.
    #[must_use]
    pub fn build(self) -> MemoryStore {
        MemoryStore::from_builder(&self)
    }
}
