// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for constructing a [`QueryCache`].

use std::sync::Arc;

use queryveil_store::Store;

use crate::{CacheConfig, ConfigError, EventSink, NoopEvents, QueryCache, QueryExecutor};

#[cfg(feature = "memory")]
use queryveil_memory::MemoryStore;

/// Builder for a [`QueryCache`].
///
/// Created by [`QueryCache::builder`]. A storage backend must be selected
/// with [`storage`](Self::storage) or [`memory`](Self::memory) before
/// [`build`](Self::build) becomes available.
///
/// # Examples
///
/// ```no_run
/// # use queryveil::{Operation, QueryCache, QueryExecutor, UpstreamError};
/// # use serde_json::Value;
/// # struct Db;
/// # impl QueryExecutor for Db {
/// #     async fn execute(&self, _operation: &Operation) -> Result<Value, UpstreamError> {
/// #         Ok(Value::Null)
/// #     }
/// # }
/// let cache = QueryCache::builder(Db)
///     .memory()
///     .build()
///     .unwrap();
/// ```
pub struct QueryCacheBuilder<X, S = ()> {
    executor: X,
    storage: S,
    config: CacheConfig,
    events: Arc<dyn EventSink>,
}

impl<X, S> std::fmt::Debug for QueryCacheBuilder<X, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCacheBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<X> QueryCacheBuilder<X, ()> {
    pub(crate) fn new(executor: X) -> Self {
        Self {
            executor,
            storage: (),
            config: CacheConfig::default(),
            events: Arc::new(NoopEvents),
        }
    }

    /// Sets a custom storage backend.
    ///
    /// Use this to plug in your own [`Store`] implementation instead of the
    /// built-in options like [`memory`](Self::memory).
    pub fn storage<S>(self, storage: S) -> QueryCacheBuilder<X, S>
    where
        S: Store,
    {
        QueryCacheBuilder {
            executor: self.executor,
            storage,
            config: self.config,
            events: self.events,
        }
    }

    /// Configures the cache to use in-process bounded storage.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self) -> QueryCacheBuilder<X, MemoryStore> {
        self.storage(MemoryStore::new())
    }
}

impl<X, S> QueryCacheBuilder<X, S> {
    /// Sets the caching configuration.
    ///
    /// Without this, every entity is cached under the defaults of
    /// [`CacheConfig::default`].
    #[must_use]
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the sink notified of cache hits, misses, joins, and recovered
    /// backend errors.
    #[must_use]
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl<X, S> QueryCacheBuilder<X, S>
where
    X: QueryExecutor,
    S: Store,
{
    /// Validates the configuration and constructs the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is contradictory, for
    /// example a model entry with an empty entity name.
    pub fn build(self) -> Result<QueryCache<X, S>, ConfigError> {
        self.config.validate()?;
        Ok(QueryCache::new(self.executor, self.storage, self.config, self.events))
    }
}
