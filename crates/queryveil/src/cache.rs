// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The read-through caching engine.

use std::sync::Arc;

use futures::future::{join, join_all};
use queryveil_store::{Store, StoredEntry};
use serde_json::Value;

use crate::{
    CacheConfig, ConfigError, EventSink, Operation, OperationKind, ReadKind, UpstreamError,
    flight::{FlightGroup, Outcome},
    invalidate::PurgeSet,
    key,
    policy::PolicyCache,
};

/// The upstream query executor, typically a database or ORM client.
///
/// The caching layer never interprets results beyond cloning them; whatever
/// JSON value the executor produces is what cached readers receive.
pub trait QueryExecutor: Send + Sync {
    /// Executes an operation against the upstream data source.
    fn execute(&self, operation: &Operation) -> impl Future<Output = Result<Value, UpstreamError>> + Send;
}

/// A query-result cache interposed between a data-access layer and its
/// executor.
///
/// Reads are served from the configured [`Store`] when possible; concurrent
/// identical misses collapse into a single upstream call. Successful writes
/// purge the entries of the written entity and its related entities.
///
/// Construct one with [`QueryCacheBuilder`](crate::QueryCacheBuilder).
pub struct QueryCache<X, S> {
    executor: X,
    store: S,
    config: CacheConfig,
    policies: PolicyCache,
    flights: FlightGroup<Result<Value, UpstreamError>>,
    events: Arc<dyn EventSink>,
}

impl<X, S> std::fmt::Debug for QueryCache<X, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<X> QueryCache<X, ()> {
    /// Starts building a cache around the given upstream executor.
    pub fn builder(executor: X) -> crate::QueryCacheBuilder<X, ()> {
        crate::QueryCacheBuilder::new(executor)
    }
}

impl<X, S> QueryCache<X, S>
where
    X: QueryExecutor,
    S: Store,
{
    pub(crate) fn new(executor: X, store: S, config: CacheConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            executor,
            store,
            config,
            policies: PolicyCache::default(),
            flights: FlightGroup::default(),
            events,
        }
    }

    /// Executes an operation, routing it through the cache when applicable.
    ///
    /// Reads of cacheable (entity, kind) pairs are served from the backend
    /// or populate it; writes execute upstream and then invalidate. Raw
    /// operations and operations inside a transaction pass straight through.
    pub async fn execute(&self, operation: &Operation) -> Result<Value, UpstreamError> {
        match operation.kind() {
            OperationKind::Read(kind) => self.read(operation, kind).await,
            OperationKind::Write(_) => self.write(operation).await,
            OperationKind::Raw => self.executor.execute(operation).await,
        }
    }

    async fn read(&self, operation: &Operation, kind: ReadKind) -> Result<Value, UpstreamError> {
        let Some(entity) = operation.entity().filter(|entity| !entity.is_empty()) else {
            return self.executor.execute(operation).await;
        };
        // A transaction must observe its own uncommitted writes.
        if operation.in_transaction() {
            return self.executor.execute(operation).await;
        }

        let policy = self.policies.resolve(&self.config, entity);
        if !policy.caches(kind) {
            return self.executor.execute(operation).await;
        }

        let cache_key = key::derive(policy.prefix(), kind, operation.arguments());
        match self.store.get(&cache_key).await {
            Ok(Some(entry)) => {
                tracing::debug!(key = %cache_key, "cache hit");
                self.events.hit(&cache_key);
                return Ok(entry.into_payload());
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(key = %cache_key, %error, "cache read failed, executing upstream");
                self.events.error(&cache_key, &error.to_string());
                return self.executor.execute(operation).await;
            }
        }

        let outcome = self
            .flights
            .work(&cache_key, || self.populate(operation, &cache_key, policy.prefix(), policy.ttl()))
            .await;
        match outcome {
            Outcome::Led(result) => {
                self.events.miss(&cache_key);
                result
            }
            Outcome::Joined(result) => {
                tracing::debug!(key = %cache_key, "joined in-flight execution");
                self.events.join(&cache_key);
                result
            }
        }
    }

    /// Leader body for a cache miss: execute upstream and, on success, store
    /// the result. Store failures never reach the caller.
    async fn populate(&self, operation: &Operation, cache_key: &str, prefix: &str, ttl: std::time::Duration) -> Result<Value, UpstreamError> {
        let result = self.executor.execute(operation).await;
        if let Ok(value) = &result {
            let entry = StoredEntry::new(value.clone(), vec![prefix.to_owned()]).with_ttl(ttl);
            if let Err(error) = self.store.set(cache_key, entry).await {
                tracing::warn!(key = %cache_key, %error, "cache store failed");
                self.events.error(cache_key, &error.to_string());
            }
        }
        result
    }

    async fn write(&self, operation: &Operation) -> Result<Value, UpstreamError> {
        let value = self.executor.execute(operation).await?;
        // Failed writes change nothing, so only a successful one invalidates.
        // This also covers writes inside a transaction: the cache was
        // bypassed for their reads, but committed data still changed.
        if let Some(entity) = operation.entity().filter(|entity| !entity.is_empty()) {
            self.invalidate(entity).await;
        }
        Ok(value)
    }

    /// Purges every cached entry affected by a write on `entity`, including
    /// its related entities and custom patterns.
    ///
    /// Backend failures are reported through the event sink and logs; they
    /// never surface to the caller.
    pub async fn invalidate(&self, entity: &str) {
        let policy = self.policies.resolve(&self.config, entity);
        let related: Vec<_> = policy
            .related_entities()
            .iter()
            .map(|related| self.policies.resolve(&self.config, related))
            .collect();
        let purge = PurgeSet::build(&policy, &related);
        tracing::debug!(entity, references = purge.references.len(), patterns = purge.patterns.len(), "invalidating");

        let references = purge.references.iter().map(|reference| async move {
            if let Err(error) = self.store.invalidate_reference(reference).await {
                tracing::warn!(reference, %error, "reference invalidation failed");
                self.events.error(reference, &error.to_string());
            }
        });
        let patterns = purge.patterns.iter().map(|pattern| async move {
            if let Err(error) = self.store.delete_matching(pattern).await {
                tracing::warn!(pattern, %error, "pattern invalidation failed");
                self.events.error(pattern, &error.to_string());
            }
        });
        join(join_all(references), join_all(patterns)).await;
    }

    /// Replaces the configuration, discarding all memoized policies.
    ///
    /// Already cached entries are untouched; they age out under the TTL they
    /// were stored with.
    pub fn reload_config(&mut self, config: CacheConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.policies.reset();
        Ok(())
    }

    /// Returns the storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }
}
