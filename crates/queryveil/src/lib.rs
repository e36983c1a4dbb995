// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query-result caching with policy-driven invalidation and dedupe.
//!
//! This crate sits between a data-access layer and its upstream executor:
//! - Read results are cached under a key derived from the entity's key
//!   prefix and a canonical hash of the operation's arguments
//! - Concurrent identical misses collapse into a single upstream call
//! - Successful writes purge the written entity, its related entities, and
//!   any custom invalidation patterns
//! - Per-entity policy (TTL, key prefix, exclusions) is merged from global
//!   defaults and per-model overrides
//!
//! Storage backends implement [`Store`]; an in-process bounded backend
//! (feature `memory`, on by default) and a Redis backend (feature `redis`)
//! are provided.
//!
//! # Examples
//!
//! ```no_run
//! use queryveil::{Operation, QueryCache, QueryExecutor, ReadKind, UpstreamError};
//! use serde_json::{Value, json};
//!
//! struct Db;
//!
//! impl QueryExecutor for Db {
//!     async fn execute(&self, _operation: &Operation) -> Result<Value, UpstreamError> {
//!         // Run the operation against the real database here.
//!         Ok(json!({"id": 1, "title": "hello"}))
//!     }
//! }
//!
//! # async fn example() -> Result<(), UpstreamError> {
//! let cache = QueryCache::builder(Db).memory().build().unwrap();
//!
//! let read = Operation::read("Post", ReadKind::FindUnique, json!({"where": {"id": 1}}));
//! let first = cache.execute(&read).await?; // executes upstream, caches
//! let second = cache.execute(&read).await?; // served from cache
//! assert_eq!(first, second);
//! # Ok(())
//! # }
//! ```

mod builder;
mod cache;
mod config;
mod error;
mod events;
mod flight;
mod invalidate;
mod key;
mod operation;
mod policy;

pub use builder::QueryCacheBuilder;
pub use cache::{QueryCache, QueryExecutor};
pub use config::{CacheConfig, DEFAULT_TTL_SECS, ModelConfig};
pub use error::{ConfigError, UpstreamError};
pub use events::{EventSink, NoopEvents};
pub use operation::{Operation, OperationKind, ReadKind, WriteKind};
pub use policy::ResolvedPolicy;
#[cfg(feature = "memory")]
#[doc(inline)]
pub use queryveil_memory::{MemoryStore, MemoryStoreBuilder};
#[cfg(feature = "redis")]
#[doc(inline)]
pub use queryveil_redis::RedisStore;
#[doc(inline)]
pub use queryveil_store::{Error as StoreError, Pattern, Store, StoredEntry};

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use queryveil_store::testing::{MockStore, StoreOp};
