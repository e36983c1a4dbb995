// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Redis-backed remote store for queryveil.
//!
//! This crate provides [`RedisStore`], a backend over a shared Redis server.
//! Entries are stored as JSON strings with Redis-native TTL expiration;
//! reference tags are mirrored into Redis sets for exact-tag invalidation,
//! and raw pattern deletion walks the keyspace with `SCAN MATCH`.
//!
//! All keys live under a configurable namespace so several applications (or
//! several caches) can share one Redis database without interfering.
//!
//! # Examples
//!
//! ```no_run
//! use queryveil_redis::RedisStore;
//! use queryveil_store::{Store, StoredEntry};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), queryveil_store::Error> {
//! let store = RedisStore::connect("redis://127.0.0.1/").await?;
//!
//! store.set("Post~1", StoredEntry::new(json!({"id": 1}), vec!["Post".to_owned()])).await?;
//! store.invalidate_reference("Post").await?;
//! # Ok(())
//! # }
//! ```

mod store;

#[doc(inline)]
pub use store::RedisStore;
