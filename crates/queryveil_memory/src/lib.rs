// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process bounded cache backend for queryveil.
//!
//! This crate provides [`MemoryStore`], a backend over the moka crate, which
//! offers high-performance concurrent caching with `TinyLFU` eviction.
//! Reference-tag invalidation is served from a side index kept in sync with
//! moka's eviction notifications; pattern deletion scans the live keyspace.
//!
//! # Examples
//!
//! ```
//! use queryveil_memory::MemoryStore;
//! use queryveil_store::{Store, StoredEntry};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), queryveil_store::Error> {
//! let store = MemoryStore::with_capacity(10_000);
//!
//! store.set("Post~1", StoredEntry::new(json!({"id": 1}), vec!["Post".to_owned()])).await?;
//! assert!(store.get("Post~1").await?.is_some());
//!
//! store.invalidate_reference("Post").await?;
//! assert!(store.get("Post~1").await?.is_none());
//! # Ok(())
//! # }
//! ```

mod builder;
mod store;

#[doc(inline)]
pub use builder::MemoryStoreBuilder;
#[doc(inline)]
pub use store::MemoryStore;
