// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Core storage abstractions for queryveil cache backends.
//!
//! This crate defines the [`Store`] trait that all cache backends must satisfy,
//! along with [`StoredEntry`] for storing query results with their invalidation
//! metadata, [`Pattern`] for wildcard key matching, and [`Error`] types for
//! fallible operations.
//!
//! # Overview
//!
//! The store abstraction separates storage concerns from caching semantics.
//! Implement [`Store`] for your storage backend, then use `queryveil` to add
//! policy resolution, key derivation, read-through dedupe, and write-triggered
//! invalidation on top.
//!
//! A backend must support two independent bulk-deletion routes:
//!
//! - **Reference tags**: every entry carries the tags of the entities it
//!   belongs to; [`Store::invalidate_reference`] deletes all entries tagged
//!   with an exact tag.
//! - **Raw patterns**: [`Store::delete_matching`] deletes every key matching a
//!   `*`-wildcard pattern, reaching entries even when an entry's bookkeeping
//!   is incomplete.
//!
//! # Implementing a Store
//!
//! ```
//! use queryveil_store::{Error, Pattern, Store, StoredEntry};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleStore(RwLock<HashMap<String, StoredEntry>>);
//!
//! impl Store for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), entry);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     async fn invalidate_reference(&self, reference: &str) -> Result<u64, Error> {
//!         let mut map = self.0.write().unwrap();
//!         let before = map.len();
//!         map.retain(|_, entry| !entry.references().contains(&reference.to_owned()));
//!         Ok((before - map.len()) as u64)
//!     }
//!
//!     async fn delete_matching(&self, pattern: &str) -> Result<u64, Error> {
//!         let pattern = Pattern::new(pattern)?;
//!         let mut map = self.0.write().unwrap();
//!         let before = map.len();
//!         map.retain(|key, _| !pattern.matches(key));
//!         Ok((before - map.len()) as u64)
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```

mod entry;
pub mod error;
mod pattern;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::StoredEntry;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use pattern::Pattern;
#[doc(inline)]
pub use store::Store;
