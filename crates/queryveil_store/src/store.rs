// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`Store`] defines the interface that all queryveil backends must implement.
//! The trait is designed for composition: implement the storage operations,
//! then let `queryveil` layer policy resolution, read-through dedupe, and
//! invalidation on top.

use crate::{Error, StoredEntry};

/// Trait for cache storage backends.
///
/// Implement this trait to plug a storage backend into queryveil. Backends
/// must be safe for concurrent use; the caching layer never serializes calls
/// to them.
///
/// Beyond point operations (`get`, `set`, `delete`), a backend supports two
/// bulk-deletion routes used by write-triggered invalidation:
/// `invalidate_reference` removes every entry tagged with an exact reference
/// tag, and `delete_matching` removes every key matching a `*`-wildcard
/// pattern against the raw keyspace.
pub trait Store: Send + Sync {
    /// Gets an entry, returning an error if the operation fails.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<StoredEntry>, Error>> + Send;

    /// Stores an entry under the key, overwriting any previous entry.
    ///
    /// The entry's own TTL, if set, bounds its lifetime.
    fn set(&self, key: &str, entry: StoredEntry) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes a single entry, returning an error if the operation fails.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes every entry tagged with the given reference tag.
    ///
    /// Returns the number of entries removed.
    fn invalidate_reference(&self, reference: &str) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Deletes every entry whose key matches the wildcard pattern.
    ///
    /// This operates on the raw keyspace, independent of reference-tag
    /// bookkeeping. Returns the number of entries removed.
    fn delete_matching(&self, pattern: &str) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Clears all entries, returning an error if the operation fails.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;
}
