// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, a configurable in-memory store that
//! records all operations and supports failure injection for testing error
//! paths.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{Error, Pattern, Store, StoredEntry};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed with the given key and entry.
    Set {
        /// The key that was written.
        key: String,
        /// The entry that was written.
        entry: StoredEntry,
    },
    /// A delete operation was performed with the given key.
    Delete(String),
    /// A reference invalidation was performed with the given tag.
    InvalidateReference(String),
    /// A pattern delete was performed with the given pattern.
    DeleteMatching(String),
    /// A clear operation was performed.
    Clear,
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// This store keeps entries in memory and can be configured to fail
/// operations on demand, making it useful for testing error handling paths.
/// All operations are recorded for later verification.
///
/// # Examples
///
/// ```
/// use queryveil_store::{Store, StoredEntry, testing::{MockStore, StoreOp}};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
///
/// store.set("key", StoredEntry::new(json!(1), vec![])).await?;
/// let entry = store.get("key").await?;
/// assert_eq!(*entry.unwrap().payload(), json!(1));
///
/// assert_eq!(store.operations().len(), 2);
/// # Ok::<(), queryveil_store::Error>(())
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use queryveil_store::{Store, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
///
/// // Fail all get operations
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("key").await.is_err());
/// # });
/// ```
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, StoredEntry>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of entries in the store.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should
    /// fail. Failed operations are still recorded.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &StoreOp) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn check(&self, op: StoreOp) -> Result<(), Error> {
        let fail = self.should_fail(&op);
        let label = format!("mock: {op:?} failed");
        self.record(op);
        if fail { Err(Error::from_message(label)) } else { Ok(()) }
    }
}

impl Store for MockStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
        self.check(StoreOp::Get(key.to_owned()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), Error> {
        self.check(StoreOp::Set {
            key: key.to_owned(),
            entry: entry.clone(),
        })?;
        self.data.lock().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.check(StoreOp::Delete(key.to_owned()))?;
        self.data.lock().remove(key);
        Ok(())
    }

    async fn invalidate_reference(&self, reference: &str) -> Result<u64, Error> {
        self.check(StoreOp::InvalidateReference(reference.to_owned()))?;
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, entry| !entry.references().iter().any(|tag| tag == reference));
        Ok((before - data.len()) as u64)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, Error> {
        self.check(StoreOp::DeleteMatching(pattern.to_owned()))?;
        let pattern = Pattern::new(pattern)?;
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|key, _| !pattern.matches(key));
        Ok((before - data.len()) as u64)
    }

    async fn clear(&self) -> Result<(), Error> {
        self.check(StoreOp::Clear)?;
        self.data.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn records_operations_in_order() {
        block_on(async {
            let store = MockStore::new();
            store.set("a", StoredEntry::new(json!(1), vec![])).await.expect("set");
            let _ = store.get("a").await.expect("get");
            store.delete("a").await.expect("delete");

            let ops = store.operations();
            assert!(matches!(ops[0], StoreOp::Set { .. }));
            assert_eq!(ops[1], StoreOp::Get("a".to_owned()));
            assert_eq!(ops[2], StoreOp::Delete("a".to_owned()));
        });
    }

    #[test]
    fn invalidate_reference_removes_tagged_entries() {
        block_on(async {
            let store = MockStore::new();
            store
                .set("Post~1", StoredEntry::new(json!(1), vec!["Post".to_owned()]))
                .await
                .expect("set");
            store
                .set("Comment~1", StoredEntry::new(json!(2), vec!["Comment".to_owned()]))
                .await
                .expect("set");

            let removed = store.invalidate_reference("Post").await.expect("invalidate");
            assert_eq!(removed, 1);
            assert!(!store.contains_key("Post~1"));
            assert!(store.contains_key("Comment~1"));
        });
    }

    #[test]
    fn delete_matching_removes_by_pattern() {
        block_on(async {
            let store = MockStore::new();
            store.set("Post~1", StoredEntry::new(json!(1), vec![])).await.expect("set");
            store.set("Post~2", StoredEntry::new(json!(2), vec![])).await.expect("set");
            store.set("User~1", StoredEntry::new(json!(3), vec![])).await.expect("set");

            let removed = store.delete_matching("Post~*").await.expect("delete");
            assert_eq!(removed, 2);
            assert_eq!(store.entry_count(), 1);
        });
    }

    #[test]
    fn failure_predicate_scopes_to_matching_ops() {
        block_on(async {
            let store = MockStore::new();
            store.fail_when(|op| matches!(op, StoreOp::Get(key) if key == "bad"));

            assert!(store.get("bad").await.is_err());
            assert!(store.get("good").await.is_ok());

            store.clear_failures();
            assert!(store.get("bad").await.is_ok());
        });
    }
}
