// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The database operation model.
//!
//! An [`Operation`] describes one request to the data-access layer: which
//! entity it touches, whether it reads or writes, its arguments, and whether
//! it runs inside a transaction. Operations are created per call, are
//! immutable, and are consumed once.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read operation kinds.
///
/// Serialized names match the conventional data-access layer method names
/// (`findUnique`, `findMany`, ...) so configuration files can exclude kinds
/// by the names the host application already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadKind {
    /// Single-row lookup by unique key.
    FindUnique,
    /// First row matching a filter.
    FindFirst,
    /// All rows matching a filter.
    FindMany,
    /// Row count for a filter.
    Count,
    /// Aggregation over a filter.
    Aggregate,
    /// Grouped aggregation.
    GroupBy,
}

/// Write operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteKind {
    /// Insert a single row.
    Create,
    /// Insert many rows.
    CreateMany,
    /// Update a single row.
    Update,
    /// Update many rows.
    UpdateMany,
    /// Insert-or-update a single row.
    Upsert,
    /// Delete a single row.
    Delete,
    /// Delete many rows.
    DeleteMany,
}

/// The kind of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A read; eligible for caching and dedupe.
    Read(ReadKind),
    /// A write; bypasses caching and triggers invalidation on success.
    Write(WriteKind),
    /// A raw or meta operation with no entity; never cached, never
    /// invalidating.
    Raw,
}

/// A single request to the database layer.
///
/// # Examples
///
/// ```
/// use queryveil::{Operation, ReadKind};
/// use serde_json::json;
///
/// let operation = Operation::read("Post", ReadKind::FindUnique, json!({"id": 1}));
/// assert_eq!(operation.entity(), Some("Post"));
/// assert!(!operation.in_transaction());
/// ```
#[derive(Debug, Clone)]
pub struct Operation {
    entity: Option<String>,
    kind: OperationKind,
    arguments: Value,
    in_transaction: bool,
}

impl Operation {
    /// Creates a read operation on the given entity.
    #[must_use]
    pub fn read(entity: impl Into<String>, kind: ReadKind, arguments: Value) -> Self {
        Self {
            entity: Some(entity.into()),
            kind: OperationKind::Read(kind),
            arguments,
            in_transaction: false,
        }
    }

    /// Creates a write operation on the given entity.
    #[must_use]
    pub fn write(entity: impl Into<String>, kind: WriteKind, arguments: Value) -> Self {
        Self {
            entity: Some(entity.into()),
            kind: OperationKind::Write(kind),
            arguments,
            in_transaction: false,
        }
    }

    /// Creates a raw/meta operation with no entity.
    #[must_use]
    pub fn raw(arguments: Value) -> Self {
        Self {
            entity: None,
            kind: OperationKind::Raw,
            arguments,
            in_transaction: false,
        }
    }

    /// Marks this operation as running inside a transaction.
    ///
    /// Transactional reads bypass the cache so a transaction observes its own
    /// uncommitted writes; transactional writes still invalidate on success.
    #[must_use]
    pub fn transactional(mut self) -> Self {
        self.in_transaction = true;
        self
    }

    /// Returns the logical entity name, if any.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Returns the operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the operation arguments.
    #[must_use]
    pub fn arguments(&self) -> &Value {
        &self.arguments
    }

    /// Returns `true` if the operation runs inside a transaction.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}
