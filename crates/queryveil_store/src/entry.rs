// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached query result with its invalidation metadata.
///
/// `StoredEntry` wraps a result payload with the reference tags used for bulk
/// invalidation and an optional per-entry TTL. Entries are serializable so
/// remote backends can persist them as-is.
///
/// # Examples
///
/// ```
/// use queryveil_store::StoredEntry;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let entry = StoredEntry::new(json!({"id": 1}), vec!["Post".to_owned()])
///     .with_ttl(Duration::from_secs(60));
/// assert_eq!(entry.ttl(), Some(Duration::from_secs(60)));
/// assert_eq!(entry.references(), ["Post".to_owned()]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    payload: Value,
    references: Vec<String>,
    ttl: Option<Duration>,
}

impl StoredEntry {
    /// Creates a new entry from a result payload and its reference tags.
    ///
    /// The entry has no TTL; it lives until invalidated or evicted.
    #[must_use]
    pub fn new(payload: Value, references: Vec<String>) -> Self {
        Self {
            payload,
            references,
            ttl: None,
        }
    }

    /// Sets a per-entry TTL, after which the entry expires on its own.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the cached result payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the entry and returns the result payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Returns the reference tags this entry is filed under.
    ///
    /// Reference tags are used only for bulk deletion, never for lookup.
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Returns the per-entry TTL, if set.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_entry_has_no_ttl() {
        let entry = StoredEntry::new(json!(1), vec![]);
        assert!(entry.ttl().is_none());
    }

    #[test]
    fn round_trips_through_serde() {
        let entry = StoredEntry::new(json!({"rows": [1, 2]}), vec!["User".to_owned()]).with_ttl(Duration::from_secs(30));
        let encoded = serde_json::to_string(&entry).expect("entry should serialize");
        let decoded: StoredEntry = serde_json::from_str(&encoded).expect("entry should deserialize");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn into_payload_returns_value() {
        let entry = StoredEntry::new(json!([1, 2, 3]), vec![]);
        assert_eq!(entry.into_payload(), json!([1, 2, 3]));
    }
}
