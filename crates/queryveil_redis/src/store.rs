// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Redis store implementation over a managed connection.

use queryveil_store::{Error, Store, StoredEntry};
use redis::{AsyncCommands, aio::ConnectionManager};

/// Default namespace prepended to every key this store touches.
const DEFAULT_NAMESPACE: &str = "queryveil:";

/// `SCAN` page size used for pattern deletion.
const SCAN_COUNT: usize = 100;

fn data_key(namespace: &str, key: &str) -> String {
    format!("{namespace}{key}")
}

fn reference_key(namespace: &str, reference: &str) -> String {
    format!("{namespace}ref~{reference}")
}

/// A remote store backed by Redis.
///
/// Entries are serialized to JSON and written with `SET`/`SETEX` so Redis
/// enforces per-entry TTLs natively. Each reference tag owns a Redis set
/// listing the keys filed under it, giving `invalidate_reference` an exact
/// membership lookup; `delete_matching` instead walks the raw keyspace with
/// `SCAN MATCH`, reaching entries whose tag bookkeeping is missing or stale.
///
/// The store holds a [`ConnectionManager`], which multiplexes commands and
/// transparently reconnects; cloning the store is cheap and all clones share
/// the connection.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    namespace: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to a Redis server and returns a store using the default
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the initial connection
    /// cannot be established.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(Error::caused_by)?;
        let manager = ConnectionManager::new(client).await.map_err(Error::caused_by)?;
        Ok(Self::new(manager))
    }

    /// Creates a store over an existing managed connection.
    ///
    /// Use this when the host application already owns a Redis connection
    /// handle it wants the cache to share.
    #[must_use]
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    /// Replaces the key namespace.
    ///
    /// Every key, reference set, and scan pattern is prefixed with the
    /// namespace, so distinct namespaces never interfere within one database.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the namespace in use.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Collects every key matching the (already namespaced) pattern.
    ///
    /// Drives `SCAN` manually so large keyspaces are walked in pages instead
    /// of blocking the server the way `KEYS` would.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, Error> {
        let mut connection = self.manager.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut connection)
                .await
                .map_err(Error::caused_by)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn delete_keys(&self, keys: Vec<String>) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut connection = self.manager.clone();
        connection.del(keys).await.map_err(Error::caused_by)
    }
}

impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
        let mut connection = self.manager.clone();
        let raw: Option<String> = connection
            .get(data_key(&self.namespace, key))
            .await
            .map_err(Error::caused_by)?;
        match raw {
            Some(raw) => {
                let entry = serde_json::from_str(&raw).map_err(Error::caused_by)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), Error> {
        let raw = serde_json::to_string(&entry).map_err(Error::caused_by)?;
        let key = data_key(&self.namespace, key);

        let mut connection = self.manager.clone();
        match entry.ttl() {
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                let () = connection.set_ex(&key, raw, seconds).await.map_err(Error::caused_by)?;
            }
            None => {
                let () = connection.set(&key, raw).await.map_err(Error::caused_by)?;
            }
        }

        for reference in entry.references() {
            let () = connection
                .sadd(reference_key(&self.namespace, reference), &key)
                .await
                .map_err(Error::caused_by)?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut connection = self.manager.clone();
        let _: u64 = connection
            .del(data_key(&self.namespace, key))
            .await
            .map_err(Error::caused_by)?;
        Ok(())
    }

    async fn invalidate_reference(&self, reference: &str) -> Result<u64, Error> {
        let reference_key = reference_key(&self.namespace, reference);

        let mut connection = self.manager.clone();
        let members: Vec<String> = connection.smembers(&reference_key).await.map_err(Error::caused_by)?;

        let removed = self.delete_keys(members).await?;
        let _: u64 = connection.del(&reference_key).await.map_err(Error::caused_by)?;
        Ok(removed)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, Error> {
        let keys = self.scan_keys(&format!("{}{pattern}", self.namespace)).await?;
        self.delete_keys(keys).await
    }

    async fn clear(&self) -> Result<(), Error> {
        let keys = self.scan_keys(&format!("{}*", self.namespace)).await?;
        let _ = self.delete_keys(keys).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_key_prefixes_namespace() {
        assert_eq!(data_key("queryveil:", "Post~1"), "queryveil:Post~1");
        assert_eq!(data_key("", "Post~1"), "Post~1");
    }

    #[test]
    fn reference_key_is_disjoint_from_data_keys() {
        let reference = reference_key("queryveil:", "Post");
        assert_eq!(reference, "queryveil:ref~Post");
        // A reference set must never match the entity's own purge pattern.
        let pattern = queryveil_store::Pattern::new("Post~*").expect("pattern should compile");
        assert!(!pattern.matches(&reference));
    }
}
