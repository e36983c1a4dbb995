// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache configuration consumed at construction time.
//!
//! Configuration is read once when the cache is built and validated up
//! front; contradictions surface as [`ConfigError`]s there instead of
//! failing individual operations later.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{ConfigError, ReadKind};

/// TTL in seconds applied when a configuration does not set one.
pub const DEFAULT_TTL_SECS: u64 = 60;

/// Global caching configuration with per-entity overrides.
///
/// All fields have defaults, so a configuration file only needs to name what
/// it changes. The serialized field names match the conventional data-access
/// middleware configuration keys.
///
/// # Examples
///
/// ```
/// use queryveil::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{
///     "defaultTtl": 60,
///     "excludedEntities": ["AuditLog"],
///     "models": [
///         {"entity": "Post", "ttl": 300, "relatedEntities": ["Comment"]}
///     ]
/// }"#).unwrap();
/// assert_eq!(config.default_ttl, 60);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Default TTL in seconds for cached reads; [`DEFAULT_TTL_SECS`] when not
    /// set. `0` disables caching for any entity without its own TTL override.
    pub default_ttl: u64,

    /// Entities never cached, regardless of overrides.
    pub excluded_entities: Vec<String>,

    /// Read kinds never cached, for every entity.
    pub excluded_read_kinds: Vec<ReadKind>,

    /// Per-entity overrides, merged over the global defaults.
    pub models: Vec<ModelConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            excluded_entities: Vec::new(),
            excluded_read_kinds: Vec::new(),
            models: Vec::new(),
        }
    }
}

/// Per-entity configuration override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    /// The entity this override applies to.
    pub entity: String,

    /// Cache key prefix; defaults to the entity name.
    pub key_prefix: Option<String>,

    /// TTL override in seconds. `0` disables caching for this entity.
    pub ttl: Option<u64>,

    /// Read kinds excluded for this entity, in addition to the global
    /// exclusions.
    pub excluded_read_kinds: Vec<ReadKind>,

    /// Entities whose cached entries are also purged when this entity is
    /// written.
    pub related_entities: Vec<String>,

    /// Literal wildcard patterns purged on every write to this entity.
    pub invalidation_patterns: Vec<String>,

    /// Whether invalidation also purges keys containing the entity name as a
    /// quoted token. Unset inherits the invoking policy's flag when this
    /// entity is purged as a relation.
    pub substring_invalidation: Option<bool>,
}

impl CacheConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first contradiction found: an unnamed model override, a
    /// duplicate override for one entity, or an empty related-entity name or
    /// invalidation pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for model in &self.models {
            if model.entity.is_empty() {
                return Err(ConfigError::EmptyModelName);
            }
            if !seen.insert(model.entity.as_str()) {
                return Err(ConfigError::DuplicateModel(model.entity.clone()));
            }
            if model.related_entities.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyRelatedEntity(model.entity.clone()));
            }
            if model.invalidation_patterns.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyInvalidationPattern(model.entity.clone()));
            }
        }
        Ok(())
    }

    /// Returns the override for an entity, if one is configured.
    #[must_use]
    pub fn model(&self, entity: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.entity == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(entity: &str) -> ModelConfig {
        ModelConfig {
            entity: entity.to_owned(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn default_config_validates() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn default_config_has_a_nonzero_ttl() {
        assert_eq!(CacheConfig::default().default_ttl, DEFAULT_TTL_SECS);
        assert_ne!(DEFAULT_TTL_SECS, 0, "an unconfigured cache must still cache");
    }

    #[test]
    fn omitted_ttl_deserializes_to_the_default() {
        let config: CacheConfig = serde_json::from_str("{}").expect("config should deserialize");
        assert_eq!(config.default_ttl, DEFAULT_TTL_SECS);
    }

    #[test]
    fn duplicate_model_is_rejected() {
        let config = CacheConfig {
            models: vec![model("Post"), model("Post")],
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateModel(entity)) if entity == "Post"));
    }

    #[test]
    fn empty_model_name_is_rejected() {
        let config = CacheConfig {
            models: vec![model("")],
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyModelName)));
    }

    #[test]
    fn empty_related_entity_is_rejected() {
        let mut bad = model("Post");
        bad.related_entities.push(String::new());
        let config = CacheConfig {
            models: vec![bad],
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRelatedEntity(_))));
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let config: CacheConfig = serde_json::from_str(
            r#"{"defaultTtl": 30, "models": [{"entity": "User", "keyPrefix": "usr", "excludedReadKinds": ["count"]}]}"#,
        )
        .expect("config should deserialize");
        assert_eq!(config.default_ttl, 30);
        let user = config.model("User").expect("override should exist");
        assert_eq!(user.key_prefix.as_deref(), Some("usr"));
        assert_eq!(user.excluded_read_kinds, [ReadKind::Count]);
    }
}
