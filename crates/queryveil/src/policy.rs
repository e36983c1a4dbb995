// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Policy resolution: merging global defaults with per-entity overrides.
//!
//! A [`ResolvedPolicy`] is the answer to "how is this entity cached?" —
//! computed once per distinct entity encountered and memoized in
//! [`PolicyCache`], which is reset when configuration is reloaded.

use std::{collections::HashMap, collections::HashSet, sync::Arc, time::Duration};

use parking_lot::RwLock;

use crate::{CacheConfig, ReadKind};

/// The merged caching policy for one entity.
#[derive(Debug)]
pub struct ResolvedPolicy {
    entity: String,
    prefix: String,
    ttl: Duration,
    excluded_read_kinds: HashSet<ReadKind>,
    excluded_entity: bool,
    related_entities: Vec<String>,
    invalidation_patterns: Vec<String>,
    substring_invalidation: Option<bool>,
}

impl ResolvedPolicy {
    fn resolve(config: &CacheConfig, entity: &str) -> Self {
        let model = config.model(entity);

        let mut excluded_read_kinds: HashSet<ReadKind> = config.excluded_read_kinds.iter().copied().collect();
        let mut prefix = entity.to_owned();
        let mut ttl_secs = config.default_ttl;
        let mut related_entities = Vec::new();
        let mut invalidation_patterns = Vec::new();
        let mut substring_invalidation = None;

        if let Some(model) = model {
            // Per-entity exclusions add to the defaults; everything else
            // overrides them.
            excluded_read_kinds.extend(model.excluded_read_kinds.iter().copied());
            if let Some(key_prefix) = &model.key_prefix {
                prefix.clone_from(key_prefix);
            }
            if let Some(ttl) = model.ttl {
                ttl_secs = ttl;
            }
            related_entities.clone_from(&model.related_entities);
            invalidation_patterns.clone_from(&model.invalidation_patterns);
            substring_invalidation = model.substring_invalidation;
        }

        Self {
            entity: entity.to_owned(),
            prefix,
            ttl: Duration::from_secs(ttl_secs),
            excluded_read_kinds,
            excluded_entity: config.excluded_entities.iter().any(|excluded| excluded == entity),
            related_entities,
            invalidation_patterns,
            substring_invalidation,
        }
    }

    /// Returns `true` if reads of the given kind are cached for this entity.
    #[must_use]
    pub fn caches(&self, kind: ReadKind) -> bool {
        !self.excluded_entity && !self.ttl.is_zero() && !self.excluded_read_kinds.contains(&kind)
    }

    /// Returns the entity name this policy was resolved for.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the cache key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the TTL for cached entries of this entity.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the entities purged alongside this one on writes.
    #[must_use]
    pub fn related_entities(&self) -> &[String] {
        &self.related_entities
    }

    /// Returns the custom wildcard patterns purged on writes.
    #[must_use]
    pub fn invalidation_patterns(&self) -> &[String] {
        &self.invalidation_patterns
    }

    /// Returns whether substring invalidation is enabled.
    ///
    /// `inherited` is used when the entity leaves the flag unset, which
    /// happens when this policy is purged as another entity's relation.
    #[must_use]
    pub fn substring_invalidation(&self, inherited: bool) -> bool {
        self.substring_invalidation.unwrap_or(inherited)
    }
}

/// Process-wide memoization of resolved policies, keyed by entity name.
#[derive(Debug, Default)]
pub(crate) struct PolicyCache {
    resolved: RwLock<HashMap<String, Arc<ResolvedPolicy>>>,
}

impl PolicyCache {
    /// Returns the policy for an entity, resolving and memoizing it on first
    /// use.
    pub(crate) fn resolve(&self, config: &CacheConfig, entity: &str) -> Arc<ResolvedPolicy> {
        if let Some(policy) = self.resolved.read().get(entity) {
            return Arc::clone(policy);
        }

        let mut resolved = self.resolved.write();
        // Double-checked: another caller may have resolved it meanwhile.
        Arc::clone(
            resolved
                .entry(entity.to_owned())
                .or_insert_with(|| Arc::new(ResolvedPolicy::resolve(config, entity))),
        )
    }

    /// Discards all memoized policies, forcing re-resolution against the
    /// current configuration.
    pub(crate) fn reset(&self) {
        self.resolved.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelConfig;

    fn config() -> CacheConfig {
        CacheConfig {
            default_ttl: 60,
            excluded_entities: vec!["AuditLog".to_owned()],
            excluded_read_kinds: vec![ReadKind::Count],
            models: vec![
                ModelConfig {
                    entity: "Post".to_owned(),
                    ttl: Some(300),
                    excluded_read_kinds: vec![ReadKind::Aggregate],
                    related_entities: vec!["Comment".to_owned()],
                    ..ModelConfig::default()
                },
                ModelConfig {
                    entity: "Session".to_owned(),
                    ttl: Some(0),
                    ..ModelConfig::default()
                },
                ModelConfig {
                    entity: "User".to_owned(),
                    key_prefix: Some("usr".to_owned()),
                    substring_invalidation: Some(true),
                    ..ModelConfig::default()
                },
            ],
        }
    }

    #[test]
    fn unconfigured_cache_caches_by_default() {
        let policy = ResolvedPolicy::resolve(&CacheConfig::default(), "Post");
        assert!(policy.caches(ReadKind::FindUnique));
        assert_eq!(policy.ttl(), Duration::from_secs(crate::DEFAULT_TTL_SECS));
    }

    #[test]
    fn defaults_apply_without_override() {
        let policy = ResolvedPolicy::resolve(&config(), "Tag");
        assert_eq!(policy.prefix(), "Tag");
        assert_eq!(policy.ttl(), Duration::from_secs(60));
        assert!(policy.caches(ReadKind::FindMany));
        assert!(!policy.caches(ReadKind::Count));
    }

    #[test]
    fn per_entity_exclusions_add_to_defaults() {
        let policy = ResolvedPolicy::resolve(&config(), "Post");
        assert!(!policy.caches(ReadKind::Count), "global exclusion must survive the merge");
        assert!(!policy.caches(ReadKind::Aggregate), "per-entity exclusion must apply");
        assert!(policy.caches(ReadKind::FindUnique));
        assert_eq!(policy.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn excluded_entity_never_caches() {
        let policy = ResolvedPolicy::resolve(&config(), "AuditLog");
        assert!(!policy.caches(ReadKind::FindUnique));
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let policy = ResolvedPolicy::resolve(&config(), "Session");
        assert!(!policy.caches(ReadKind::FindUnique));
    }

    #[test]
    fn key_prefix_override_applies() {
        let policy = ResolvedPolicy::resolve(&config(), "User");
        assert_eq!(policy.prefix(), "usr");
    }

    #[test]
    fn substring_flag_inherits_when_unset() {
        let post = ResolvedPolicy::resolve(&config(), "Post");
        assert!(!post.substring_invalidation(false));
        assert!(post.substring_invalidation(true), "unset flag should inherit");

        let user = ResolvedPolicy::resolve(&config(), "User");
        assert!(user.substring_invalidation(false), "explicit flag should win over inheritance");
    }

    #[test]
    fn policy_cache_memoizes_and_resets() {
        let config = config();
        let cache = PolicyCache::default();

        let first = cache.resolve(&config, "Post");
        let second = cache.resolve(&config, "Post");
        assert!(Arc::ptr_eq(&first, &second), "second resolve should be memoized");

        cache.reset();
        let third = cache.resolve(&config, "Post");
        assert!(!Arc::ptr_eq(&first, &third), "reset should force re-resolution");
    }
}
