// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Computes which references and key patterns a write purges.

use std::sync::Arc;

use crate::{key::KEY_SEPARATOR, policy::ResolvedPolicy};

/// Everything a single write invalidates: reference tags for backends with an
/// index, and wildcard patterns for raw keyspace scans.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PurgeSet {
    pub references: Vec<String>,
    pub patterns: Vec<String>,
}

impl PurgeSet {
    /// Builds the purge set for a write against `policy`, given the already
    /// resolved policies of its related entities.
    pub(crate) fn build(policy: &ResolvedPolicy, related: &[Arc<ResolvedPolicy>]) -> Self {
        let mut set = Self::default();
        set.add_entity(policy, policy.substring_invalidation(false));

        // Related entities use their own substring setting when they have
        // one, and otherwise inherit the written entity's.
        let inherited = policy.substring_invalidation(false);
        for related in related {
            set.add_entity(related, related.substring_invalidation(inherited));
        }

        for pattern in policy.invalidation_patterns() {
            set.push_pattern(pattern.clone());
        }
        set
    }

    fn add_entity(&mut self, policy: &ResolvedPolicy, substring: bool) {
        let prefix = policy.prefix();
        self.references.push(prefix.to_owned());
        self.push_pattern(format!("*{prefix}{KEY_SEPARATOR}*"));
        self.push_pattern(format!("{prefix}{KEY_SEPARATOR}*"));

        if substring {
            let entity = policy.entity();
            self.push_pattern(format!("*\"{entity}\"*"));
            self.push_pattern(format!("*\"{}\"*", entity.to_lowercase()));
        }
    }

    fn push_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}
