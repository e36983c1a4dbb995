// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for the caching layer.
//!
//! The taxonomy is deliberately narrow. Upstream failures are wrapped in
//! [`UpstreamError`] and always propagate to the caller; storage backend
//! failures ([`queryveil_store::Error`]) are recovered internally and only
//! surface through the event hooks; configuration problems are
//! [`ConfigError`]s raised once at construction, never per call.

use std::sync::Arc;

/// An error returned by the upstream query executor.
///
/// The original cause is held behind an `Arc` so one upstream failure can be
/// delivered to every caller deduped onto the same in-flight query while the
/// source chain stays intact.
///
/// # Examples
///
/// ```
/// use queryveil::UpstreamError;
///
/// let error = UpstreamError::from_message("unique constraint violated");
/// assert!(error.to_string().contains("unique constraint violated"));
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamError {
    source: Arc<dyn std::error::Error + Send + Sync>,
}

impl UpstreamError {
    /// Creates a new error from any type that can be converted to an error.
    pub fn caused_by(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: Arc::from(cause.into()),
        }
    }

    /// Creates a new error from a message or error value.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream query failed: {}", self.source)
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source as &(dyn std::error::Error + 'static))
    }
}

/// A configuration problem detected at construction time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A model override has an empty entity name.
    #[error("model configuration with an empty entity name")]
    EmptyModelName,

    /// Two model overrides target the same entity.
    #[error("duplicate model configuration for entity `{0}`")]
    DuplicateModel(String),

    /// A model override declares an empty related entity name.
    #[error("model `{0}` declares an empty related entity name")]
    EmptyRelatedEntity(String),

    /// A model override declares an empty custom invalidation pattern.
    #[error("model `{0}` declares an empty invalidation pattern")]
    EmptyInvalidationPattern(String),
}
