// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observation hooks for cache activity.

/// A sink for cache lifecycle notifications.
///
/// All callbacks are fire-and-forget: they must not block, and nothing the
/// cache does depends on their outcome. The default sink is [`NoopEvents`].
pub trait EventSink: Send + Sync {
    /// A read was served from the cache.
    fn hit(&self, key: &str) {
        let _ = key;
    }

    /// A read missed the cache and executed upstream.
    fn miss(&self, key: &str) {
        let _ = key;
    }

    /// A read attached to an in-flight upstream execution for the same key.
    fn join(&self, key: &str) {
        let _ = key;
    }

    /// A storage backend operation failed and was recovered from.
    fn error(&self, key: &str, message: &str) {
        let _ = (key, message);
    }
}

/// An [`EventSink`] that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl EventSink for NoopEvents {}
