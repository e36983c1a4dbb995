// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Duplicate suppression for concurrent cache population.
//!
//! When several tasks miss the cache on the same key at the same time, only
//! one (the leader) runs the upstream query. The rest (followers) suspend
//! until the leader finishes and receive a clone of its result. If a leader
//! is cancelled or panics before storing a result, a waiting follower
//! promotes itself and runs the query in its place.

use std::{
    collections::HashMap,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;

type SharedMapping<T> = Arc<SyncMutex<HashMap<String, BroadcastOnce<T>>>>;

/// How a caller obtained its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome<T> {
    /// This caller executed the work itself.
    Led(T),
    /// This caller received the value from a concurrent execution.
    Joined(T),
}

/// A space in which keyed units of work execute with duplicate suppression.
#[derive(Debug)]
pub(crate) struct FlightGroup<T> {
    mapping: SharedMapping<T>,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self { mapping: Arc::default() }
    }
}

struct Shared<T> {
    slot: AsyncMutex<Option<T>>,
    claimed: AtomicBool,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            slot: AsyncMutex::new(None),
            claimed: AtomicBool::new(false),
        }
    }
}

/// RAII guard that releases the leader claim on drop.
struct LeaderGuard<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> LeaderGuard<T> {
    fn try_claim(shared: &Arc<Shared<T>>) -> Option<Self> {
        shared
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| Self {
                shared: Some(Arc::clone(shared)),
            })
    }

    /// Consumes the guard without releasing the claim (the result is stored,
    /// so nobody should promote anymore).
    fn disarm(mut self) {
        drop(self.shared.take());
    }
}

impl<T> Drop for LeaderGuard<T> {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            shared.claimed.store(false, Ordering::Release);
        }
    }
}

/// Weak handle to one in-flight execution, kept in the mapping.
struct BroadcastOnce<T> {
    shared: Weak<Shared<T>>,
}

impl<T> BroadcastOnce<T> {
    fn new() -> (Self, Arc<Shared<T>>) {
        let shared = Arc::new(Shared::new());
        (
            Self {
                shared: Arc::downgrade(&shared),
            },
            shared,
        )
    }
}

impl<T> std::fmt::Debug for BroadcastOnce<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BroadcastOnce")
    }
}

enum Role<T, F> {
    Leader { func: F, guard: LeaderGuard<T> },
    // Followers keep their closure in case every leader drops and they must
    // promote themselves.
    Follower { func: F },
}

struct Waiter<T, F> {
    role: Role<T, F>,
    shared: Arc<Shared<T>>,
    key: String,
    mapping: SharedMapping<T>,
}

impl<T, F, Fut> Waiter<T, F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
    T: Clone,
{
    async fn wait(self) -> Outcome<T> {
        let Self {
            role,
            shared,
            key,
            mapping,
        } = self;
        match role {
            Role::Leader { func, guard } => Self::wait_as_leader(shared, key, mapping, func, guard).await,
            Role::Follower { func } => Self::wait_as_follower(shared, key, mapping, func).await,
        }
    }

    async fn wait_as_leader(shared: Arc<Shared<T>>, key: String, mapping: SharedMapping<T>, func: F, guard: LeaderGuard<T>) -> Outcome<T> {
        // Lock the slot before executing so followers suspend on it until the
        // result is in.
        let mut slot = shared.slot.lock().await;

        if let Some(value) = slot.as_ref() {
            let result = value.clone();
            drop(slot);
            guard.disarm();
            return Outcome::Joined(result);
        }

        let value = func().await;
        *slot = Some(value.clone());
        drop(slot);

        mapping.lock().remove(&key);
        guard.disarm();
        Outcome::Led(value)
    }

    async fn wait_as_follower(shared: Arc<Shared<T>>, key: String, mapping: SharedMapping<T>, func: F) -> Outcome<T> {
        loop {
            // The leader holds the slot lock while it executes, so this
            // suspends until it stores a result or drops.
            let slot = shared.slot.lock().await;
            if let Some(value) = slot.as_ref() {
                return Outcome::Joined(value.clone());
            }
            drop(slot);

            // No result and the lock was free: the leader was cancelled.
            // Promote, unless a concurrently promoted follower wins the
            // claim, in which case go back to waiting on it.
            if let Some(guard) = LeaderGuard::try_claim(&shared) {
                return Self::wait_as_leader(shared, key, mapping, func, guard).await;
            }
        }
    }
}

impl<T> FlightGroup<T>
where
    T: Clone,
{
    /// Executes `func` for `key`, unless an execution for the same key is
    /// already in flight, in which case the caller waits for that execution
    /// and receives a clone of its result.
    pub(crate) fn work<F, Fut>(&self, key: &str, func: F) -> impl Future<Output = Outcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let owned_mapping = Arc::clone(&self.mapping);
        let mut mapping = self.mapping.lock();
        if let Some(call) = mapping.get_mut(key) {
            if let Some(shared) = call.shared.upgrade() {
                let role = match LeaderGuard::try_claim(&shared) {
                    Some(guard) => Role::Leader { func, guard },
                    None => Role::Follower { func },
                };
                return Waiter {
                    role,
                    shared,
                    key: key.to_owned(),
                    mapping: owned_mapping,
                }
                .wait();
            }

            // Every waiter dropped before finishing. Start over.
            let (new_call, shared) = BroadcastOnce::new();
            *call = new_call;
            return Self::leader(shared, key.to_owned(), owned_mapping, func).wait();
        }

        let (call, shared) = BroadcastOnce::new();
        mapping.insert(key.to_owned(), call);
        Self::leader(shared, key.to_owned(), owned_mapping, func).wait()
    }

    fn leader<F>(shared: Arc<Shared<T>>, key: String, mapping: SharedMapping<T>, func: F) -> Waiter<T, F> {
        let guard = LeaderGuard::try_claim(&shared).expect("fresh execution has no leader");
        Waiter {
            role: Role::Leader { func, guard },
            shared,
            key,
            mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn value<T>(outcome: Outcome<T>) -> T {
        match outcome {
            Outcome::Led(value) | Outcome::Joined(value) => value,
        }
    }

    #[tokio::test]
    async fn single_caller_leads() {
        let group = FlightGroup::default();
        let outcome = group.work("k", || async { 7 }).await;
        assert_eq!(outcome, Outcome::Led(7));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let group = Arc::new(FlightGroup::default());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let group = Arc::clone(&group);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                let outcome = group
                    .work("k", move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        42
                    })
                    .await;
                value(outcome)
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share() {
        let group = Arc::new(FlightGroup::default());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..4 {
            let group = Arc::clone(&group);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                let outcome = group
                    .work(&format!("k{i}"), move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        i
                    })
                    .await;
                value(outcome)
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), i);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn key_is_reusable_after_completion() {
        let group = FlightGroup::default();
        let first = group.work("k", || async { 1 }).await;
        let second = group.work("k", || async { 2 }).await;
        assert_eq!(first, Outcome::Led(1));
        assert_eq!(second, Outcome::Led(2), "completed flights must not pin their key");
    }

    #[tokio::test]
    async fn follower_promotes_when_leader_is_cancelled() {
        let group = Arc::new(FlightGroup::default());

        let leader = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .work("k", || async {
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let follower = {
            let group = Arc::clone(&group);
            tokio::spawn(async move { group.work("k", || async { 2 }).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        leader.abort();
        assert_eq!(follower.await.unwrap(), Outcome::Led(2));
    }

    #[tokio::test]
    async fn followers_racing_to_promote_all_complete() {
        let group = Arc::new(FlightGroup::default());
        let executions = Arc::new(AtomicUsize::new(0));

        let leader = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .work("k", || async {
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        0
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let mut followers = Vec::new();
        for _ in 0..8 {
            let group = Arc::clone(&group);
            let executions = Arc::clone(&executions);
            followers.push(tokio::spawn(async move {
                let outcome = group
                    .work("k", move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        9
                    })
                    .await;
                value(outcome)
            }));
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        leader.abort();
        for follower in followers {
            assert_eq!(follower.await.unwrap(), 9);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1, "only one follower may promote");
    }
}
