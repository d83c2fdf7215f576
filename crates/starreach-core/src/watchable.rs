//! Exclusive mutation and change subscription for a single entity.
//!
//! A [`Watchable`] holds the committed snapshot of one entity behind an
//! [`Arc`]. Readers clone the `Arc` and never wait on a mutation in flight.
//! Mutations are serialized per entity by an async gate and follow the same
//! sequence every time:
//!
//! ```text
//! lock gate -> clone snapshot -> apply -> bump version -> persist
//!           -> publish snapshot -> enqueue to subscribers -> unlock
//! ```
//!
//! If `apply` or `persist` fails, the snapshot is not replaced and nobody is
//! notified. Each subscriber owns an unbounded channel, so enqueueing never
//! blocks and a slow subscriber cannot hold up the mutation or any other
//! subscriber. Enqueueing happens while the gate is held, which keeps each
//! subscriber's view in commit order.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use starreach_types::{Empire, Star};
use tokio::sync::mpsc;

/// Entities that carry a commit counter.
pub trait Versioned {
    /// The number of committed mutations.
    fn version(&self) -> u64;

    /// Record a commit: set the version and any commit timestamp.
    fn mark_committed(&mut self, version: u64, at: DateTime<Utc>);
}

impl Versioned for Star {
    fn version(&self) -> u64 {
        self.version
    }

    fn mark_committed(&mut self, version: u64, at: DateTime<Utc>) {
        self.version = version;
        self.last_modified = Some(at);
    }
}

impl Versioned for Empire {
    fn version(&self) -> u64 {
        self.version
    }

    fn mark_committed(&mut self, version: u64, _at: DateTime<Utc>) {
        self.version = version;
    }
}

/// Handle identifying one subscription on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The receiving end of a subscription.
///
/// Dropping it is equivalent to unsubscribing: the sender is pruned on the
/// next commit.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<Arc<T>>,
}

impl<T> Subscription<T> {
    /// This subscription's ID, for [`Watchable::unsubscribe`].
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next committed snapshot. `None` once the entity has
    /// been dropped or this subscription was removed.
    pub async fn recv(&mut self) -> Option<Arc<T>> {
        self.receiver.recv().await
    }

    /// Take the next snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<T>> {
        self.receiver.try_recv().ok()
    }
}

impl<T: Versioned> Subscription<T> {
    /// Wait for the next snapshot newer than `version`, discarding queued
    /// ones at or below it. Used after reading the current snapshot
    /// separately, since a commit may land between subscribing and reading.
    pub async fn recv_after(&mut self, version: u64) -> Option<Arc<T>> {
        loop {
            let snapshot = self.receiver.recv().await?;
            if snapshot.version() > version {
                return Some(snapshot);
            }
        }
    }
}

/// A single entity with serialized mutation and change fanout.
#[derive(Debug)]
pub struct Watchable<T> {
    current: RwLock<Arc<T>>,
    gate: tokio::sync::Mutex<()>,
    subscribers: Mutex<BTreeMap<SubscriberId, mpsc::UnboundedSender<Arc<T>>>>,
    next_subscriber: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Watchable<T>
where
    T: Versioned + Clone + Send + Sync + 'static,
{
    /// Wrap an already-committed entity.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
            gate: tokio::sync::Mutex::new(()),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber: AtomicU64::new(0),
        }
    }

    /// The latest committed snapshot.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register for every snapshot committed after this call.
    pub fn subscribe(&self) -> Subscription<T> {
        let id = SubscriberId(self.next_subscriber.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.subscribers).insert(id, sender);
        Subscription { id, receiver }
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        lock(&self.subscribers).remove(&id).is_some()
    }

    /// Number of registered subscriptions, including ones whose receiver
    /// was dropped since the last commit.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Apply a change under exclusive access and commit it.
    ///
    /// `apply` edits a private copy of the current state. On success the
    /// version is incremented and the copy is handed to `persist`. Only
    /// after `persist` succeeds does the copy become the visible snapshot
    /// and get sent to subscribers. Returns the committed snapshot and the
    /// value produced by `apply`.
    ///
    /// # Errors
    ///
    /// Returns the error from `apply` or `persist`. In both cases the
    /// visible state is unchanged and no notification is sent.
    pub async fn mutate<R, E, A, P, F>(&self, apply: A, persist: P) -> Result<(Arc<T>, R), E>
    where
        A: FnOnce(&mut T) -> Result<R, E>,
        P: FnOnce(Arc<T>) -> F,
        F: Future<Output = Result<(), E>>,
    {
        let _gate = self.gate.lock().await;

        let mut next = T::clone(&self.get());
        let outcome = apply(&mut next)?;
        let version = next.version().saturating_add(1);
        next.mark_committed(version, Utc::now());
        let next = Arc::new(next);

        persist(Arc::clone(&next)).await?;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        self.notify(&next);
        Ok((next, outcome))
    }

    fn notify(&self, snapshot: &Arc<T>) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|id, sender| {
            let delivered = sender.send(Arc::clone(snapshot)).is_ok();
            if !delivered {
                tracing::debug!(subscriber = %id, "Pruned closed subscriber");
            }
            delivered
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Counter {
        value: i64,
        version: u64,
    }

    impl Versioned for Counter {
        fn version(&self) -> u64 {
            self.version
        }

        fn mark_committed(&mut self, version: u64, _at: DateTime<Utc>) {
            self.version = version;
        }
    }

    fn counter() -> Watchable<Counter> {
        Watchable::new(Counter {
            value: 0,
            version: 0,
        })
    }

    async fn add(w: &Watchable<Counter>, n: i64) -> Result<(Arc<Counter>, ()), String> {
        w.mutate(
            |c| {
                c.value = c.value.saturating_add(n);
                Ok(())
            },
            |_| async { Ok(()) },
        )
        .await
    }

    #[tokio::test]
    async fn commit_bumps_version_and_notifies() {
        let w = counter();
        let mut sub = w.subscribe();

        let committed = add(&w, 5).await;
        assert_eq!(committed.map(|(c, ())| c.version), Ok(1));
        assert_eq!(w.get().value, 5);

        let seen = sub.recv().await;
        assert_eq!(seen.map(|c| (c.value, c.version)), Some((5, 1)));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn rejected_apply_changes_nothing() {
        let w = counter();
        let mut sub = w.subscribe();
        let result: Result<(Arc<Counter>, ()), String> = w
            .mutate(|_| Err(String::from("nope")), |_| async { Ok(()) })
            .await;
        assert!(result.is_err());
        assert_eq!(w.get().version, 0);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn failed_persist_changes_nothing() {
        let w = counter();
        let mut sub = w.subscribe();
        let result: Result<(Arc<Counter>, ()), String> = w
            .mutate(
                |c| {
                    c.value = 9;
                    Ok(())
                },
                |_| async { Err(String::from("store down")) },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(*w.get(), Counter { value: 0, version: 0 });
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn unsubscribe_and_dropped_receivers_stop_delivery() {
        let w = counter();
        let kept = w.subscribe();
        let removed = w.subscribe();
        let dropped = w.subscribe();
        assert!(w.unsubscribe(removed.id()));
        assert!(!w.unsubscribe(removed.id()));
        drop(dropped);

        let _ = add(&w, 1).await;
        assert_eq!(w.subscriber_count(), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn recv_after_skips_snapshots_already_seen() {
        let w = counter();
        let mut sub = w.subscribe();
        let _ = add(&w, 1).await;

        // A reader who fetched the current snapshot after this commit has
        // already seen version 1.
        let seen = w.get().version;
        let _ = add(&w, 1).await;

        let next = sub.recv_after(seen).await;
        assert_eq!(next.map(|c| (c.value, c.version)), Some((2, 2)));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_commits_in_order() {
        let w = Arc::new(counter());
        let mut sub = w.subscribe();
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let w = Arc::clone(&w);
                tokio::spawn(async move { add(&w, 1).await })
            })
            .collect();
        for task in tasks {
            let _ = task.await;
        }

        let mut versions = Vec::new();
        while let Some(snapshot) = sub.try_recv() {
            versions.push(snapshot.version);
        }
        assert_eq!(versions, (1..=20).collect::<Vec<u64>>());
        assert_eq!(w.get().value, 20);
    }
}
