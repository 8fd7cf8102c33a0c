//! §4.D Frontier: deduplicated queue of URLs yet to fetch, concurrency-safe.
//!
//! Modeled as one value owning `visited`, `pending`, *and* the parallelism
//! permit count under a single lock, per the design note in SPEC_FULL.md
//! §9 — this is what makes `admit` atomic with respect to duplicate
//! detection, and what makes termination detection (§4.E: "permits held =
//! 0 AND pending is empty") safe: the decrement of the permit count and the
//! emptiness check happen as one step under the same mutex a concurrent
//! `admit` would need, so a permit can never be "returned" in a way that
//! races a discovery still being admitted.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use url::Url;

use crate::url_filter::{self, UrlFilter};

struct Inner {
    visited: HashSet<Url>,
    pending: VecDeque<Url>,
    closed: bool,
    permits_in_use: usize,
}

/// The frontier of a single crawl run. Cheaply cloneable; clones share the
/// same underlying state.
#[derive(Clone)]
pub struct Frontier {
    inner: Arc<Mutex<Inner>>,
    notify: Arc<Notify>,
    filters: Arc<Vec<UrlFilter>>,
    degree_of_parallelism: usize,
}

impl Frontier {
    #[must_use]
    pub fn new(filters: Vec<UrlFilter>) -> Self {
        Self::with_parallelism(filters, 1)
    }

    /// `degree_of_parallelism` bounds concurrent [`Frontier::acquire_permit`]
    /// holders; see §4.E.
    #[must_use]
    pub fn with_parallelism(filters: Vec<UrlFilter>, degree_of_parallelism: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                visited: HashSet::new(),
                pending: VecDeque::new(),
                closed: false,
                permits_in_use: 0,
            })),
            notify: Arc::new(Notify::new()),
            filters: Arc::new(filters),
            degree_of_parallelism: degree_of_parallelism.max(1),
        }
    }

    /// Normalize, attempt to insert into `visited`; if already present,
    /// return. If not admissible by any filter, return (but keep it in
    /// `visited`). Otherwise append to `pending`.
    pub async fn admit(&self, url: &Url) {
        let normalized = crate::normalize::normalize(url);
        let mut guard = self.inner.lock().await;
        if !guard.visited.insert(normalized.clone()) {
            return;
        }
        if !url_filter::matches_any(&self.filters, &normalized) {
            return;
        }
        guard.pending.push_back(normalized);
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Insert into `visited` only — used by the response observer for
    /// redirect targets and navigation response URLs.
    pub async fn admit_seen(&self, url: &Url) {
        let normalized = crate::normalize::normalize(url);
        let mut guard = self.inner.lock().await;
        guard.visited.insert(normalized);
    }

    /// Dequeue one URL from `pending`; blocks until one is available or the
    /// frontier is closed (in which case `None` is returned).
    ///
    /// The `Notified` future is created and `enable()`d *before* the lock is
    /// taken and the condition checked, so a `notify_waiters()` fired by a
    /// concurrent `admit`/`release_permit` between our check and our await
    /// is still observed — per `tokio::sync::Notify`'s documented pattern,
    /// never check-then-`notified().await` with nothing registered in
    /// between.
    pub async fn take(&self) -> Option<Url> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut guard = self.inner.lock().await;
                if let Some(url) = guard.pending.pop_front() {
                    return Some(url);
                }
                if guard.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Block until fewer than `degree_of_parallelism` permits are held,
    /// then take one. Pairs with [`Frontier::release_permit`]. Registers
    /// its `Notified` future before checking the condition, for the same
    /// lost-wakeup reason as [`Frontier::take`].
    pub async fn acquire_permit(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut guard = self.inner.lock().await;
                if guard.permits_in_use < self.degree_of_parallelism {
                    guard.permits_in_use += 1;
                    return;
                }
            }
            notified.await;
        }
    }

    /// Release a permit held by a just-finished worker. Per §4.E, this is
    /// where termination is detected: if releasing this permit brings the
    /// held count to zero *and* `pending` is empty, the frontier closes —
    /// computed under the same lock `admit` uses, so a discovery this
    /// worker just admitted (before calling `release_permit`) is always
    /// visible here.
    pub async fn release_permit(&self) {
        let mut guard = self.inner.lock().await;
        guard.permits_in_use = guard.permits_in_use.saturating_sub(1);
        if guard.permits_in_use == 0 && guard.pending.is_empty() {
            guard.closed = true;
        }
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Mark that no further URLs will ever be admitted; unblocks any
    /// waiter in `take`. Used for explicit/early shutdown; normal runs
    /// close via [`Frontier::release_permit`] instead.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        guard.closed = true;
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Snapshot used by tests and diagnostics: true iff `pending` is
    /// currently empty.
    pub async fn pending_is_empty(&self) -> bool {
        self.inner.lock().await.pending.is_empty()
    }

    #[must_use]
    pub fn filters(&self) -> &[UrlFilter] {
        &self.filters
    }

    #[cfg(test)]
    pub async fn visited_len(&self) -> usize {
        self.inner.lock().await.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> Vec<UrlFilter> {
        vec![UrlFilter::new("example.com", "/a/")]
    }

    #[tokio::test]
    async fn admit_then_take_round_trips() {
        let frontier = Frontier::new(filters());
        let url = Url::parse("https://example.com/a/x").unwrap();
        frontier.admit(&url).await;
        let taken = frontier.take().await.unwrap();
        assert_eq!(taken, crate::normalize::normalize(&url));
    }

    #[tokio::test]
    async fn duplicate_admit_is_a_no_op() {
        let frontier = Frontier::new(filters());
        let a = Url::parse("https://example.com/a/x#s1").unwrap();
        let b = Url::parse("https://example.com/a/x#s2").unwrap();
        frontier.admit(&a).await;
        frontier.admit(&b).await;
        assert!(frontier.take().await.is_some());
        // Second take must block forever absent another admit; close to
        // observe it returns None instead of yielding a duplicate.
        frontier.close().await;
        assert!(frontier.take().await.is_none());
    }

    #[tokio::test]
    async fn out_of_scope_is_visited_not_pending() {
        let frontier = Frontier::new(filters());
        let url = Url::parse("https://example.com/b/y").unwrap();
        frontier.admit(&url).await;
        assert_eq!(frontier.visited_len().await, 1);
        frontier.close().await;
        assert!(frontier.take().await.is_none());
    }

    #[tokio::test]
    async fn admit_seen_does_not_enqueue() {
        let frontier = Frontier::new(filters());
        let url = Url::parse("https://example.com/a/redirect-target").unwrap();
        frontier.admit_seen(&url).await;
        assert_eq!(frontier.visited_len().await, 1);
        frontier.close().await;
        assert!(frontier.take().await.is_none());
    }

    #[tokio::test]
    async fn close_unblocks_waiting_take() {
        let frontier = Frontier::new(filters());
        let f2 = frontier.clone();
        let handle = tokio::spawn(async move { f2.take().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        frontier.close().await;
        assert!(handle.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_of_last_permit_with_empty_pending_closes() {
        let frontier = Frontier::with_parallelism(filters(), 2);
        frontier.acquire_permit().await;
        frontier.acquire_permit().await;
        frontier.release_permit().await;
        // One permit still held; frontier must stay open.
        assert!(!frontier_is_closed(&frontier).await);
        frontier.release_permit().await;
        assert!(frontier_is_closed(&frontier).await);
    }

    #[tokio::test]
    async fn release_does_not_close_while_pending_nonempty() {
        let frontier = Frontier::with_parallelism(filters(), 1);
        frontier.acquire_permit().await;
        let url = Url::parse("https://example.com/a/x").unwrap();
        frontier.admit(&url).await;
        frontier.release_permit().await;
        assert!(!frontier_is_closed(&frontier).await);
        assert!(frontier.take().await.is_some());
    }

    async fn frontier_is_closed(frontier: &Frontier) -> bool {
        frontier.inner.lock().await.closed
    }
}
