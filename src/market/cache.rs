//! # market::cache
//!
//! Short TTL memoization of the last snapshot per interval. Expiry is the
//! only invalidation. Each interval has its own slot lock, held across the
//! fetch: concurrent refreshes of one expired interval make a single upstream
//! call, while other intervals keep serving hits. The map lock only guards
//! slot lookup.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use crate::models::MarketSnapshot;

type Slot = Arc<Mutex<Option<(Instant, MarketSnapshot)>>>;

pub struct SnapshotCache {
    ttl:    Duration,
    slots:  Mutex<HashMap<String, Slot>>,
    /// Slots holding a snapshot; readable without touching any lock.
    filled: AtomicUsize,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slots: Mutex::new(HashMap::new()), filled: AtomicUsize::new(0) }
    }

    async fn slot(&self, interval: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(interval.to_string()).or_default())
    }

    /// Return the memoized snapshot for `interval`, or run `fetch` and store
    /// its result when the entry is missing or older than the TTL.
    pub async fn get_or_fetch<F, Fut>(&self, interval: &str, fetch: F) -> MarketSnapshot
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MarketSnapshot>,
    {
        let slot = self.slot(interval).await;
        let mut entry = slot.lock().await;

        if let Some((stored_at, snapshot)) = entry.as_ref() {
            if stored_at.elapsed() < self.ttl {
                debug!(interval, "market cache hit");
                return snapshot.clone();
            }
        }

        debug!(interval, "market cache miss, fetching");
        let snapshot = fetch().await;
        if entry.replace((Instant::now(), snapshot.clone())).is_none() {
            self.filled.fetch_add(1, Ordering::Relaxed);
        }
        snapshot
    }

    /// Number of intervals with a stored snapshot.
    pub fn len(&self) -> usize {
        self.filled.load(Ordering::Relaxed)
    }
}
