//! In-memory TTL cache with lazy eviction and a background sweeper.
//!
//! Reads take a shared lock so readers never block readers; an expired
//! entry found on read is evicted under a short exclusive lock. The
//! sweeper bounds memory growth from entries nobody re-reads. No size
//! limit and no LRU; correctness depends only on expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `value` under `key`, expiring `ttl` from now. Re-setting
    /// an existing key replaces the value and resets the expiry clock.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut entries = self.entries.write().await;
        debug!(%key, ?ttl, "cache PUT");
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the live value for `key`. An expired entry is treated
    /// as absent and evicted before returning.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => {
                    debug!(%key, "cache MISS");
                    return None;
                }
                Some(entry) if entry.expires_at > Instant::now() => {
                    debug!(%key, "cache HIT");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Lazy eviction; re-check under the write lock in case a
        // concurrent set replaced the entry after the read lock dropped.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|e| e.expires_at <= Instant::now())
        {
            debug!(%key, "cache EXPIRED, evicting");
            entries.remove(key);
        }
        None
    }

    /// Removes every expired entry; returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Spawns the periodic sweep task. The task stops cleanly when
    /// `stop` observes `true`; the returned handle can be joined on
    /// shutdown.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut stop: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sweep an empty cache.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired().await;
                        if removed > 0 {
                            debug!(removed, "cache sweep removed expired entries");
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            info!("cache sweeper stopped");
                            return;
                        }
                    }
                }
            }
        })
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
