//! Process-wide cache of fetched collections
//!
//! Entries are keyed by collection identifier and expire after a TTL.
//! Any successful mutation clears the whole cache so the next read goes
//! back to the data source.

use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default freshness of a cached collection
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

static SHARED: Lazy<Arc<ResultCache>> = Lazy::new(|| Arc::new(ResultCache::new(DEFAULT_TTL)));

struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    cached_at: Instant,
}

/// Cache of previously fetched collections
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl_millis: AtomicU64,
    clears: AtomicU64,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl())
            .field("clears", &self.clear_count())
            .finish()
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_millis: AtomicU64::new(ttl.as_millis() as u64),
            clears: AtomicU64::new(0),
        }
    }

    /// The process-wide instance
    pub fn shared() -> Arc<ResultCache> {
        Arc::clone(&SHARED)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis.load(Ordering::Relaxed))
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.ttl_millis.store(ttl.as_millis() as u64, Ordering::Relaxed);
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh copy of the collection stored under `key`
    pub fn get<T>(&self, key: &str) -> Option<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let ttl = self.ttl();
        let mut entries = self.entries();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.cached_at.elapsed() >= ttl,
        };
        if expired {
            log::debug!(target: "invoiceweb::cache", "Entry '{}' expired", key);
            entries.remove(key);
            return None;
        }

        let entry = entries.get(key)?;
        match entry.data.downcast_ref::<Vec<T>>() {
            Some(items) => Some(items.clone()),
            None => {
                log::warn!(target: "invoiceweb::cache", "Entry '{}' holds another record type", key);
                None
            }
        }
    }

    /// Store a freshly fetched collection
    pub fn set<T>(&self, key: &str, items: Vec<T>)
    where
        T: Send + Sync + 'static,
    {
        log::debug!(target: "invoiceweb::cache", "Caching {} item(s) under '{}'", items.len(), key);
        self.entries().insert(
            key.to_string(),
            CacheEntry {
                data: Arc::new(items),
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop one collection
    pub fn invalidate(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Drop every collection
    pub fn clear(&self) {
        self.entries().clear();
        self.clears.fetch_add(1, Ordering::Relaxed);
        log::debug!(target: "invoiceweb::cache", "Cache cleared");
    }

    /// Number of `clear` calls so far
    pub fn clear_count(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
