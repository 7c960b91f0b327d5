//! Upload storage shared between upload and predict calls.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::core::SeriesSet;

/// Storage for parsed uploads, keyed by an opaque id.
///
/// Implementations must be safe to share across threads: uploads write,
/// predictions read.
pub trait UploadCache: Send + Sync {
    /// Store `series` under a freshly generated id and return the id.
    fn insert(&self, series: SeriesSet) -> String;

    /// Retrieve an upload. Expired entries behave like unknown ids.
    fn get(&self, id: &str) -> Option<Arc<SeriesSet>>;
}

struct CachedEntry {
    value: Arc<SeriesSet>,
    created_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.created_at.elapsed() > ttl)
    }
}

/// Process-local cache with optional expiry and a bound on entries.
pub struct InMemoryUploadCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl InMemoryUploadCache {
    pub fn new(ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Live entries currently held.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|e| !e.is_expired(self.ttl)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, entries: &mut HashMap<String, CachedEntry>) {
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                }
                None => break,
            }
        }
    }
}

impl Default for InMemoryUploadCache {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(3600)), 256)
    }
}

impl UploadCache for InMemoryUploadCache {
    fn insert(&self, series: SeriesSet) -> String {
        let id = Uuid::new_v4().to_string();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.evict(&mut entries);
        entries.insert(
            id.clone(),
            CachedEntry {
                value: Arc::new(series),
                created_at: Instant::now(),
            },
        );
        id
    }

    fn get(&self, id: &str) -> Option<Arc<SeriesSet>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Observation;
    use chrono::NaiveDate;
    use std::thread;

    fn upload(price: f64) -> SeriesSet {
        let mut set = SeriesSet::new();
        set.push(
            "default",
            Observation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), price),
        );
        set
    }

    #[test]
    fn insert_then_get() {
        let cache = InMemoryUploadCache::default();
        let id = cache.insert(upload(1.0));
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(cache.get(&id).unwrap().total_records(), 1);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn expired_entries_are_invisible() {
        let cache = InMemoryUploadCache::new(Some(Duration::ZERO), 8);
        let id = cache.insert(upload(1.0));
        thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&id).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let cache = InMemoryUploadCache::new(None, 2);
        let first = cache.insert(upload(1.0));
        thread::sleep(Duration::from_millis(2));
        let second = cache.insert(upload(2.0));
        thread::sleep(Duration::from_millis(2));
        let third = cache.insert(upload(3.0));
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
        assert!(cache.get(&third).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(InMemoryUploadCache::default());
        let id = cache.insert(upload(4.0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let id = id.clone();
                thread::spawn(move || cache.get(&id).map(|s| s.total_records()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }
}
