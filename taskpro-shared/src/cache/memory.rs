/// In-process search cache
///
/// Same semantics as the Redis backend: TTL expiry and deduplicated, capped
/// history lists. Expired entries are swept on every write. Time comes from `tokio::time::Instant`
/// so tests can drive expiry with `tokio::time::pause` and `advance`.
///
/// Clones share state.

use super::{CacheError, CacheResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, (String, Instant)>,
    lists: HashMap<String, VecDeque<String>>,
}

#[derive(Clone, Default)]
pub struct MemorySearchCache {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
}

impl MemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails, as a Redis outage would
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut inner = self.lock()?;
        match inner.entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                inner.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        inner.entries.retain(|_, (_, expires_at)| now < *expires_at);
        inner
            .entries
            .insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    pub fn push_history(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()> {
        let mut inner = self.lock()?;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.retain(|entry| entry != value);
        list.push_front(value.to_string());
        list.truncate(max_len);
        Ok(())
    }

    pub fn history(&self, key: &str, max_len: usize) -> CacheResult<Vec<String>> {
        let inner = self.lock()?;
        Ok(inner
            .lists
            .get(key)
            .map(|list| list.iter().take(max_len).cloned().collect())
            .unwrap_or_default())
    }

    pub fn ping(&self) -> CacheResult<()> {
        self.lock().map(|_| ())
    }

    /// Number of live (unexpired) result entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .lock()
            .map(|inner| inner.entries.values().filter(|(_, exp)| now < *exp).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Inner>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache is offline".to_string()));
        }
        Ok(self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}
