/// Search cache layer
///
/// A small key-value surface (TTL strings plus bounded lists) that the search
/// orchestrator uses for result memoization and per-user history.
///
/// # Architecture
///
/// ```text
/// SearchCache (enum)               <- resolved once at startup
///   ├── Redis(RedisSearchCache)    <- ConnectionManager, MULTI/EXEC for history
///   ├── Memory(MemorySearchCache)  <- in-process maps, local dev and tests
///   └── Disabled                   <- no cache configured or unreachable
/// ```
///
/// Entries are advisory. A missing key is `Ok(None)`; a backend failure is a
/// [`CacheError`] that callers are expected to log and move past.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use taskpro_shared::cache::{MemorySearchCache, SearchCache};
///
/// # async fn example() -> Result<(), taskpro_shared::cache::CacheError> {
/// let cache = SearchCache::Memory(MemorySearchCache::new());
/// cache.set("k", "v", Duration::from_secs(30)).await?;
/// assert_eq!(cache.get("k").await?.as_deref(), Some("v"));
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod redis_store;

pub use memory::MemorySearchCache;
pub use redis_store::RedisSearchCache;

use crate::redis::client::RedisClientError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Redis(#[from] RedisClientError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend chosen at startup
#[derive(Clone)]
pub enum SearchCache {
    Redis(RedisSearchCache),
    Memory(MemorySearchCache),
    Disabled,
}

impl SearchCache {
    /// False only for `Disabled`; a configured backend that fails at runtime
    /// still reports true and surfaces errors per call
    pub fn is_available(&self) -> bool {
        !matches!(self, SearchCache::Disabled)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            SearchCache::Redis(_) => "redis",
            SearchCache::Memory(_) => "memory",
            SearchCache::Disabled => "disabled",
        }
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            SearchCache::Redis(c) => c.get(key).await,
            SearchCache::Memory(c) => c.get(key),
            SearchCache::Disabled => Err(disabled()),
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            SearchCache::Redis(c) => c.set(key, value, ttl).await,
            SearchCache::Memory(c) => c.set(key, value, ttl),
            SearchCache::Disabled => Err(disabled()),
        }
    }

    /// Moves `value` to the front of the list and keeps at most `max_len`
    /// entries; earlier copies of `value` are removed
    pub async fn push_history(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()> {
        match self {
            SearchCache::Redis(c) => c.push_history(key, value, max_len).await,
            SearchCache::Memory(c) => c.push_history(key, value, max_len),
            SearchCache::Disabled => Err(disabled()),
        }
    }

    /// Up to `max_len` entries, newest first
    pub async fn history(&self, key: &str, max_len: usize) -> CacheResult<Vec<String>> {
        match self {
            SearchCache::Redis(c) => c.history(key, max_len).await,
            SearchCache::Memory(c) => c.history(key, max_len),
            SearchCache::Disabled => Err(disabled()),
        }
    }

    /// Reachability check used by startup and the health endpoint
    pub async fn ping(&self) -> CacheResult<()> {
        match self {
            SearchCache::Redis(c) => c.ping().await,
            SearchCache::Memory(c) => c.ping(),
            SearchCache::Disabled => Err(disabled()),
        }
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SearchCache").field(&self.backend_name()).finish()
    }
}

fn disabled() -> CacheError {
    CacheError::Unavailable("no cache backend configured".to_string())
}
