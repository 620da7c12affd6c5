/// Cache-backed task search with per-user history
///
/// # Flow
///
/// ```text
/// search(owner, raw)
///   normalized = trim(raw)
///   cache available?
///     no  -> store.find_tasks(owner, {query: normalized})      (no history)
///     yes -> GET search:result:{owner}:{sha256(normalized)}
///              hit  -> push history, return cached
///              miss -> store.find_tasks, SET ... PX ttl, push history
/// ```
///
/// The store is the source of truth. Cache failures never fail a search;
/// they are logged and the request continues as if the cache were empty.
/// Store failures are returned to the caller.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskpro_shared::cache::{MemorySearchCache, SearchCache};
/// use taskpro_shared::search::{SearchService, SearchSettings};
/// use taskpro_shared::store::PgTaskStore;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let service = SearchService::new(
///     Arc::new(PgTaskStore::new(pool)),
///     SearchCache::Memory(MemorySearchCache::new()),
///     SearchSettings::default(),
/// );
///
/// let tasks = service.search(owner, "bug").await?;
/// let recent = service.history(owner).await;
/// # Ok(())
/// # }
/// ```

pub mod keys;

use crate::cache::SearchCache;
use crate::models::task::{Task, TaskFilter};
use crate::store::TaskStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Task store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Lifetime of a cached result list
    pub result_ttl: Duration,

    /// Longest history list kept per user
    pub history_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_ttl: Duration::from_secs(30),
            history_limit: 10,
        }
    }
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn TaskStore>,
    cache: SearchCache,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(store: Arc<dyn TaskStore>, cache: SearchCache, settings: SearchSettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Searches the owner's tasks by free text
    ///
    /// An empty (or all-whitespace) query matches every task of the owner.
    pub async fn search(
        &self,
        owner_id: Uuid,
        raw_query: &str,
    ) -> Result<Vec<Task>, SearchError> {
        let normalized = keys::normalize_query(raw_query);
        let filter = TaskFilter::with_query(normalized);

        if !self.cache.is_available() {
            debug!(user_id = %owner_id, "Search cache unavailable, querying store directly");
            return Ok(self.store.find_tasks(owner_id, &filter).await?);
        }

        let cache_key = keys::result_key(owner_id, normalized);
        let history_key = keys::history_key(owner_id);

        if let Some(tasks) = self.cached_result(&cache_key).await {
            debug!(
                user_id = %owner_id,
                cache_key = %cache_key,
                count = tasks.len(),
                "Search cache hit"
            );
            self.record_history(&history_key, raw_query).await;
            return Ok(tasks);
        }

        let tasks = self.store.find_tasks(owner_id, &filter).await?;
        debug!(
            user_id = %owner_id,
            cache_key = %cache_key,
            count = tasks.len(),
            "Search cache miss"
        );

        match serde_json::to_string(&tasks) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&cache_key, &json, self.settings.result_ttl).await {
                    warn!(cache_key = %cache_key, error = %e, "Failed to cache search result");
                }
            }
            Err(e) => {
                warn!(cache_key = %cache_key, error = %e, "Failed to serialize search result")
            }
        }

        self.record_history(&history_key, raw_query).await;
        Ok(tasks)
    }

    /// Most recent raw queries of the owner, newest first
    ///
    /// Empty when the cache is unavailable or the read fails.
    pub async fn history(&self, owner_id: Uuid) -> Vec<String> {
        if !self.cache.is_available() {
            return Vec::new();
        }

        let history_key = keys::history_key(owner_id);
        match self.cache.history(&history_key, self.settings.history_limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id = %owner_id, error = %e, "Failed to read search history");
                Vec::new()
            }
        }
    }

    async fn cached_result(&self, cache_key: &str) -> Option<Vec<Task>> {
        let json = match self.cache.get(cache_key).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(cache_key = %cache_key, error = %e, "Search cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(tasks) => Some(tasks),
            Err(e) => {
                warn!(
                    cache_key = %cache_key,
                    error = %e,
                    "Discarding unreadable cached search result"
                );
                None
            }
        }
    }

    async fn record_history(&self, history_key: &str, raw_query: &str) {
        if let Err(e) = self
            .cache
            .push_history(history_key, raw_query, self.settings.history_limit)
            .await
        {
            warn!(history_key = %history_key, error = %e, "Failed to record search history");
        }
    }
}
