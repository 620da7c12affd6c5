/// Redis-backed search cache
///
/// Results are plain strings written with `SET key value PX ttl`. History is a
/// list maintained by one MULTI/EXEC pipeline:
///
/// ```text
/// LREM  search:history:{owner} 0 "{query}"     drop earlier copies
/// LPUSH search:history:{owner} "{query}"       newest first
/// LTRIM search:history:{owner} 0 {max_len - 1} cap
/// ```

use super::CacheResult;
use crate::redis::client::RedisClient;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisSearchCache {
    client: RedisClient,
}

impl RedisSearchCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value: Option<String> = self.client.query(redis::cmd("GET").arg(key)).await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // PX rejects 0
        let ttl_ms = ttl.as_millis().max(1) as u64;
        let _: () = self
            .client
            .query(redis::cmd("SET").arg(key).arg(value).arg("PX").arg(ttl_ms))
            .await?;
        Ok(())
    }

    pub async fn push_history(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()> {
        if max_len == 0 {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("LREM")
            .arg(key)
            .arg(0)
            .arg(value)
            .ignore()
            .cmd("LPUSH")
            .arg(key)
            .arg(value)
            .ignore()
            .cmd("LTRIM")
            .arg(key)
            .arg(0)
            .arg(max_len as isize - 1)
            .ignore();

        let _: () = self.client.query_pipeline(&pipe).await?;
        Ok(())
    }

    pub async fn history(&self, key: &str, max_len: usize) -> CacheResult<Vec<String>> {
        if max_len == 0 {
            return Ok(Vec::new());
        }

        let entries: Vec<String> = self
            .client
            .query(redis::cmd("LRANGE").arg(key).arg(0).arg(max_len as isize - 1))
            .await?;
        Ok(entries)
    }

    pub async fn ping(&self) -> CacheResult<()> {
        self.client.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::client::RedisConfig;
    use uuid::Uuid;

    async fn connect() -> RedisSearchCache {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        RedisSearchCache::new(RedisClient::connect(RedisConfig::new(url)).await.unwrap())
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_set_get_with_ttl() {
        let cache = connect().await;
        let key = format!("search:result:test:{}", Uuid::new_v4());

        cache.set(&key, "[]", Duration::from_millis(200)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("[]"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_history_dedupes_and_caps() {
        let cache = connect().await;
        let key = format!("search:history:{}", Uuid::new_v4());

        for q in ["a", "b", "c", "a"] {
            cache.push_history(&key, q, 3).await.unwrap();
        }
        assert_eq!(cache.history(&key, 3).await.unwrap(), vec!["a", "c", "b"]);

        cache.push_history(&key, "d", 3).await.unwrap();
        assert_eq!(cache.history(&key, 3).await.unwrap(), vec!["d", "a", "c"]);

        let _: () = cache.client.query(redis::cmd("DEL").arg(&key)).await.unwrap();
    }
}
