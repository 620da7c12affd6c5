/// Redis client wrapper
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own, and
/// bounds every command with a timeout so that a slow or partitioned Redis
/// can only ever cost a request `command_timeout`.
///
/// # Example
///
/// ```no_run
/// use taskpro_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::connect(RedisConfig::new("redis://localhost:6379")).await?;
/// client.ping().await?;
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, FromRedisValue, Pipeline, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedisClientError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            RedisClientError::ConnectionError(err.to_string())
        } else {
            RedisClientError::CommandError(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// redis://[username:password@]host:port[/db]
    pub url: String,

    /// Bound on the initial connection
    pub connection_timeout: Duration,

    /// Bound on every individual command or pipeline
    pub command_timeout: Duration,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Cloneable Redis handle
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Opens the connection manager
    ///
    /// # Errors
    ///
    /// Fails on an unparsable URL, or when Redis cannot be reached within
    /// `connection_timeout`.
    pub async fn connect(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let manager = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
            .map_err(|_| RedisClientError::Timeout(config.connection_timeout))?
            .map_err(|e| {
                RedisClientError::ConnectionError(format!("Failed to connect to Redis: {}", e))
            })?;

        tracing::info!(url = %sanitize_url(&config.url), "Redis client connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Sends PING and expects PONG
    pub async fn ping(&self) -> Result<(), RedisClientError> {
        let mut conn = self.manager.clone();
        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;

        if pong == "PONG" {
            tracing::debug!("Redis health check: PONG received");
            Ok(())
        } else {
            Err(RedisClientError::CommandError(format!(
                "unexpected PING reply: {}",
                pong
            )))
        }
    }

    /// Runs a single command under the command timeout
    pub async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, RedisClientError> {
        let mut conn = self.manager.clone();
        self.bounded(cmd.query_async(&mut conn)).await
    }

    /// Runs a pipeline (atomic or not) under the command timeout
    pub async fn query_pipeline<T: FromRedisValue>(
        &self,
        pipe: &Pipeline,
    ) -> Result<T, RedisClientError> {
        let mut conn = self.manager.clone();
        self.bounded(pipe.query_async(&mut conn)).await
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, RedisClientError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        let timeout = self.config.command_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(RedisClientError::from),
            Err(_) => Err(RedisClientError::Timeout(timeout)),
        }
    }
}

/// Replaces credentials with `***:***` for logging
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let host = &url[at_pos + 1..];
            return format!("{}***:***@{}", scheme, host);
        }
    }
    url.to_string()
}
