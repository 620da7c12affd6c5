/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and `.env` in
/// development).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for permissive (default `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_SECRET`: signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: token lifetime (default 24)
/// - `CACHE_BACKEND`: `redis`, `memory` or `none` (default `redis` when
///   `REDIS_URL` is set, otherwise `none`)
/// - `REDIS_URL`: Redis connection string
/// - `REDIS_COMMAND_TIMEOUT_SECS`: per-command bound (default 2)
/// - `SEARCH_CACHE_TTL_SECS`: cached result lifetime (default 30)
/// - `SEARCH_HISTORY_LIMIT`: history entries kept per user (default 10)
///
/// # Example
///
/// ```no_run
/// use taskpro_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::{bail, Context};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use taskpro_shared::search::SearchSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct JwtConfig {
    /// Generate with `openssl rand -hex 32`
    pub secret: String,

    pub expiration_hours: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
    None,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            "none" | "disabled" | "off" => Ok(CacheBackend::None),
            other => bail!("unknown CACHE_BACKEND '{}', expected redis, memory or none", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub cache_ttl_secs: u64,
    pub history_limit: usize,
}

impl SearchConfig {
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            result_ttl: Duration::from_secs(self.cache_ttl_secs),
            history_limit: self.history_limit,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or a value does not parse or
    /// is out of range.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "API_PORT", 8080)?;
        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt_secret =
            lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters long");
        }
        let expiration_hours: i64 = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24)?;
        if expiration_hours <= 0 {
            bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        let backend = match lookup("CACHE_BACKEND") {
            Some(value) => value.parse::<CacheBackend>()?,
            None if redis_url.is_some() => CacheBackend::Redis,
            None => CacheBackend::None,
        };
        if backend == CacheBackend::Redis && redis_url.is_none() {
            bail!("CACHE_BACKEND=redis requires REDIS_URL");
        }
        let command_timeout_secs: u64 = parse_or(&lookup, "REDIS_COMMAND_TIMEOUT_SECS", 2)?;

        let cache_ttl_secs: u64 = parse_or(&lookup, "SEARCH_CACHE_TTL_SECS", 30)?;
        let history_limit: usize = parse_or(&lookup, "SEARCH_HISTORY_LIMIT", 10)?;
        if cache_ttl_secs == 0 || history_limit == 0 {
            bail!("SEARCH_CACHE_TTL_SECS and SEARCH_HISTORY_LIMIT must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
            cache: CacheConfig {
                backend,
                redis_url,
                command_timeout_secs,
            },
            search: SearchConfig {
                cache_ttl_secs,
                history_limit,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expiration_hours)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
