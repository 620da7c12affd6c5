//! # TaskPro API Server
//!
//! REST backend for TaskPro: JWT-authenticated task management with a
//! cache-backed search and per-user search history.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` in development)
//! 2. Connect to PostgreSQL and apply pending migrations
//! 3. Resolve the search cache backend (Redis, in-memory or none)
//! 4. Serve until Ctrl-C or SIGTERM, then drain and close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskpro-api
//! ```

use std::{future::Future, sync::Arc, time::Duration};
use taskpro_api::{
    app::{build_router, AppState},
    config::{CacheBackend, Config},
};
use taskpro_shared::{
    cache::{MemorySearchCache, RedisSearchCache, SearchCache},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    redis::{RedisClient, RedisConfig},
    search::SearchService,
    store::PgTaskStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("TaskPro API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let cache = resolve_cache(&config).await;
    tracing::info!(backend = cache.backend_name(), "Search cache resolved");

    let search = SearchService::new(
        Arc::new(PgTaskStore::new(pool.clone())),
        cache,
        config.search.settings(),
    );

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, search));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskpro_api=debug,taskpro_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// An unreachable Redis disables caching for the life of the process
async fn resolve_cache(config: &Config) -> SearchCache {
    match config.cache.backend {
        CacheBackend::None => SearchCache::Disabled,
        CacheBackend::Memory => SearchCache::Memory(MemorySearchCache::new()),
        CacheBackend::Redis => {
            let Some(url) = config.cache.redis_url.as_deref() else {
                return SearchCache::Disabled;
            };

            let command_timeout = Duration::from_secs(config.cache.command_timeout_secs);
            let redis_config = RedisConfig::new(url).with_command_timeout(command_timeout);

            let client = match RedisClient::connect(redis_config).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unreachable, search cache disabled");
                    return SearchCache::Disabled;
                }
            };

            if let Err(e) = client.ping().await {
                tracing::warn!(error = %e, "Redis ping failed, search cache disabled");
                return SearchCache::Disabled;
            }

            SearchCache::Redis(RedisSearchCache::new(client))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    Interrupt,
    Terminate,
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = first_signal(interrupt, terminate).await;
    tracing::info!(?reason, "Shutdown signal received");
}

/// Resolves with whichever signal arrives first
async fn first_signal<I, T>(interrupt: I, terminate: T) -> ShutdownReason
where
    I: Future<Output = ()>,
    T: Future<Output = ()>,
{
    tokio::select! {
        () = interrupt => ShutdownReason::Interrupt,
        () = terminate => ShutdownReason::Terminate,
    }
}
