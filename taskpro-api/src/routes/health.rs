/// Health check endpoint
///
/// Always answers 200; the body reports whether the database and the search
/// cache are reachable so a load balancer can tell "up" from "degraded".

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskpro_shared::db::{
    migrations::{schema_status, SchemaStatus},
    pool::{get_pool_stats, health_check as db_health_check, PoolStats},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    /// "connected", "disconnected" or "disabled"
    pub cache: String,

    pub pool: PoolStats,

    /// Absent while the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaStatus>,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match db_health_check(&state.db).await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "disconnected"
        }
    };

    let schema = if database == "connected" {
        match schema_status(&state.db).await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read schema status");
                None
            }
        }
    } else {
        None
    };

    let search_cache = state.search.cache();
    let cache = if !search_cache.is_available() {
        "disabled"
    } else {
        match search_cache.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Cache health check failed");
                "disconnected"
            }
        }
    };

    // A missing cache only costs latency, so it does not degrade the service
    let status = if database == "connected" && cache != "disconnected" {
        "healthy"
    } else {
        "degraded"
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        cache: cache.to_string(),
        pool: get_pool_stats(&state.db),
        schema,
    }))
}
