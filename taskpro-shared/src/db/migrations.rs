/// Database migration runner
///
/// Migrations live in `migrations/` at the workspace root as reversible
/// `{timestamp}_{name}.up.sql` / `.down.sql` pairs and are embedded at
/// compile time with `sqlx::migrate!`.

use serde::Serialize;
use sqlx::{
    migrate::{MigrateDatabase, MigrationType, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Schema version as reported by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    /// Highest successfully applied version, `None` on an empty database
    pub latest_version: Option<i64>,

    /// Embedded migrations the database has not applied yet
    pub pending: usize,
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Compares the applied versions against the embedded migration set
pub async fn schema_status(pool: &PgPool) -> Result<SchemaStatus, sqlx::Error> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let applied: Vec<i64> = if tracked {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    Ok(SchemaStatus {
        latest_version: applied.last().copied(),
        pending: pending_versions(&applied).len(),
    })
}

/// Versions of embedded up-migrations missing from `applied`
fn pending_versions(applied: &[i64]) -> Vec<i64> {
    MIGRATOR
        .iter()
        .filter(|m| !matches!(m.migration_type, MigrationType::ReversibleDown))
        .map(|m| m.version)
        .filter(|version| !applied.contains(version))
        .collect()
}

/// Creates the database when it is missing (development and tests)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_has_every_migration_pending() {
        assert_eq!(pending_versions(&[]), vec![20250101000001, 20250101000002]);
    }

    #[test]
    fn test_partially_migrated_database() {
        assert_eq!(pending_versions(&[20250101000001]), vec![20250101000002]);
        assert!(pending_versions(&[20250101000001, 20250101000002]).is_empty());
    }
}
