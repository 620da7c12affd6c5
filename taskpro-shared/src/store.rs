/// Task lookup seam used by the search orchestrator
///
/// The orchestrator only needs filtered reads, so it depends on this trait
/// rather than on `PgPool` directly; tests plug in an in-memory store.

use crate::models::task::{Task, TaskFilter};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Owner's tasks matching every set field of `filter`, newest first
    async fn find_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, sqlx::Error>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, sqlx::Error> {
        Task::find(&self.pool, owner_id, filter).await
    }
}
