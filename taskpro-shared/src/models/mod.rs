/// Database models for TaskPro
///
/// Row types and their owner-scoped queries.
///
/// # Models
///
/// - `user`: accounts and credentials
/// - `task`: tasks, filters and partial updates
/// - `tag`: per-owner tags and the task/tag link table
///
/// # Example
///
/// ```no_run
/// use taskpro_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskpro_shared::models::task::{Task, TaskFilter};
/// use uuid::Uuid;
///
/// # async fn example(owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let tasks = Task::find(&pool, owner, &TaskFilter::default()).await?;
/// println!("{} tasks", tasks.len());
/// # Ok(())
/// # }
/// ```

pub mod tag;
pub mod task;
pub mod user;
