/// Task model and database operations
///
/// Every query is scoped by owner: a task id on its own never reaches a row,
/// the `(id, user_id)` pair does.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
/// CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'DONE');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     status task_status NOT NULL DEFAULT 'TODO',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskpro_shared::models::task::{CreateTask, Priority, Status, Task, TaskFilter};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, owner, CreateTask {
///     title: "Fix bug".to_string(),
///     description: String::new(),
///     priority: Priority::High,
///     status: Status::Todo,
///     due_date: None,
///     tags: vec!["backend".to_string()],
/// })
/// .await?;
///
/// let hits = Task::find(&pool, owner, &TaskFilter::with_query("bug")).await?;
/// assert_eq!(hits[0].id, task.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::tag::Tag;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, priority, status, due_date, created_at, updated_at";

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

/// Returned when a priority or status string matches no variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}', expected one of {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    /// Case-insensitive: "high", "High" and "HIGH" all parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(ParseEnumError {
                kind: "priority",
                value: s.to_string(),
                expected: "LOW, MEDIUM, HIGH",
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    /// Case-insensitive; "in progress" and "in-progress" are accepted too
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "TODO" => Ok(Status::Todo),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "DONE" => Ok(Status::Done),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
                expected: "TODO, IN_PROGRESS, DONE",
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task together with its tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owner; fixed at creation
    pub user_id: Uuid,

    pub title: String,

    pub description: String,

    pub priority: Priority,

    pub status: Status,

    pub due_date: Option<DateTime<Utc>>,

    /// Loaded in a second query, sorted by name
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,

    /// Raw tag names; normalized and resolved against the owner's tags
    pub tags: Vec<String>,
}

/// Partial update: only `Some` fields change
///
/// `tags: Some(vec![])` clears every tag, `tags: None` leaves them alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl UpdateTask {
    fn touches_columns(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.status.is_some()
            || self.due_date.is_some()
    }
}

/// Listing filter; every field is optional and set fields are AND-ed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,

    /// Case-insensitive substring of title, description or any tag name
    pub query: Option<String>,

    /// Exact tag name
    pub tag: Option<String>,
}

impl TaskFilter {
    /// Free-text only filter, as used by search
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }
}

/// Escapes LIKE metacharacters so user text matches literally
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the owner-scoped SELECT for a filter
///
/// Empty strings in `query` and `tag` are treated as absent.
pub fn build_filter_query(owner_id: Uuid, filter: &TaskFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "));
    qb.push_bind(owner_id);

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(query));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM task_tags tt JOIN tags tg ON tg.id = tt.tag_id \
                 WHERE tt.task_id = tasks.id AND tg.name ILIKE ",
            )
            .push_bind(pattern)
            .push("))");
    }
    if let Some(tag) = filter.tag.as_deref().filter(|t| !t.is_empty()) {
        qb.push(
            " AND EXISTS (SELECT 1 FROM task_tags tt JOIN tags tg ON tg.id = tt.tag_id \
             WHERE tt.task_id = tasks.id AND tg.name = ",
        )
        .push_bind(tag.to_string())
        .push(")");
    }

    qb.push(" ORDER BY created_at DESC, id");
    qb
}

impl Task {
    /// Creates a task and links its tags in one transaction
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (user_id, title, description, priority, status, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TASK_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.due_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut tags = Tag::resolve_all(&mut tx, owner_id, &data.tags).await?;
        Tag::replace_links(&mut tx, task.id, &tags).await?;
        tx.commit().await?;

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        task.tags = tags;

        tracing::debug!(task_id = %task.id, user_id = %owner_id, "Created task");
        Ok(task)
    }

    /// Fetches one task if it belongs to `owner_id`
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        let Some(mut task) = task else {
            return Ok(None);
        };

        let mut tags = Tag::find_for_tasks(pool, &[task.id]).await?;
        task.tags = tags.remove(&task.id).unwrap_or_default();
        Ok(Some(task))
    }

    /// Lists the owner's tasks matching `filter`, newest first
    pub async fn find(
        pool: &PgPool,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = build_filter_query(owner_id, filter);
        let mut tasks = qb.build_query_as::<Task>().fetch_all(pool).await?;

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut tags = Tag::find_for_tasks(pool, &ids).await?;
        for task in &mut tasks {
            task.tags = tags.remove(&task.id).unwrap_or_default();
        }

        Ok(tasks)
    }

    /// Applies a partial update
    ///
    /// Returns None when no task with this id belongs to `owner_id`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Always bump updated_at so a tags-only update still marks the row.
        let touches_columns = data.touches_columns();
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");
        if let Some(title) = data.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(priority) = data.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(status) = data.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(due_date) = data.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner_id)
            .push(format!(" RETURNING {TASK_COLUMNS}"));

        let Some(mut task) = qb.build_query_as::<Task>().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        match data.tags {
            Some(names) => {
                let mut tags = Tag::resolve_all(&mut tx, owner_id, &names).await?;
                Tag::replace_links(&mut tx, task.id, &tags).await?;
                tags.sort_by(|a, b| a.name.cmp(&b.name));
                task.tags = tags;
            }
            None => {
                let mut tags = Tag::find_for_tasks(&mut *tx, &[task.id]).await?;
                task.tags = tags.remove(&task.id).unwrap_or_default();
            }
        }

        tx.commit().await?;

        tracing::debug!(task_id = %id, user_id = %owner_id, touches_columns, "Updated task");
        Ok(Some(task))
    }

    /// Deletes a task; its tag links go with it, the tags stay
    ///
    /// Returns false when no task with this id belongs to `owner_id`.
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
