/// Tag model
///
/// Tags belong to a single owner and are unique by name within that owner.
/// They are created lazily the first time a task references the name and are
/// never removed when a task goes away; only the `task_tags` link is.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(50) NOT NULL,
///     UNIQUE (user_id, name)
/// );
///
/// CREATE TABLE task_tags (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Longest tag name the schema accepts
pub const MAX_TAG_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,

    /// Owner; the same name under two owners is two different tags
    pub user_id: Uuid,

    pub name: String,
}

#[derive(sqlx::FromRow)]
struct TaskTagRow {
    task_id: Uuid,
    id: Uuid,
    user_id: Uuid,
    name: String,
}

/// Trims names, drops blanks and collapses duplicates (first one wins)
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.to_string()))
        .map(str::to_string)
        .collect()
}

impl Tag {
    /// Returns the owner's tag with this name, creating it if needed
    ///
    /// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on
    /// conflict, so concurrent first uses converge on one tag.
    pub async fn get_or_create(
        conn: &mut PgConnection,
        user_id: Uuid,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(conn)
        .await
    }

    /// Resolves a list of raw names into the owner's tags, in input order
    pub async fn resolve_all<S: AsRef<str>>(
        conn: &mut PgConnection,
        user_id: Uuid,
        names: &[S],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tags = Vec::new();
        for name in normalize_tag_names(names) {
            tags.push(Self::get_or_create(&mut *conn, user_id, &name).await?);
        }
        Ok(tags)
    }

    /// Replaces the full tag set of a task
    pub async fn replace_links(
        conn: &mut PgConnection,
        task_id: Uuid,
        tags: &[Tag],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        if tags.is_empty() {
            return Ok(());
        }

        let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
        sqlx::query(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            SELECT $1, UNNEST($2::UUID[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(&tag_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads the tags of many tasks at once, keyed by task id
    ///
    /// Each task's tags come back sorted by name.
    pub async fn find_for_tasks<'e, E>(
        executor: E,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Self>>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut by_task: HashMap<Uuid, Vec<Self>> = HashMap::new();
        if task_ids.is_empty() {
            return Ok(by_task);
        }

        let rows = sqlx::query_as::<_, TaskTagRow>(
            r#"
            SELECT tt.task_id, tg.id, tg.user_id, tg.name
            FROM task_tags tt
            JOIN tags tg ON tg.id = tt.tag_id
            WHERE tt.task_id = ANY($1)
            ORDER BY tg.name
            "#,
        )
        .bind(task_ids)
        .fetch_all(executor)
        .await?;

        for row in rows {
            by_task.entry(row.task_id).or_default().push(Tag {
                id: row.id,
                user_id: row.user_id,
                name: row.name,
            });
        }

        Ok(by_task)
    }

    /// Every tag the owner has ever used, sorted by name
    pub async fn list_by_owner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, user_id, name FROM tags WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_skips_blank() {
        let names = vec!["  urgent ", "", "   ", "work"];
        assert_eq!(normalize_tag_names(&names), vec!["urgent", "work"]);
    }

    #[test]
    fn test_normalize_keeps_first_duplicate() {
        let names = vec!["work", "home", " work", "home "];
        assert_eq!(normalize_tag_names(&names), vec!["work", "home"]);
    }

    #[test]
    fn test_normalize_is_case_sensitive() {
        let names = vec!["Urgent", "urgent"];
        assert_eq!(normalize_tag_names(&names), vec!["Urgent", "urgent"]);
    }

    #[test]
    fn test_normalize_empty_input() {
        let names: Vec<String> = Vec::new();
        assert!(normalize_tag_names(&names).is_empty());
    }
}
