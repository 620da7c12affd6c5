/// Task endpoints
///
/// Every handler is scoped to the authenticated user: a task id belonging to
/// someone else behaves exactly like a missing one (404).
///
/// Priority and status are accepted case-insensitively (`"high"`,
/// `"in_progress"`) and always returned upper-case.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskpro_shared::{
    auth::middleware::AuthContext,
    models::{
        tag::MAX_TAG_NAME_LEN,
        task::{CreateTask, Priority, Status, Task, TaskFilter, UpdateTask},
    },
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub status: Option<String>,
    pub priority: Option<String>,

    /// Exact tag name
    #[serde(alias = "tag")]
    pub tags: Option<String>,

    /// Free text over title, description and tag names
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Defaults to MEDIUM
    #[serde(default)]
    pub priority: Option<String>,

    /// Defaults to TODO
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Vec<String>,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    /// Replaces the whole tag set; `[]` clears it
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Option<Vec<String>>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    params: Result<Query<ListTasksParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(params) = params?;
    let filter = build_filter(params)?;

    let tasks = Task::find(&state.db, auth.user_id, &filter).await?;
    Ok(Json(tasks))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(params) = params?;
    let query = params.q.unwrap_or_default();

    let tasks = state.search.search(auth.user_id, &query).await?;
    Ok(Json(tasks))
}

pub async fn search_history(State(state): State<AppState>, auth: AuthContext) -> Json<Vec<String>> {
    Json(state.search.history(auth.user_id).await)
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let id = task_id(id)?;

    let task = Task::find_by_id_and_owner(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    let data = validate_create(req)?;

    let task = Task::create(&state.db, auth.user_id, data).await?;
    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = task_id(id)?;
    let Json(req) = payload?;
    let data = validate_update(req)?;

    let task = Task::update(&state.db, id, auth.user_id, data)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = task_id(id)?;

    if !Task::delete(&state.db, id, auth.user_id).await? {
        return Err(task_not_found());
    }

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn task_id(id: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid task id".to_string()))
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn build_filter(params: ListTasksParams) -> ApiResult<TaskFilter> {
    let mut details = Vec::new();

    let status = parse_field::<Status>("status", params.status.as_deref(), &mut details);
    let priority = parse_field::<Priority>("priority", params.priority.as_deref(), &mut details);

    if !details.is_empty() {
        return Err(ApiError::ValidationError(details));
    }

    Ok(TaskFilter {
        status,
        priority,
        query: params.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
        tag: params.tags.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
    })
}

/// Title and tag rules come from the derive; enum fields are parsed by hand
/// so the error names the accepted values. Details are sorted by field.
fn validate_create(mut req: CreateTaskRequest) -> ApiResult<CreateTask> {
    req.title = req.title.trim().to_string();
    let mut details = derived_errors(&req);

    let priority = parse_field::<Priority>("priority", req.priority.as_deref(), &mut details);
    let status = parse_field::<Status>("status", req.status.as_deref(), &mut details);

    if !details.is_empty() {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(ApiError::ValidationError(details));
    }

    Ok(CreateTask {
        title: req.title,
        description: req.description.unwrap_or_default(),
        priority: priority.unwrap_or(Priority::Medium),
        status: status.unwrap_or(Status::Todo),
        due_date: req.due_date,
        tags: req.tags,
    })
}

fn validate_update(mut req: UpdateTaskRequest) -> ApiResult<UpdateTask> {
    req.title = req.title.map(|t| t.trim().to_string());
    let mut details = derived_errors(&req);

    let priority = parse_field::<Priority>("priority", req.priority.as_deref(), &mut details);
    let status = parse_field::<Status>("status", req.status.as_deref(), &mut details);

    if !details.is_empty() {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(ApiError::ValidationError(details));
    }

    Ok(UpdateTask {
        title: req.title,
        description: req.description,
        priority,
        status,
        due_date: req.due_date,
        tags: req.tags,
    })
}

fn derived_errors(req: &impl Validate) -> Vec<ValidationErrorDetail> {
    match req.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => validation_details(&errors),
    }
}

fn parse_field<T>(
    field: &str,
    raw: Option<&str>,
    details: &mut Vec<ValidationErrorDetail>,
) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            details.push(ValidationErrorDetail::new(field, e.to_string()));
            None
        }
    }
}

/// Names are measured after trimming, the way they are stored
fn validate_tag_names(tags: &[String]) -> Result<(), ValidationError> {
    match tags.iter().find(|t| t.trim().chars().count() > MAX_TAG_NAME_LEN) {
        None => Ok(()),
        Some(tag) => {
            let mut err = ValidationError::new("tag_length");
            err.message = Some(
                format!(
                    "Tag '{}' is longer than {} characters",
                    tag.trim(),
                    MAX_TAG_NAME_LEN
                )
                .into(),
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            priority: None,
            status: None,
            due_date: None,
            tags: Vec::new(),
        }
    }

    fn fields(err: ApiError) -> Vec<String> {
        match err {
            ApiError::ValidationError(details) => details.into_iter().map(|d| d.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_defaults() {
        let data = validate_create(create_request("  Fix bug ")).unwrap();

        assert_eq!(data.title, "Fix bug");
        assert_eq!(data.description, "");
        assert_eq!(data.priority, Priority::Medium);
        assert_eq!(data.status, Status::Todo);
        assert!(data.tags.is_empty());
    }

    #[test]
    fn test_create_parses_enums_case_insensitively() {
        let mut req = create_request("Fix bug");
        req.priority = Some("high".to_string());
        req.status = Some("in_progress".to_string());

        let data = validate_create(req).unwrap();
        assert_eq!(data.priority, Priority::High);
        assert_eq!(data.status, Status::InProgress);
    }

    #[test]
    fn test_create_collects_every_error() {
        let mut req = create_request("   ");
        req.priority = Some("urgent".to_string());
        req.status = Some("later".to_string());
        req.tags = vec!["x".repeat(MAX_TAG_NAME_LEN + 1)];

        assert_eq!(
            fields(validate_create(req).unwrap_err()),
            vec!["priority", "status", "tags", "title"]
        );
    }

    #[test]
    fn test_title_length_is_checked_after_trimming() {
        assert!(validate_create(create_request(&format!("  {}  ", "t".repeat(255)))).is_ok());

        let err = validate_create(create_request(&"t".repeat(256))).unwrap_err();
        assert_eq!(fields(err), vec!["title"]);
    }

    #[test]
    fn test_tag_names_are_measured_trimmed() {
        let mut req = create_request("Fix bug");
        req.tags = vec![format!(" {} ", "x".repeat(MAX_TAG_NAME_LEN))];
        assert!(validate_create(req).is_ok());

        let err = validate_update(UpdateTaskRequest {
            tags: Some(vec!["ok".to_string(), "x".repeat(MAX_TAG_NAME_LEN + 1)]),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "tags");
                assert!(details[0].message.contains("longer than"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let data = validate_update(UpdateTaskRequest {
            status: Some("DONE".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(data.status, Some(Status::Done));
        assert!(data.title.is_none());
        assert!(data.tags.is_none());
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let err = validate_update(UpdateTaskRequest {
            title: Some(" ".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["title"]);
    }

    #[test]
    fn test_build_filter() {
        let filter = build_filter(ListTasksParams {
            status: Some("todo".to_string()),
            priority: None,
            tags: Some(" backend ".to_string()),
            q: Some("  ".to_string()),
        })
        .unwrap();

        assert_eq!(filter.status, Some(Status::Todo));
        assert_eq!(filter.tag.as_deref(), Some("backend"));
        assert!(filter.query.is_none());

        let err = build_filter(ListTasksParams {
            priority: Some("extreme".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["priority"]);
    }
}
