/// Task endpoints
///
/// - `GET /api/task?teamId=<id>[&status=<status>]` - List a team's tasks
/// - `POST /api/task` - Create a task (team captain only)
/// - `GET /api/task/:id` - Task details, team members only
/// - `PATCH /api/task/:id` - Partial update, creator only
/// - `DELETE /api/task/:id` - Delete, creator only
///
/// Tasks are returned populated: `assignedTo` and `createdBy` carry
/// `{ _id, name, email }`, `team` carries `{ _id, name }`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{collect, finish_validation, load_task, load_team, parse_id, JsonBody, QueryParams},
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use teamtask_shared::{
    auth::{
        authorization::{
            check_task_creation, require_task_creator, require_team_member, AuthzError,
        },
        middleware::AuthContext,
    },
    models::{
        object_id::ObjectId,
        task::{CreateTask, TaskFilter, TaskPriority, TaskStatus},
        task_patch::TaskPatch,
        team::TeamRole,
        view::TaskView,
    },
    store::{populate_task, populate_tasks},
    validation::{
        object_id_field, parse_due_date, required_text, FieldError, DUE_DATE_FORMAT_MESSAGE,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub team_id: Option<String>,
    pub status: Option<String>,
}

/// Task creation body
///
/// Fields are kept as raw strings so every problem can be reported at once.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub team: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskView,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub message: String,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskDeletedResponse {
    pub message: String,
}

fn task_response(message: &str, task: TaskView) -> Json<TaskResponse> {
    Json(TaskResponse {
        message: message.to_string(),
        task,
    })
}

fn required_id(field: &str, value: Option<&str>) -> Result<ObjectId, FieldError> {
    object_id_field(field, &required_text(field, value)?)
}

fn optional_enum<T>(field: &str, value: Option<&str>) -> Result<T, FieldError>
where
    T: std::str::FromStr<Err = String> + Default,
{
    match value.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(raw) => raw
            .parse()
            .map_err(|message: String| FieldError::new(field, message)),
    }
}

fn required_due_date(value: Option<&str>) -> Result<DateTime<Utc>, FieldError> {
    let raw = required_text("dueDate", value)?;
    parse_due_date(&raw).ok_or_else(|| FieldError::new("dueDate", DUE_DATE_FORMAT_MESSAGE))
}

impl CreateTaskRequest {
    /// Validates every field and reports all failures together
    fn validate(self, created_by: &AuthContext) -> ApiResult<CreateTask> {
        let mut errors = Vec::new();

        let title = collect(&mut errors, required_text("title", self.title.as_deref()));
        let description = collect(
            &mut errors,
            required_text("description", self.description.as_deref()),
        );
        let priority = collect(
            &mut errors,
            optional_enum::<TaskPriority>("priority", self.priority.as_deref()),
        );
        let status = collect(
            &mut errors,
            optional_enum::<TaskStatus>("status", self.status.as_deref()),
        );
        let due_date = collect(&mut errors, required_due_date(self.due_date.as_deref()));
        let team = collect(&mut errors, required_id("team", self.team.as_deref()));
        let assigned_to = collect(
            &mut errors,
            required_id("assignedTo", self.assigned_to.as_deref()),
        );
        finish_validation(errors)?;

        match (title, description, priority, status, due_date, team, assigned_to) {
            (
                Some(title),
                Some(description),
                Some(priority),
                Some(status),
                Some(due_date),
                Some(team),
                Some(assigned_to),
            ) => Ok(CreateTask {
                title,
                description,
                priority,
                status,
                assigned_to,
                created_by: created_by.user_id.clone(),
                team,
                due_date,
            }),
            _ => Err(ApiError::BadRequest("All fields are required".to_string())),
        }
    }
}

/// Collects field assignments for a partial update
///
/// Query parameters come first as strings; body fields override them.
fn update_fields(query: HashMap<String, String>, body: &Bytes) -> ApiResult<Map<String, Value>> {
    let mut fields: Map<String, Value> = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(fields);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => {
            fields.extend(object);
            Ok(fields)
        }
        Ok(_) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON body: {}", e))),
    }
}

/// Lists the tasks of a team, newest first
///
/// The captain sees every task of the team; other members only see the
/// tasks assigned to them.
///
/// # Errors
///
/// - `400 Bad Request`: missing or malformed `teamId`, unknown `status`
/// - `403 Forbidden`: caller is not a member of the team
/// - `404 Not Found`: unknown team
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let team_id = match query.team_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_id(raw, "Team")?,
        _ => return Err(ApiError::BadRequest("teamId is required".to_string())),
    };

    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<TaskStatus>()
                .map_err(|message| ApiError::invalid_field("status", message))?,
        ),
    };

    let team = load_team(&state, &team_id).await?;

    let mut filter = TaskFilter::for_team(team.id.clone());
    filter.status = status;
    match team.role_of(&auth.user_id) {
        Some(TeamRole::Captain) => {}
        Some(TeamRole::Member) => filter.assigned_to = Some(auth.user_id.clone()),
        None => return Err(AuthzError::NotTeamMember.into()),
    }

    let tasks = state.store.list_tasks(&filter).await?;
    let tasks = populate_tasks(state.store(), tasks).await?;

    Ok(Json(TaskListResponse {
        message: "Tasks fetched successfully".to_string(),
        tasks,
    }))
}

/// Creates a task
///
/// # Endpoint
///
/// ```text
/// POST /api/task
/// Content-Type: application/json
///
/// {
///   "title": "Ship release",
///   "description": "Cut and publish 1.2",
///   "priority": "high",
///   "dueDate": "2025-03-01",
///   "team": "64b7f0c2a1b2c3d4e5f60718",
///   "assignedTo": "64b7f0c2a1b2c3d4e5f60719"
/// }
/// ```
///
/// `priority` defaults to `medium`, `status` to `pending`.
///
/// # Errors
///
/// - `400 Bad Request`: invalid fields, or assignee outside the team
/// - `403 Forbidden`: caller is not the team captain
/// - `404 Not Found`: unknown team
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let data = req.validate(&auth)?;

    let team = load_team(&state, &data.team).await?;
    check_task_creation(&team, &auth.user_id, &data.assigned_to)?;

    let task = state.store.create_task(data).await?;
    tracing::info!(task_id = %task.id, team_id = %task.team, "Task created");

    let task = populate_task(state.store(), task).await?;
    Ok((
        StatusCode::CREATED,
        task_response("Task created successfully", task),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;
    let task = load_task(&state, &id).await?;

    let team = load_team(&state, &task.team).await?;
    require_team_member(&team, &auth.user_id)?;

    let task = populate_task(state.store(), task).await?;
    Ok(task_response("Task fetched successfully", task))
}

/// Partially updates a task
///
/// Fields may come from the JSON body or the query string; the body wins
/// when both name the same field. Only the creator may update a task, and a
/// request with any invalid field changes nothing. Neither the query string
/// nor the body is parsed until the task is found and the caller is its
/// creator.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/task/:id
/// Content-Type: application/json
///
/// { "status": "completed" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: invalid task id, or any invalid/unknown field
/// - `403 Forbidden`: caller did not create the task
/// - `404 Not Found`: unknown task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    uri: Uri,
    body: Bytes,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, "Task")?;
    let task = load_task(&state, &id).await?;
    require_task_creator(&task, &auth.user_id)?;

    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&uri)?;
    let fields = update_fields(query, &body)?;
    let patch = TaskPatch::from_fields(&fields).map_err(ApiError::ValidationError)?;

    let task = state
        .store
        .update_task(&task.id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, fields = ?patch.touched_fields(), "Task updated");

    let task = populate_task(state.store(), task).await?;
    Ok(task_response("Task updated successfully", task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskDeletedResponse>> {
    let id = parse_id(&id, "Task")?;
    let task = load_task(&state, &id).await?;
    require_task_creator(&task, &auth.user_id)?;

    if !state.store.delete_task(&task.id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task.id, "Task deleted");

    Ok(Json(TaskDeletedResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_fields_body_overrides_query() {
        let query = HashMap::from([
            ("status".to_string(), "pending".to_string()),
            ("title".to_string(), "From query".to_string()),
        ]);
        let body = Bytes::from_static(br#"{"status":"completed"}"#);

        let fields = update_fields(query, &body).unwrap();

        assert_eq!(fields["status"], "completed");
        assert_eq!(fields["title"], "From query");
    }

    #[test]
    fn test_update_fields_empty_body() {
        let fields = update_fields(HashMap::new(), &Bytes::new()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_update_fields_rejects_non_object() {
        let err = update_fields(HashMap::new(), &Bytes::from_static(b"[1,2]")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = update_fields(HashMap::new(), &Bytes::from_static(b"{oops")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_optional_enum_defaults() {
        assert_eq!(
            optional_enum::<TaskPriority>("priority", None).unwrap(),
            TaskPriority::Medium
        );
        assert_eq!(
            optional_enum::<TaskStatus>("status", Some("in_progress")).unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            optional_enum::<TaskStatus>("status", Some("done"))
                .unwrap_err()
                .field,
            "status"
        );
    }

    #[test]
    fn test_create_request_reports_every_field() {
        let auth = AuthContext {
            user_id: ObjectId::new(),
            role: teamtask_shared::models::user::UserRole::Captain,
            source: teamtask_shared::auth::middleware::TokenSource::Header,
        };
        let req = CreateTaskRequest {
            title: Some("  ".to_string()),
            description: None,
            priority: Some("urgent".to_string()),
            status: None,
            due_date: Some("not-a-date".to_string()),
            team: Some("123".to_string()),
            assigned_to: None,
        };

        let Err(ApiError::ValidationError(errors)) = req.validate(&auth) else {
            panic!("expected validation error");
        };

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["title", "description", "priority", "dueDate", "team", "assignedTo"]
        );
    }
}
