//! API route handlers
//!
//! Handlers are organized by resource:
//!
//! - `health`: health check
//! - `auth`: signup, login, logout, current user
//! - `teams`: team CRUD
//! - `team_members`: adding and removing members
//! - `tasks`: task CRUD and partial updates
//!
//! Every handler follows the same order: authenticate (done by the router
//! layer), parse identifiers, load documents, authorize, validate, persist.

pub mod auth;
pub mod health;
pub mod tasks;
pub mod team_members;
pub mod teams;

use axum::extract::{FromRequest, FromRequestParts};
use teamtask_shared::{
    models::{object_id::ObjectId, task::Task, team::Team},
    validation::FieldError,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// JSON body extractor whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor with the same error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Parses a path or body identifier, failing with `Invalid <what> ID`
pub fn parse_id(raw: &str, what: &str) -> ApiResult<ObjectId> {
    ObjectId::parse(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}

/// Turns collected field errors into a single validation failure
pub fn finish_validation(errors: Vec<FieldError>) -> ApiResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(errors))
    }
}

/// Records the error of a field check and yields its value, if any
pub fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

pub async fn load_team(state: &AppState, id: &ObjectId) -> ApiResult<Team> {
    state
        .store
        .find_team_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))
}

pub async fn load_task(state: &AppState, id: &ObjectId) -> ApiResult<Task> {
    state
        .store
        .find_task_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}
