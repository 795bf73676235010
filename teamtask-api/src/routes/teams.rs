/// Team endpoints
///
/// - `GET /api/team` - Teams the caller belongs to
/// - `POST /api/team` - Create a team (caller becomes captain)
/// - `GET /api/team/:id` - Team details, members only
/// - `PATCH /api/team/:id` - Rename, captain only
/// - `DELETE /api/team/:id` - Delete with its tasks, captain only
///
/// Teams are always returned populated: captain and members carry
/// `{ _id, name, email }` instead of bare ids.

use crate::{
    app::AppState,
    error::{field_errors, ApiError, ApiResult},
    routes::{collect, finish_validation, load_team, parse_id, JsonBody},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::{
        authorization::{require_captain, require_team_member},
        middleware::AuthContext,
    },
    models::{team::CreateTeam, user::UserRole, view::TeamView},
    store::{populate_team, populate_teams, TEAM_NAME_TAKEN},
    validation::{required_text, trim_in_place},
};
use validator::Validate;

/// Body of team create and rename
#[derive(Debug, Deserialize, Validate)]
pub struct TeamNameRequest {
    #[validate(length(max = 100, message = "Team name must be at most 100 characters"))]
    pub name: Option<String>,
}

impl TeamNameRequest {
    fn into_name(mut self) -> ApiResult<String> {
        trim_in_place(&mut self.name);

        let mut errors = self
            .validate()
            .err()
            .map(|e| field_errors(&e))
            .unwrap_or_default();

        let name = collect(&mut errors, required_text("name", self.name.as_deref()));
        finish_validation(errors)?;

        name.ok_or_else(|| ApiError::invalid_field("name", "name is required"))
    }
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub message: String,
    pub team: TeamView,
}

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub message: String,
    pub teams: Vec<TeamView>,
}

#[derive(Debug, Serialize)]
pub struct TeamDeletedResponse {
    pub message: String,
}

fn team_response(message: &str, team: TeamView) -> Json<TeamResponse> {
    Json(TeamResponse {
        message: message.to_string(),
        team,
    })
}

/// Lists the teams the caller is a member of, newest first
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TeamListResponse>> {
    let teams = state.store.list_teams_for_member(&auth.user_id).await?;
    let teams = populate_teams(state.store(), teams).await?;

    Ok(Json(TeamListResponse {
        message: "Teams fetched successfully".to_string(),
        teams,
    }))
}

/// Creates a team
///
/// # Endpoint
///
/// ```text
/// POST /api/team
/// Content-Type: application/json
///
/// { "name": "Platform" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: blank name
/// - `409 Conflict`: name already taken
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<TeamNameRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let name = req.into_name()?;

    if state.store.find_team_by_name(&name).await?.is_some() {
        return Err(ApiError::Conflict(TEAM_NAME_TAKEN.to_string()));
    }

    let team = state
        .store
        .create_team(CreateTeam {
            name,
            captain: auth.user_id.clone(),
        })
        .await?;

    state
        .store
        .set_user_role(&auth.user_id, UserRole::Captain)
        .await?;

    tracing::info!(team_id = %team.id, captain = %auth.user_id, "Team created");

    let team = populate_team(state.store(), team).await?;
    Ok((
        StatusCode::CREATED,
        team_response("Team created successfully", team),
    ))
}

pub async fn get_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TeamResponse>> {
    let id = parse_id(&id, "Team")?;
    let team = load_team(&state, &id).await?;
    require_team_member(&team, &auth.user_id)?;

    let team = populate_team(state.store(), team).await?;
    Ok(team_response("Team fetched successfully", team))
}

/// Renames a team
///
/// The new name may equal the current one; it only conflicts with other
/// teams.
pub async fn rename_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<TeamNameRequest>,
) -> ApiResult<Json<TeamResponse>> {
    let id = parse_id(&id, "Team")?;
    let team = load_team(&state, &id).await?;
    require_captain(&team, &auth.user_id)?;

    let name = req.into_name()?;

    if let Some(other) = state.store.find_team_by_name(&name).await? {
        if other.id != team.id {
            return Err(ApiError::Conflict(TEAM_NAME_TAKEN.to_string()));
        }
    }

    let team = state
        .store
        .rename_team(&team.id, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let team = populate_team(state.store(), team).await?;
    Ok(team_response("Team updated successfully", team))
}

/// Deletes a team together with its tasks
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TeamDeletedResponse>> {
    let id = parse_id(&id, "Team")?;
    let team = load_team(&state, &id).await?;
    require_captain(&team, &auth.user_id)?;

    if !state.store.delete_team(&team.id).await? {
        return Err(ApiError::NotFound("Team not found".to_string()));
    }

    tracing::info!(team_id = %team.id, "Team deleted");

    Ok(Json(TeamDeletedResponse {
        message: "Team deleted successfully".to_string(),
    }))
}
