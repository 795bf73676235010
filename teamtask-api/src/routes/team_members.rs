/// Team membership endpoints
///
/// - `POST /api/teamMember` - Add a user (by email) to a team
/// - `DELETE /api/teamMember` - Remove a member (by id) from a team
///
/// Only the captain manages the roster, and the captain can never be removed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{collect, finish_validation, load_team, JsonBody},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::{
        authorization::{check_member_addition, check_member_removal, require_captain},
        middleware::AuthContext,
    },
    models::view::TeamView,
    store::populate_team,
    validation::{normalize_email, object_id_field, required_text},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub team_id: Option<String>,
    pub member_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberRequest {
    pub team_id: Option<String>,
    pub member_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub message: String,
    pub team: TeamView,
}

/// Adds a member to a team
///
/// # Endpoint
///
/// ```text
/// POST /api/teamMember
/// Content-Type: application/json
///
/// { "teamId": "64b7f0c2a1b2c3d4e5f60718", "memberEmail": "bob@example.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or malformed team id
/// - `403 Forbidden`: caller is not the captain
/// - `404 Not Found`: unknown team or email
/// - `409 Conflict`: user already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let mut errors = Vec::new();
    let team_id = collect(&mut errors, required_text("teamId", req.team_id.as_deref()))
        .and_then(|raw| collect(&mut errors, object_id_field("teamId", &raw)));
    let email = collect(
        &mut errors,
        required_text("memberEmail", req.member_email.as_deref()),
    );
    finish_validation(errors)?;

    let (Some(team_id), Some(email)) = (team_id, email) else {
        return Err(ApiError::BadRequest("teamId and memberEmail are required".to_string()));
    };

    let team = load_team(&state, &team_id).await?;
    require_captain(&team, &auth.user_id)?;

    let member = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    check_member_addition(&team, &auth.user_id, &member.id)?;

    let team = state
        .store
        .add_team_member(&team.id, &member.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    tracing::info!(team_id = %team.id, member_id = %member.id, "Member added");

    Ok(Json(MembershipResponse {
        message: "Member added successfully".to_string(),
        team: populate_team(state.store(), team).await?,
    }))
}

/// Removes a member from a team
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, target is the captain, or target is
///   not a member
/// - `403 Forbidden`: caller is not the captain
/// - `404 Not Found`: unknown team
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<RemoveMemberRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let mut errors = Vec::new();
    let team_id = collect(&mut errors, required_text("teamId", req.team_id.as_deref()))
        .and_then(|raw| collect(&mut errors, object_id_field("teamId", &raw)));
    let member_id = collect(
        &mut errors,
        required_text("memberId", req.member_id.as_deref()),
    )
    .and_then(|raw| collect(&mut errors, object_id_field("memberId", &raw)));
    finish_validation(errors)?;

    let (Some(team_id), Some(member_id)) = (team_id, member_id) else {
        return Err(ApiError::BadRequest("teamId and memberId are required".to_string()));
    };

    let team = load_team(&state, &team_id).await?;
    check_member_removal(&team, &auth.user_id, &member_id)?;

    let team = state
        .store
        .remove_team_member(&team.id, &member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    tracing::info!(team_id = %team.id, member_id = %member_id, "Member removed");

    Ok(Json(MembershipResponse {
        message: "Member removed successfully".to_string(),
        team: populate_team(state.store(), team).await?,
    }))
}
