/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Current user
/// - Logout
///
/// Successful signup and login return the session token in the body and
/// also set it as the `token` cookie, so both browser and API clients work.
///
/// # Endpoints
///
/// - `POST /api/auth/signup` - Register new user
/// - `POST /api/auth/login` - Login and get a session token
/// - `GET /api/auth/me` - Current user
/// - `GET /api/auth/logout` - Clear the session cookie

use crate::{
    app::AppState,
    error::{field_errors, ApiError, ApiResult},
    routes::{collect, finish_validation, JsonBody},
};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::{clear_session_cookie, session_cookie, AuthContext},
        password,
    },
    models::user::{CreateUser, User},
    store::EMAIL_TAKEN,
    validation::{normalize_email, required_text, trim_in_place, FieldError},
};
use validator::{Validate, ValidateEmail};

/// Signup request
///
/// Every field is optional at the JSON level so that missing fields are
/// reported together as validation details rather than as a parse error.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 254, message = "Email must be at most 254 characters"))]
    pub email: Option<String>,

    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 254, message = "Email must be at most 254 characters"))]
    pub email: Option<String>,

    pub password: Option<String>,
}

/// Response for signup and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,

    pub user: User,

    /// Session token, also set as the `token` cookie
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn required_email(value: Option<&str>) -> Result<String, FieldError> {
    let email = normalize_email(&required_text("email", value)?);

    if email.validate_email() {
        Ok(email)
    } else {
        Err(FieldError::new("email", "Invalid email format"))
    }
}

fn required_password(value: Option<&str>) -> Result<String, FieldError> {
    let value = value.unwrap_or_default();
    password::validate_password(value).map_err(|message| FieldError::new("password", message))?;
    Ok(value.to_string())
}

/// Issues a session token and wraps it in a response with the cookie set
fn start_session(
    state: &AppState,
    status: StatusCode,
    message: &str,
    user: User,
) -> ApiResult<impl IntoResponse> {
    let ttl = state.config.jwt.ttl();
    let claims = Claims::new(user.id.clone(), user.role, ttl);
    let token = create_token(&claims, state.jwt_secret())?;

    let cookie = session_cookie(&token, ttl, state.config.api.production)
        .ok_or_else(|| ApiError::InternalError("Session token is not a valid cookie".to_string()))?;

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            message: message.to_string(),
            user,
            token,
        }),
    ))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/signup
/// Content-Type: application/json
///
/// { "name": "Alice", "email": "alice@example.com", "password": "secret" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ message, user, token }` and a `Set-Cookie` header.
///
/// # Errors
///
/// - `400 Bad Request`: missing or malformed fields
/// - `409 Conflict`: email already registered
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    trim_in_place(&mut req.name);
    trim_in_place(&mut req.email);

    let mut errors = req
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();

    let name = collect(&mut errors, required_text("name", req.name.as_deref()));
    let email = collect(&mut errors, required_email(req.email.as_deref()));
    let password = collect(&mut errors, required_password(req.password.as_deref()));
    finish_validation(errors)?;

    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    };

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = password::hash_password(&password)?;

    let user = state
        .store
        .create_user(CreateUser {
            name,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    start_session(
        &state,
        StatusCode::CREATED,
        "User registered successfully",
        user,
    )
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or wrong password
/// - `404 Not Found`: no account for the email
pub async fn login(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    trim_in_place(&mut req.email);

    let mut errors = req
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();

    let email = collect(&mut errors, required_text("email", req.email.as_deref()));
    let password = collect(&mut errors, required_password(req.password.as_deref()));
    finish_validation(errors)?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    };

    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::BadRequest("Invalid password".to_string()));
    }

    start_session(&state, StatusCode::OK, "Login successful", user)
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .store
        .find_user_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        message: "User fetched successfully".to_string(),
        user,
    }))
}

/// Logout endpoint
///
/// Always succeeds; the cookie is replaced with an expired empty value.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie: HeaderValue = clear_session_cookie(state.config.api.production);

    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}
