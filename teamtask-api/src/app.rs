/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamtask_api::{app::AppState, config::Config};
/// use teamtask_shared::store::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = teamtask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use teamtask_shared::{auth::middleware::authenticate, store::Store};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; both fields are
/// `Arc`s. The store is created once at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Store as a trait object, for the population helpers
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// └── /api
///     ├── /auth
///     │   ├── POST /signup           (public)
///     │   ├── POST /login            (public)
///     │   ├── GET  /logout           (public)
///     │   └── GET  /me
///     ├── GET/POST          /team
///     ├── GET/PATCH/DELETE  /team/:id
///     ├── POST/DELETE       /teamMember
///     ├── GET/POST          /task
///     └── GET/PATCH/DELETE  /task/:id
/// ```
///
/// Everything except the public routes sits behind [`jwt_auth_layer`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/logout", get(routes::auth::logout));

    let protected_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let resource_routes = Router::new()
        .route(
            "/team",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/team/:id",
            get(routes::teams::get_team)
                .patch(routes::teams::rename_team)
                .delete(routes::teams::delete_team),
        )
        .route(
            "/teamMember",
            post(routes::team_members::add_member).delete(routes::team_members::remove_member),
        )
        .route(
            "/task",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/task/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .merge(resource_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Session authentication layer
///
/// Accepts `Authorization: Bearer <token>` or the `token` cookie, then
/// injects `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Authentication failed");
        e
    })?;

    tracing::debug!(
        user_id = %auth_context.user_id,
        role = ?auth_context.role,
        source = ?auth_context.source,
        "Authenticated request"
    );

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
