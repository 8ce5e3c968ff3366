/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{jwt, middleware::AuthContext};
use taskboard_shared::models::user::User;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                            # Service banner (public)
/// ├── GET  /health                      # Health check (public)
/// ├── /auth/
/// │   ├── POST /register                # Public
/// │   ├── POST /login                   # Public
/// │   └── GET  /me                      # Authenticated
/// ├── /license-keys/
/// │   ├── POST /validate                # Public
/// │   └── ...                           # Admin CRUD (authenticated)
/// ├── /projects/  ...                   # Authenticated, membership-gated
/// ├── /tasks/     ...                   # Authenticated, membership-gated
/// └── /users/     ...                   # Authenticated lookups
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes, no auth
    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route(
            "/license-keys/validate",
            post(routes::license_keys::validate_key),
        );

    // Everything else requires a valid bearer token
    let authed_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/license-keys/generate",
            post(routes::license_keys::generate_key),
        )
        .route(
            "/license-keys/create",
            post(routes::license_keys::create_key),
        )
        .route("/license-keys", get(routes::license_keys::list_keys))
        .route("/license-keys/:key", get(routes::license_keys::get_key))
        .route("/license-keys/:key", patch(routes::license_keys::update_key))
        .route(
            "/license-keys/:key",
            delete(routes::license_keys::delete_key),
        )
        .route("/projects", post(routes::projects::create_project))
        .route("/projects", get(routes::projects::list_projects))
        .route("/projects/:project_id", get(routes::projects::get_project))
        .route(
            "/projects/:project_id",
            put(routes::projects::update_project),
        )
        .route(
            "/projects/:project_id",
            delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:project_id/users/:user_id",
            post(routes::projects::add_member),
        )
        .route(
            "/projects/:project_id/users/:user_id",
            delete(routes::projects::remove_member),
        )
        .route("/tasks", post(routes::tasks::create_task))
        .route(
            "/tasks/project/:project_id",
            get(routes::tasks::list_project_tasks),
        )
        .route("/tasks/assigned-to-me", get(routes::tasks::list_my_tasks))
        .route("/tasks/:task_id", get(routes::tasks::get_task))
        .route("/tasks/:task_id", put(routes::tasks::update_task))
        .route("/tasks/:task_id", delete(routes::tasks::delete_task))
        .route(
            "/tasks/:task_id/assign/:user_id",
            post(routes::tasks::assign_user),
        )
        .route(
            "/tasks/:task_id/assign/:user_id",
            delete(routes::tasks::unassign_user),
        )
        .route("/users/id/:user_id", get(routes::users::get_user_by_id))
        .route(
            "/users/username/:username",
            get(routes::users::get_user_by_username),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
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
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(authed_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, loads the user, and injects an
/// `AuthContext` into request extensions. Tokens for deleted or
/// deactivated users are rejected even if the signature is valid.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Could not validate credentials".to_string())
        })?;

    let auth_context = AuthContext::new(user.id, user.username);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
