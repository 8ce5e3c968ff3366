/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register with a single-use license key
/// - `POST /auth/login` - Login and get an access token
/// - `GET /auth/me` - Current authenticated user
///
/// Registration consumes a license key and creates the user in a single
/// transaction, so a crash mid-flow can never leave a burned key without an
/// account or an account without a burned key.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    license,
    models::{
        license_key::LicenseKey,
        user::{CreateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub password: String,

    /// License key granting registration
    pub license_key: String,
}

/// Public user representation
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed JWT access token
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Register a new user
///
/// Requires an unused, active license key. The key is normalized (trimmed,
/// uppercased) before lookup. User creation and key consumption happen in
/// one transaction; a key that was grabbed by a concurrent registration
/// between lookup and consume fails the whole request.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid or already-used license key, username or
///   email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    let key = license::normalize_key(&req.license_key);
    if key.is_empty() {
        return Err(ApiError::BadRequest("License key is required".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let license_key = LicenseKey::find_by_key(&mut *tx, &key)
        .await?
        .filter(|k| k.is_usable())
        .ok_or_else(|| ApiError::BadRequest("Invalid license key".to_string()))?;

    if User::find_by_username(&mut *tx, &req.username).await?.is_some() {
        return Err(ApiError::BadRequest(
            "Username already registered".to_string(),
        ));
    }

    if User::find_by_email(&mut *tx, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            username: req.username.clone(),
            email: req.email.clone(),
            password_hash,
        },
    )
    .await?;

    // A concurrent registration may have consumed the key after our lookup;
    // the guarded UPDATE catches that and the transaction rolls back.
    let consumed = LicenseKey::consume(&mut *tx, &license_key.key, user.id).await?;
    if !consumed {
        return Err(ApiError::BadRequest("Invalid license key".to_string()));
    }

    tx.commit().await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login endpoint
///
/// Authenticates by username and password, returning a bearer token. The
/// error message does not distinguish unknown users from wrong passwords.
///
/// # Errors
///
/// - `401 Unauthorized`: Incorrect username or password, or inactive account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            ApiError::Unauthorized("Incorrect username or password".to_string())
        })?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Incorrect username or password".to_string(),
        ));
    }

    let expires_in = Duration::minutes(state.config.jwt.access_token_expire_minutes);
    let claims = jwt::Claims::new(user.id, expires_in);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Current-user endpoint
///
/// Returns the profile of the authenticated user.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
