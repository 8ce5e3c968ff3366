/// License key administration endpoints
///
/// # Endpoints
///
/// - `POST /license-keys/generate` - Generate a random key (authenticated)
/// - `POST /license-keys/create` - Insert a specific key (authenticated)
/// - `POST /license-keys/validate` - Check a key without consuming it (public)
/// - `GET /license-keys` - List keys with pagination (authenticated)
/// - `GET /license-keys/:key` - Fetch one key (authenticated)
/// - `PATCH /license-keys/:key` - Activate/deactivate a key (authenticated)
/// - `DELETE /license-keys/:key` - Delete a key (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{license, models::license_key::LicenseKey};

/// Request body for inserting a specific key
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// Key in `AAAA-BBBB-CCCC-DDDD` format
    pub key: String,
}

/// Request body for validating a key
#[derive(Debug, Deserialize)]
pub struct ValidateKeyRequest {
    pub key: String,
}

/// Validation result
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
}

/// Request body for toggling a key
#[derive(Debug, Deserialize)]
pub struct UpdateKeyRequest {
    pub is_active: bool,
}

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct ListKeysQuery {
    /// Number of rows to skip
    #[serde(default)]
    pub skip: i64,

    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Generates a new random license key
///
/// Retries on the unlikely collision with an existing key; persistent
/// collisions surface as a 500.
pub async fn generate_key(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<LicenseKey>)> {
    let key = LicenseKey::generate(&state.db).await?;

    // Log the row id only; the key itself grants access.
    tracing::info!(key_id = %key.id, "Generated license key");

    Ok((StatusCode::CREATED, Json(key)))
}

/// Inserts a specific license key
///
/// # Errors
///
/// - `400 Bad Request`: Key already exists
/// - `422 Unprocessable Entity`: Key does not match the required format
pub async fn create_key(
    State(state): State<AppState>,
    Json(req): Json<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<LicenseKey>)> {
    let key = license::normalize_key(&req.key);

    if !license::is_valid_key_format(&key) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "key".to_string(),
            message: "Key must match the format AAAA-BBBB-CCCC-DDDD".to_string(),
        }]));
    }

    let created = match LicenseKey::insert(&state.db, &key).await {
        Ok(created) => created,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(ApiError::BadRequest(
                "License key already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// Checks whether a key could be used for registration, without consuming it
///
/// Public so a signup form can pre-validate before submitting.
///
/// # Errors
///
/// - `400 Bad Request`: Key is missing, unknown, inactive, or already used
pub async fn validate_key(
    State(state): State<AppState>,
    Json(req): Json<ValidateKeyRequest>,
) -> ApiResult<Json<ValidateKeyResponse>> {
    let key = license::normalize_key(&req.key);
    if key.is_empty() {
        return Err(ApiError::BadRequest("License key is required".to_string()));
    }

    let usable = LicenseKey::find_by_key(&state.db, &key)
        .await?
        .map(|k| k.is_usable())
        .unwrap_or(false);

    if !usable {
        return Err(ApiError::BadRequest("Invalid license key".to_string()));
    }

    Ok(Json(ValidateKeyResponse { valid: true }))
}

/// Lists license keys, newest first
pub async fn list_keys(
    State(state): State<AppState>,
    Query(query): Query<ListKeysQuery>,
) -> ApiResult<Json<Vec<LicenseKey>>> {
    let keys = LicenseKey::list(&state.db, query.limit, query.skip).await?;
    Ok(Json(keys))
}

/// Fetches a single license key
pub async fn get_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<LicenseKey>> {
    let key = license::normalize_key(&key);

    let license_key = LicenseKey::find_by_key(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::NotFound("License key not found".to_string()))?;

    Ok(Json(license_key))
}

/// Activates or deactivates a license key
///
/// Deactivating an already-used key has no effect on the registered user.
pub async fn update_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<UpdateKeyRequest>,
) -> ApiResult<Json<LicenseKey>> {
    let key = license::normalize_key(&key);

    let license_key = LicenseKey::set_active(&state.db, &key, req.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("License key not found".to_string()))?;

    Ok(Json(license_key))
}

/// Deletes a license key
pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let key = license::normalize_key(&key);

    let deleted = LicenseKey::delete(&state.db, &key).await?;
    if !deleted {
        return Err(ApiError::NotFound("License key not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
