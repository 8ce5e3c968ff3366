/// User lookup endpoints
///
/// Public projections only; the password hash never leaves the model layer.
/// Used by clients to resolve ids to usernames and to find users to add as
/// project members.
///
/// # Endpoints
///
/// - `GET /users/id/:user_id` - Lookup by id
/// - `GET /users/username/:username` - Lookup by username

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use taskboard_shared::models::user::{User, UserSummary};
use uuid::Uuid;

/// Fetches a user by id
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}

/// Fetches a user by username
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}
