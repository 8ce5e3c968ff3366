/// Service banner and health check endpoints
///
/// # Endpoints
///
/// - `GET /` - Service banner
/// - `GET /health` - Health status including database connectivity

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Root banner handler
///
/// Returns the service name and version so a browser hit on the bare host
/// shows something useful.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "taskboard-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check handler
///
/// Returns service health status including database connectivity.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}
