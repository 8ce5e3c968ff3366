/// Authentication context for Axum requests
///
/// The API server's JWT middleware validates the bearer token, loads the
/// user, and inserts an [`AuthContext`] into request extensions. Handlers
/// extract it with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::JwtError;

/// Authentication context added to request extensions after a successful
/// bearer-token check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Authenticated username (for logging and projections)
    pub username: String,
}

impl AuthContext {
    /// Creates an auth context for a validated user
    pub fn new(user_id: Uuid, username: String) -> Self {
        Self { user_id, username }
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header present
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token subject no longer maps to an active user
    #[error("User account is missing or disabled")]
    UnknownUser,

    /// Database lookup failed during authentication
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_new() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::new(id, "alice".to_string());

        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.username, "alice");
    }

    #[test]
    fn test_jwt_error_conversion() {
        let err: AuthError = JwtError::Expired.into();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
