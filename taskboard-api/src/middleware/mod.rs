/// HTTP middleware
///
/// Authentication lives in `app.rs` as an axum `from_fn_with_state` layer;
/// this module holds the tower-based middleware.

pub mod security;
