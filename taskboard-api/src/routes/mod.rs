/// API route handlers
///
/// Each module groups the handlers for one resource:
///
/// - `health`: service banner and health check
/// - `auth`: registration, login, current-user
/// - `license_keys`: license key administration and validation
/// - `projects`: projects and membership management
/// - `tasks`: tasks and assignee management
/// - `users`: user lookups

pub mod auth;
pub mod health;
pub mod license_keys;
pub mod projects;
pub mod tasks;
pub mod users;
