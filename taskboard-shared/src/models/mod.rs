/// Database models for taskboard
///
/// Each model owns its CRUD operations as static methods over a sqlx
/// executor (pool or transaction).
///
/// # Models
///
/// - `user`: User accounts
/// - `license_key`: Single-use registration credentials
/// - `project`: Projects and their metadata
/// - `project_member`: Explicit user-project membership edges
/// - `task`: Tasks owned by a project
/// - `task_assignee`: Explicit task-user assignment edges

pub mod license_key;
pub mod project;
pub mod project_member;
pub mod task;
pub mod task_assignee;
pub mod user;
