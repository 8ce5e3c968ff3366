/// Task endpoints
///
/// Tasks inherit their authorization from the owning project: every route
/// checks the caller's membership of the task's project. Assignees must
/// themselves be members of that project.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task in a project
/// - `GET /tasks/project/:project_id` - List a project's tasks
/// - `GET /tasks/assigned-to-me` - Tasks assigned to the caller
/// - `GET /tasks/:task_id` - Fetch one task
/// - `PUT /tasks/:task_id` - Partial update (any state may be set)
/// - `DELETE /tasks/:task_id` - Delete a task
/// - `POST /tasks/:task_id/assign/:user_id` - Assign a member
/// - `DELETE /tasks/:task_id/assign/:user_id` - Unassign a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskboard_shared::{
    auth::{authorization::require_membership, middleware::AuthContext},
    models::{
        project::Project,
        project_member::ProjectMember,
        task::{CreateTask, Task, TaskState, UpdateTask},
        task_assignee::TaskAssignee,
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Initial state; defaults to scheduled
    pub state: Option<TaskState>,

    pub due_date: Option<DateTime<Utc>>,

    /// Project this task belongs to; the caller must be a member
    pub project_id: Uuid,
}

/// Update task request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub state: Option<TaskState>,

    pub due_date: Option<DateTime<Utc>>,
}

/// State filter query parameter
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Filter to one state: scheduled, in_progress, or completed
    pub state: Option<String>,
}

/// Task together with its assignees
#[derive(Debug, Serialize)]
pub struct TaskWithAssignees {
    #[serde(flatten)]
    pub task: Task,

    /// Assignees in assignment order
    pub assignees: Vec<UserSummary>,
}

/// Minimal project projection for task listings
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
}

/// Task with assignees and its owning project
#[derive(Debug, Serialize)]
pub struct TaskWithProject {
    #[serde(flatten)]
    pub task: Task,

    pub assignees: Vec<UserSummary>,

    pub project: ProjectSummary,
}

fn parse_state_filter(query: &TaskListQuery) -> ApiResult<Option<TaskState>> {
    match &query.state {
        None => Ok(None),
        Some(raw) => TaskState::parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest("Invalid task state filter".to_string())),
    }
}

async fn task_with_assignees(
    state: &AppState,
    task: Task,
) -> Result<TaskWithAssignees, sqlx::Error> {
    let assignees = TaskAssignee::list_users(&state.db, task.id).await?;
    Ok(TaskWithAssignees { task, assignees })
}

/// Loads a task and checks the caller's membership of its project
async fn load_member_task(state: &AppState, task_id: Uuid, user_id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_membership(&state.db, task.project_id, user_id).await?;

    Ok(task)
}

/// Creates a task in a project the caller belongs to
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskWithAssignees>)> {
    req.validate()?;

    if Project::find_by_id(&state.db, req.project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    require_membership(&state.db, req.project_id, auth.user_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            state: req.state,
            due_date: req.due_date,
            project_id: req.project_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");

    let response = task_with_assignees(&state, task).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Lists a project's tasks, newest first, optionally filtered by state
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskWithAssignees>>> {
    let state_filter = parse_state_filter(&query)?;

    if Project::find_by_id(&state.db, project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    require_membership(&state.db, project_id, auth.user_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id, state_filter).await?;

    let mut response = Vec::with_capacity(tasks.len());
    for task in tasks {
        response.push(task_with_assignees(&state, task).await?);
    }

    Ok(Json(response))
}

/// Lists tasks assigned to the caller across all projects
///
/// Ordered by due date ascending with undated tasks last. Each entry
/// carries a minimal project projection for display.
pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskWithProject>>> {
    let state_filter = parse_state_filter(&query)?;

    let tasks = Task::list_assigned_to(&state.db, auth.user_id, state_filter).await?;

    // Tasks cluster by project, so look each project up once.
    let mut projects: HashMap<Uuid, ProjectSummary> = HashMap::new();
    let mut response = Vec::with_capacity(tasks.len());

    for task in tasks {
        let project = match projects.get(&task.project_id) {
            Some(summary) => summary.clone(),
            None => {
                let project = Project::find_by_id(&state.db, task.project_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
                let summary = ProjectSummary {
                    id: project.id,
                    title: project.title,
                };
                projects.insert(task.project_id, summary.clone());
                summary
            }
        };

        let assignees = TaskAssignee::list_users(&state.db, task.id).await?;
        response.push(TaskWithProject {
            task,
            assignees,
            project,
        });
    }

    Ok(Json(response))
}

/// Fetches a single task with its assignees
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskWithAssignees>> {
    let task = load_member_task(&state, task_id, auth.user_id).await?;
    let response = task_with_assignees(&state, task).await?;
    Ok(Json(response))
}

/// Applies a partial update to a task
///
/// Any state may be set; there is no enforced transition graph.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskWithAssignees>> {
    req.validate()?;

    load_member_task(&state, task_id, auth.user_id).await?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            state: req.state,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let response = task_with_assignees(&state, task).await?;
    Ok(Json(response))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = load_member_task(&state, task_id, auth.user_id).await?;

    Task::delete(&state.db, task.id).await?;

    tracing::info!(task_id = %task.id, by = %auth.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Assigns a user to a task
///
/// The assignee must be a member of the task's project.
///
/// # Errors
///
/// - `400 Bad Request`: User is not a project member, or already assigned
/// - `403 Forbidden`: Caller is not a member
/// - `404 Not Found`: Task or target user does not exist
pub async fn assign_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskWithAssignees>> {
    let task = load_member_task(&state, task_id, auth.user_id).await?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    if !ProjectMember::is_member(&state.db, task.project_id, user_id).await? {
        return Err(ApiError::BadRequest(
            "Cannot assign a user who is not a member of the task's project".to_string(),
        ));
    }

    if TaskAssignee::is_assigned(&state.db, task_id, user_id).await? {
        return Err(ApiError::BadRequest(
            "User is already assigned to this task".to_string(),
        ));
    }

    TaskAssignee::assign(&state.db, task_id, user_id).await?;

    let response = task_with_assignees(&state, task).await?;
    Ok(Json(response))
}

/// Removes a user from a task's assignees
///
/// # Errors
///
/// - `400 Bad Request`: User is not assigned to this task
/// - `403 Forbidden`: Caller is not a member
/// - `404 Not Found`: Task or target user does not exist
pub async fn unassign_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskWithAssignees>> {
    let task = load_member_task(&state, task_id, auth.user_id).await?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let removed = TaskAssignee::unassign(&state.db, task_id, user_id).await?;
    if !removed {
        return Err(ApiError::BadRequest(
            "User is not assigned to this task".to_string(),
        ));
    }

    let response = task_with_assignees(&state, task).await?;
    Ok(Json(response))
}
