/// Project endpoints
///
/// All project routes require authentication; reads and writes on a
/// specific project additionally require the caller to be a member. A
/// project always has at least one member: creation adds the creator, and
/// removal of the last member is refused.
///
/// # Endpoints
///
/// - `POST /projects` - Create a project (creator becomes first member)
/// - `GET /projects` - List projects the caller belongs to
/// - `GET /projects/:project_id` - Project with its member list
/// - `PUT /projects/:project_id` - Partial update
/// - `DELETE /projects/:project_id` - Delete project and its tasks
/// - `POST /projects/:project_id/users/:user_id` - Add a member
/// - `DELETE /projects/:project_id/users/:user_id` - Remove a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{authorization::require_membership, middleware::AuthContext},
    models::{
        project::{CreateProject, Project, UpdateProject},
        project_member::ProjectMember,
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Update project request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// Project together with its member list
#[derive(Debug, Serialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,

    /// Members in join order
    pub users: Vec<UserSummary>,
}

async fn project_with_members(
    state: &AppState,
    project: Project,
) -> Result<ProjectWithMembers, sqlx::Error> {
    let users = ProjectMember::list_users(&state.db, project.id).await?;
    Ok(ProjectWithMembers { project, users })
}

/// Loads a project and checks the caller's membership
///
/// Unknown projects give 404 before the membership check, so members and
/// non-members see the same error for a bad id.
async fn load_member_project(
    state: &AppState,
    project_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Project> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_membership(&state.db, project_id, user_id).await?;

    Ok(project)
}

/// Creates a project with the caller as first member
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectWithMembers>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            title: req.title,
            description: req.description,
        },
        auth.user_id,
    )
    .await?;

    tracing::info!(project_id = %project.id, creator = %auth.user_id, "Project created");

    let response = project_with_members(&state, project).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Lists the caller's projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Fetches a project with its members
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectWithMembers>> {
    let project = load_member_project(&state, project_id, auth.user_id).await?;
    let response = project_with_members(&state, project).await?;
    Ok(Json(response))
}

/// Applies a partial update to a project
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectWithMembers>> {
    req.validate()?;

    load_member_project(&state, project_id, auth.user_id).await?;

    let project = Project::update(
        &state.db,
        project_id,
        UpdateProject {
            title: req.title,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let response = project_with_members(&state, project).await?;
    Ok(Json(response))
}

/// Deletes a project, cascading to its tasks and memberships
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_member_project(&state, project_id, auth.user_id).await?;

    Project::delete(&state.db, project_id).await?;

    tracing::info!(project_id = %project_id, by = %auth.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a user to a project
///
/// # Errors
///
/// - `400 Bad Request`: User is already a member
/// - `403 Forbidden`: Caller is not a member
/// - `404 Not Found`: Project or target user does not exist
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ProjectWithMembers>> {
    let project = load_member_project(&state, project_id, auth.user_id).await?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    if ProjectMember::is_member(&state.db, project_id, user_id).await? {
        return Err(ApiError::BadRequest(
            "User is already a member of this project".to_string(),
        ));
    }

    ProjectMember::add(&state.db, project_id, user_id).await?;

    let response = project_with_members(&state, project).await?;
    Ok(Json(response))
}

/// Removes a user from a project
///
/// The last member cannot be removed; delete the project instead.
///
/// # Errors
///
/// - `400 Bad Request`: User is not a member, or is the last member
/// - `403 Forbidden`: Caller is not a member
/// - `404 Not Found`: Project or target user does not exist
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ProjectWithMembers>> {
    let project = load_member_project(&state, project_id, auth.user_id).await?;

    // The last-member check comes before the target lookups so a
    // single-member project always answers 400, whoever is named.
    let member_count = ProjectMember::count(&state.db, project_id).await?;
    if member_count <= 1 {
        return Err(ApiError::BadRequest(
            "Cannot remove the last user from a project. A project must have at least 1 user."
                .to_string(),
        ));
    }

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    if !ProjectMember::is_member(&state.db, project_id, user_id).await? {
        return Err(ApiError::BadRequest(
            "User is not a member of this project".to_string(),
        ));
    }

    ProjectMember::remove(&state.db, project_id, user_id).await?;

    let response = project_with_members(&state, project).await?;
    Ok(Json(response))
}
