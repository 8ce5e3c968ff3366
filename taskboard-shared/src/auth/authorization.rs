/// Authorization helpers: project membership checks
///
/// Taskboard uses a flat permission model: a user has access to a project,
/// and to everything the project owns, iff they are a member of it. There
/// are no roles and no per-task ACLs; task-level checks delegate to the
/// task's parent project.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::require_membership;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid)
/// # -> Result<(), Box<dyn std::error::Error>> {
/// // Gate before any project-scoped read or mutation
/// require_membership(&pool, project_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project_member::ProjectMember;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks that a user is a member of a project
///
/// # Errors
///
/// Returns `AuthzError::NotMember` (mapped to 403 by the API layer) if the
/// user is not in the project's member set.
pub async fn require_membership(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    let is_member = ProjectMember::is_member(pool, project_id, user_id).await?;

    if !is_member {
        return Err(AuthzError::NotMember(project_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_member_display() {
        let id = Uuid::nil();
        let err = AuthzError::NotMember(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
