/// Task assignment edges
///
/// Assignments mirror project membership: an explicit join table keyed by
/// (task_id, user_id). Route handlers enforce that an assignee is a member
/// of the task's project before inserting here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_assignees (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Assignment edge between a user and a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskAssignee {
    /// Task ID
    pub task_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// When the user was assigned
    pub assigned_at: DateTime<Utc>,
}

impl TaskAssignee {
    /// Assigns a user to a task
    pub async fn assign(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let assignee = sqlx::query_as::<_, TaskAssignee>(
            r#"
            INSERT INTO task_assignees (task_id, user_id)
            VALUES ($1, $2)
            RETURNING task_id, user_id, assigned_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(assignee)
    }

    /// Removes a user from a task
    ///
    /// # Returns
    ///
    /// True if the assignment existed and was removed
    pub async fn unassign(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_assignees WHERE task_id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether a user is assigned to a task
    pub async fn is_assigned(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM task_assignees
                WHERE task_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists a task's assignees as user summaries, in assignment order
    pub async fn list_users(pool: &PgPool, task_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.email
            FROM users u
            JOIN task_assignees ta ON ta.user_id = u.id
            WHERE ta.task_id = $1
            ORDER BY ta.assigned_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
