/// Task model and state machine
///
/// Tasks belong to a project and carry a lifecycle state. Any state may be
/// set at any time; the state enum exists for storage and filtering, not to
/// gate transitions. Assignees live in the `task_assignees` join table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_state AS ENUM ('scheduled', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(2000),
///     state task_state NOT NULL DEFAULT 'scheduled',
///     due_date TIMESTAMPTZ,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task is planned but not started
    Scheduled,

    /// Task is actively being worked
    InProgress,

    /// Task is done
    Completed,
}

impl TaskState {
    /// Converts state to string for filtering and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Scheduled => "scheduled",
            TaskState::InProgress => "in_progress",
            TaskState::Completed => "completed",
        }
    }

    /// Parses a state filter string, as sent in query parameters
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(TaskState::Scheduled),
            "in_progress" => Some(TaskState::InProgress),
            "completed" => Some(TaskState::Completed),
            _ => None,
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short task title
    pub title: String,

    /// Longer free-form description
    pub description: Option<String>,

    /// Current lifecycle state
    pub state: TaskState,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    /// Initial lifecycle state; scheduled when not given
    pub state: Option<TaskState>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
}

/// Partial update for a task; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<TaskState>,
    pub due_date: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &str = "id, title, description, state, due_date, project_id, created_at, updated_at";

impl Task {
    /// Creates a new task in a project
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, state, due_date, project_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, state, due_date, project_id, created_at, updated_at
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.state.unwrap_or(TaskState::Scheduled))
        .bind(data.due_date)
        .bind(data.project_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks, newest first, optionally filtered by state
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        state: Option<TaskState>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match state {
            Some(state) => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {} FROM tasks WHERE project_id = $1 AND state = $2 ORDER BY created_at DESC",
                    TASK_COLUMNS
                ))
                .bind(project_id)
                .bind(state)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC",
                    TASK_COLUMNS
                ))
                .bind(project_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Lists tasks assigned to a user across all projects
    ///
    /// Ordered by due date with undated tasks last, so the most urgent work
    /// comes first.
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        state: Option<TaskState>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match state {
            Some(state) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT t.id, t.title, t.description, t.state, t.due_date,
                           t.project_id, t.created_at, t.updated_at
                    FROM tasks t
                    JOIN task_assignees ta ON ta.task_id = t.id
                    WHERE ta.user_id = $1 AND t.state = $2
                    ORDER BY t.due_date ASC NULLS LAST, t.created_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(state)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT t.id, t.title, t.description, t.state, t.due_date,
                           t.project_id, t.created_at, t.updated_at
                    FROM tasks t
                    JOIN task_assignees ta ON ta.task_id = t.id
                    WHERE ta.user_id = $1
                    ORDER BY t.due_date ASC NULLS LAST, t.created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Applies a partial update, returning the updated task if it exists
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.state.is_some() {
            bind_count += 1;
            query.push_str(&format!(", state = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(state) = data.state {
            q = q.bind(state);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// # Returns
    ///
    /// True if the task existed and was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_as_str() {
        assert_eq!(TaskState::Scheduled.as_str(), "scheduled");
        assert_eq!(TaskState::InProgress.as_str(), "in_progress");
        assert_eq!(TaskState::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_state_parse() {
        assert_eq!(TaskState::parse("scheduled"), Some(TaskState::Scheduled));
        assert_eq!(TaskState::parse("in_progress"), Some(TaskState::InProgress));
        assert_eq!(TaskState::parse("completed"), Some(TaskState::Completed));
        assert_eq!(TaskState::parse("done"), None);
        assert_eq!(TaskState::parse(""), None);
        assert_eq!(TaskState::parse("IN_PROGRESS"), None);
    }

    #[test]
    fn test_task_state_serde_rename() {
        let json = serde_json::to_string(&TaskState::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let state: TaskState = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(state, TaskState::Completed);
    }

    #[test]
    fn test_update_task_default_is_empty() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.state.is_none());
        assert!(update.due_date.is_none());
    }
}
