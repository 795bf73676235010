/// Task model and database operations
///
/// A task belongs to exactly one team, is assigned to one user and remembers
/// who created it. `created_by` and `team` never change after creation.
///
/// # Status
///
/// Status is a flat enum, not a guarded state machine:
///
/// ```text
/// pending → in_progress → completed     (usual flow)
/// any     → over_due | cancelled        (set by the caller)
/// any     → any                         (allowed through a partial update)
/// ```
///
/// Nothing recomputes `over_due` from `due_date`; it is only ever set explicitly.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
/// CREATE TYPE task_status AS ENUM (
///     'pending', 'in_progress', 'completed', 'over_due', 'cancelled'
/// );
///
/// CREATE TABLE tasks (
///     id TEXT PRIMARY KEY CHECK (char_length(id) = 24),
///     title TEXT NOT NULL,
///     description TEXT NOT NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'pending',
///     assigned_to TEXT NOT NULL,
///     created_by TEXT NOT NULL,
///     team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     due_date TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;

use super::object_id::ObjectId;
use super::task_patch::TaskPatch;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid priority '{}'; expected one of: {}",
                    s,
                    join_names(Self::ALL.iter().map(|p| p.as_str()))
                )
            })
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    OverDue,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::OverDue,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::OverDue => "over_due",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid status '{}'; expected one of: {}",
                    s,
                    join_names(Self::ALL.iter().map(|st| st.as_str()))
                )
            })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Task document (references unresolved)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub title: String,

    pub description: String,

    pub priority: TaskPriority,

    pub status: TaskStatus,

    pub assigned_to: ObjectId,

    /// Immutable owner; sole authority for update/delete
    pub created_by: ObjectId,

    #[sqlx(rename = "team_id")]
    pub team: ObjectId,

    pub due_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_to: ObjectId,
    pub created_by: ObjectId,
    pub team: ObjectId,
    pub due_date: DateTime<Utc>,
}

/// Listing filter
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Team to list (required)
    pub team: ObjectId,

    /// Only tasks assigned to this user
    pub assigned_to: Option<ObjectId>,

    /// Only tasks in this status
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn for_team(team: ObjectId) -> Self {
        Self {
            team,
            assigned_to: None,
            status: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.team == self.team
            && self.assigned_to.as_ref().map_or(true, |a| &task.assigned_to == a)
            && self.status.map_or(true, |s| task.status == s)
    }
}

const TASK_COLUMNS: &str = "id, title, description, priority, status, assigned_to, created_by, \
                            team_id, due_date, created_at, updated_at";

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, priority, status,
                               assigned_to, created_by, team_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(ObjectId::new())
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .bind(data.team)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: &ObjectId) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE team_id = "));
        query.push_bind(&filter.team);

        if let Some(assignee) = &filter.assigned_to {
            query.push(" AND assigned_to = ").push_bind(assignee);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        query.push(" ORDER BY created_at DESC, id DESC");

        let tasks = query.build_query_as::<Task>().fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Applies a partial update and refreshes `updated_at`
    ///
    /// Only the fields present in the patch are written.
    pub async fn update(
        pool: &PgPool,
        id: &ObjectId,
        patch: &TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = &patch.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = &patch.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(priority) = patch.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(due_date) = patch.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assigned_to) = &patch.assigned_to {
            query.push(", assigned_to = ").push_bind(assigned_to);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(format!(" RETURNING {TASK_COLUMNS}"));

        let task = query.build_query_as::<Task>().fetch_optional(pool).await?;

        Ok(task)
    }

    pub async fn delete(pool: &PgPool, id: &ObjectId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
