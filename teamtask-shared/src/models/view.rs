/// Display forms of documents with references resolved
///
/// Responses never expose bare reference ids for people or teams; they carry
/// a small summary instead (`name`/`email` for people, `name` for teams).
/// A reference whose target has been deleted resolves to `null`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::object_id::ObjectId;
use super::task::{Task, TaskPriority, TaskStatus};
use super::team::Team;
use super::user::User;

/// Person reference summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Team reference summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
        }
    }
}

/// Team with captain and members resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub captain: Option<UserSummary>,
    /// Members that still exist, in membership order
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with assignee, creator and team resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub team: Option<TeamSummary>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Looks up a summary by id in an already-loaded set
pub fn lookup<'a>(people: &'a [UserSummary], id: &ObjectId) -> Option<&'a UserSummary> {
    people.iter().find(|p| &p.id == id)
}

impl TeamView {
    pub fn build(team: Team, people: &[UserSummary]) -> Self {
        let members = team
            .members
            .iter()
            .filter_map(|id| lookup(people, id).cloned())
            .collect();

        Self {
            captain: lookup(people, &team.captain).cloned(),
            members,
            id: team.id,
            name: team.name,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

impl TaskView {
    pub fn build(task: Task, people: &[UserSummary], team: Option<TeamSummary>) -> Self {
        Self {
            assigned_to: lookup(people, &task.assigned_to).cloned(),
            created_by: lookup(people, &task.created_by).cloned(),
            team,
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}
