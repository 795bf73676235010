/// Document store abstraction
///
/// Handlers never talk to PostgreSQL directly; they hold an `Arc<dyn Store>`
/// injected through application state. Two backends exist:
///
/// - [`postgres::PgStore`]: the production backend, delegating to the model queries
/// - [`memory::MemoryStore`]: a process-local backend for tests and local runs
///
/// Both enforce the same uniqueness rules (user email, team name, team
/// membership) at the storage layer, so two concurrent requests racing on the
/// same key produce exactly one winner and one [`StoreError::Conflict`].
///
/// Lookups that miss return `Ok(None)`; updates and deletes against a missing
/// document return `Ok(None)` / `Ok(false)`. Only genuine backend failures are
/// errors.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::object_id::ObjectId;
use crate::models::task::{CreateTask, Task, TaskFilter};
use crate::models::task_patch::TaskPatch;
use crate::models::team::{CreateTeam, Team};
use crate::models::user::{CreateUser, User, UserRole};
use crate::models::view::{TaskView, TeamSummary, TeamView, UserSummary};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    /// Stored data could not be interpreted
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const EMAIL_TAKEN: &str = "User with this email already exists";
pub const TEAM_NAME_TAKEN: &str = "Team with this name already exists";
pub const ALREADY_MEMBER: &str = "User is already a member of this team";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let message = match db.constraint() {
                    Some("users_email_key") => EMAIL_TAKEN,
                    Some("teams_name_key") => TEAM_NAME_TAKEN,
                    Some("team_members_pkey") => ALREADY_MEMBER,
                    _ => "Duplicate record",
                };
                return StoreError::Conflict(message.to_string());
            }
        }

        if let sqlx::Error::Decode(inner) = &err {
            return StoreError::Corrupt(inner.to_string());
        }

        StoreError::Database(err)
    }
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Checks backend reachability
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>>;

    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn set_user_role(&self, id: &ObjectId, role: UserRole) -> StoreResult<Option<User>>;

    /// Loads the users that exist among `ids`, in no particular order
    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;

    // Teams

    /// Creates a team with the captain as its first member
    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team>;

    async fn find_team_by_id(&self, id: &ObjectId) -> StoreResult<Option<Team>>;

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>>;

    /// Teams the user belongs to, newest first
    async fn list_teams_for_member(&self, user_id: &ObjectId) -> StoreResult<Vec<Team>>;

    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<Option<Team>>;

    /// Appends a member; `Conflict` if already present
    async fn add_team_member(&self, id: &ObjectId, user_id: &ObjectId)
        -> StoreResult<Option<Team>>;

    /// Removes a member; the captain is never removed
    async fn remove_team_member(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> StoreResult<Option<Team>>;

    /// Deletes a team together with its tasks
    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task_by_id(&self, id: &ObjectId) -> StoreResult<Option<Task>>;

    /// Tasks matching the filter, newest first
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    /// Applies the present fields and refreshes `updated_at`
    async fn update_task(&self, id: &ObjectId, patch: &TaskPatch) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: &ObjectId) -> StoreResult<bool>;
}

async fn summaries(store: &dyn Store, ids: Vec<ObjectId>) -> StoreResult<Vec<UserSummary>> {
    let mut ids = ids;
    ids.sort_unstable();
    ids.dedup();

    let users = store.find_users(&ids).await?;
    Ok(users.iter().map(UserSummary::from).collect())
}

/// Resolves the captain and members of a team
pub async fn populate_team(store: &dyn Store, team: Team) -> StoreResult<TeamView> {
    let mut ids = team.members.clone();
    ids.push(team.captain.clone());

    let people = summaries(store, ids).await?;
    Ok(TeamView::build(team, &people))
}

pub async fn populate_teams(store: &dyn Store, teams: Vec<Team>) -> StoreResult<Vec<TeamView>> {
    let ids = teams
        .iter()
        .flat_map(|t| t.members.iter().chain(std::iter::once(&t.captain)).cloned())
        .collect();

    let people = summaries(store, ids).await?;
    Ok(teams
        .into_iter()
        .map(|team| TeamView::build(team, &people))
        .collect())
}

/// Resolves assignee, creator and team of a task
pub async fn populate_task(store: &dyn Store, task: Task) -> StoreResult<TaskView> {
    let mut views = populate_tasks(store, vec![task]).await?;
    views
        .pop()
        .ok_or_else(|| StoreError::Corrupt("task vanished during population".to_string()))
}

/// Resolves references for a batch of tasks with one user lookup
pub async fn populate_tasks(store: &dyn Store, tasks: Vec<Task>) -> StoreResult<Vec<TaskView>> {
    let ids = tasks
        .iter()
        .flat_map(|t| [t.assigned_to.clone(), t.created_by.clone()])
        .collect();
    let people = summaries(store, ids).await?;

    let mut teams: Vec<TeamSummary> = Vec::new();
    for task in &tasks {
        if teams.iter().any(|t| t.id == task.team) {
            continue;
        }
        if let Some(team) = store.find_team_by_id(&task.team).await? {
            teams.push(TeamSummary::from(&team));
        }
    }

    Ok(tasks
        .into_iter()
        .map(|task| {
            let team = teams.iter().find(|t| t.id == task.team).cloned();
            TaskView::build(task, &people, team)
        })
        .collect())
}
