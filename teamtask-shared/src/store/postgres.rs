/// PostgreSQL store backend
///
/// Thin adapter over the queries in [`crate::models`]; uniqueness violations
/// raised by the schema are translated into [`StoreError::Conflict`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::{Store, StoreError, StoreResult};
use crate::models::object_id::ObjectId;
use crate::models::task::{CreateTask, Task, TaskFilter};
use crate::models::task_patch::TaskPatch;
use crate::models::team::{CreateTeam, Team};
use crate::models::user::{CreateUser, User, UserRole};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn set_user_role(&self, id: &ObjectId, role: UserRole) -> StoreResult<Option<User>> {
        Ok(User::set_role(&self.pool, id, role).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        Ok(User::find_many(&self.pool, ids).await?)
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team> {
        Ok(Team::create(&self.pool, data).await?)
    }

    async fn find_team_by_id(&self, id: &ObjectId) -> StoreResult<Option<Team>> {
        Ok(Team::find_by_id(&self.pool, id).await?)
    }

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        Ok(Team::find_by_name(&self.pool, name).await?)
    }

    async fn list_teams_for_member(&self, user_id: &ObjectId) -> StoreResult<Vec<Team>> {
        Ok(Team::list_for_member(&self.pool, user_id).await?)
    }

    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<Option<Team>> {
        Ok(Team::rename(&self.pool, id, name).await?)
    }

    #[instrument(skip(self))]
    async fn add_team_member(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> StoreResult<Option<Team>> {
        Team::add_member(&self.pool, id, user_id)
            .await
            .map_err(StoreError::from)
    }

    #[instrument(skip(self))]
    async fn remove_team_member(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> StoreResult<Option<Team>> {
        Ok(Team::remove_member(&self.pool, id, user_id).await?)
    }

    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(Team::delete(&self.pool, id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task_by_id(&self, id: &ObjectId) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    #[instrument(skip(self, patch), fields(fields = ?patch.touched_fields()))]
    async fn update_task(&self, id: &ObjectId, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, patch).await?)
    }

    async fn delete_task(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}
