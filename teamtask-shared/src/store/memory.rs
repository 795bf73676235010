/// In-memory store backend
///
/// All documents live behind a single `RwLock`, so every check-then-write
/// sequence (email uniqueness, team name uniqueness, membership) runs under
/// one write guard and is atomic with respect to other requests.
///
/// Used by the API integration tests and by `STORAGE_BACKEND=memory` runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult, ALREADY_MEMBER, EMAIL_TAKEN, TEAM_NAME_TAKEN};
use crate::models::object_id::ObjectId;
use crate::models::task::{CreateTask, Task, TaskFilter};
use crate::models::task_patch::TaskPatch;
use crate::models::team::{CreateTeam, Team};
use crate::models::user::{CreateUser, User, UserRole};

#[derive(Debug, Default)]
struct Documents {
    users: HashMap<ObjectId, User>,
    teams: HashMap<ObjectId, Team>,
    tasks: HashMap<ObjectId, Task>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (DateTime<Utc>, ObjectId),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut docs = self.docs.write().await;

        if docs.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: ObjectId::new(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        };
        docs.users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.docs.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let docs = self.docs.read().await;
        Ok(docs.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_user_role(&self, id: &ObjectId, role: UserRole) -> StoreResult<Option<User>> {
        let mut docs = self.docs.write().await;

        Ok(docs.users.get_mut(id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let docs = self.docs.read().await;
        Ok(ids.iter().filter_map(|id| docs.users.get(id).cloned()).collect())
    }

    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team> {
        let mut docs = self.docs.write().await;

        if docs.teams.values().any(|t| t.name == data.name) {
            return Err(StoreError::Conflict(TEAM_NAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let team = Team {
            id: ObjectId::new(),
            name: data.name,
            members: vec![data.captain.clone()],
            captain: data.captain,
            created_at: now,
            updated_at: now,
        };
        docs.teams.insert(team.id.clone(), team.clone());

        Ok(team)
    }

    async fn find_team_by_id(&self, id: &ObjectId) -> StoreResult<Option<Team>> {
        Ok(self.docs.read().await.teams.get(id).cloned())
    }

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        let docs = self.docs.read().await;
        Ok(docs.teams.values().find(|t| t.name == name).cloned())
    }

    async fn list_teams_for_member(&self, user_id: &ObjectId) -> StoreResult<Vec<Team>> {
        let docs = self.docs.read().await;
        let mut teams: Vec<Team> = docs
            .teams
            .values()
            .filter(|t| t.is_member(user_id))
            .cloned()
            .collect();

        newest_first(&mut teams, |t| (t.created_at, t.id.clone()));
        Ok(teams)
    }

    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<Option<Team>> {
        let mut docs = self.docs.write().await;

        if docs.teams.values().any(|t| t.name == name && &t.id != id) {
            return Err(StoreError::Conflict(TEAM_NAME_TAKEN.to_string()));
        }

        Ok(docs.teams.get_mut(id).map(|team| {
            team.name = name.to_string();
            team.updated_at = Utc::now();
            team.clone()
        }))
    }

    async fn add_team_member(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> StoreResult<Option<Team>> {
        let mut docs = self.docs.write().await;

        let Some(team) = docs.teams.get_mut(id) else {
            return Ok(None);
        };

        if team.is_member(user_id) {
            return Err(StoreError::Conflict(ALREADY_MEMBER.to_string()));
        }

        team.members.push(user_id.clone());
        team.updated_at = Utc::now();

        Ok(Some(team.clone()))
    }

    async fn remove_team_member(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> StoreResult<Option<Team>> {
        let mut docs = self.docs.write().await;

        let Some(team) = docs.teams.get_mut(id) else {
            return Ok(None);
        };

        if !team.is_captain(user_id) && team.is_member(user_id) {
            team.members.retain(|m| m != user_id);
            team.updated_at = Utc::now();
        }

        Ok(Some(team.clone()))
    }

    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut docs = self.docs.write().await;

        if docs.teams.remove(id).is_none() {
            return Ok(false);
        }
        docs.tasks.retain(|_, task| &task.team != id);

        Ok(true)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut docs = self.docs.write().await;

        let now = Utc::now();
        let task = Task {
            id: ObjectId::new(),
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            team: data.team,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        docs.tasks.insert(task.id.clone(), task.clone());

        Ok(task)
    }

    async fn find_task_by_id(&self, id: &ObjectId) -> StoreResult<Option<Task>> {
        Ok(self.docs.read().await.tasks.get(id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let docs = self.docs.read().await;
        let mut tasks: Vec<Task> = docs
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();

        newest_first(&mut tasks, |t| (t.created_at, t.id.clone()));
        Ok(tasks)
    }

    async fn update_task(&self, id: &ObjectId, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let mut docs = self.docs.write().await;

        Ok(docs.tasks.get_mut(id).map(|task| {
            patch.apply(task, Utc::now());
            task.clone()
        }))
    }

    async fn delete_task(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.docs.write().await.tasks.remove(id).is_some())
    }
}
