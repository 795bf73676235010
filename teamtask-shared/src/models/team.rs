/// Team model and database operations
///
/// A team has one captain and an ordered member list. The captain is always a
/// member: team creation inserts the captain row first, and member removal
/// refuses to delete the captain's row even if a caller gets past the
/// authorization gate.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id TEXT PRIMARY KEY CHECK (char_length(id) = 24),
///     name TEXT NOT NULL,
///     captain_id TEXT NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX teams_name_key ON teams (name);
///
/// CREATE TABLE team_members (
///     team_id TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     position BIGSERIAL NOT NULL,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::object_id::ObjectId;

/// Role of a user inside one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Captain,
    Member,
}

/// Team document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,

    pub captain: ObjectId,

    /// Insertion-ordered, captain included
    pub members: Vec<ObjectId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team
#[derive(Debug, Clone)]
pub struct CreateTeam {
    /// Trimmed team name
    pub name: String,

    /// Creating user, becomes captain and first member
    pub captain: ObjectId,
}

impl Team {
    pub fn is_captain(&self, user_id: &ObjectId) -> bool {
        &self.captain == user_id
    }

    pub fn is_member(&self, user_id: &ObjectId) -> bool {
        self.members.contains(user_id)
    }

    /// Team-scoped role of a user, `None` for outsiders
    pub fn role_of(&self, user_id: &ObjectId) -> Option<TeamRole> {
        if self.is_captain(user_id) {
            Some(TeamRole::Captain)
        } else if self.is_member(user_id) {
            Some(TeamRole::Member)
        } else {
            None
        }
    }
}

/// Raw row shape; member ids come back as a text array
#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: ObjectId,
    name: String,
    captain_id: ObjectId,
    members: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TeamRow> for Team {
    type Error = sqlx::Error;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        let members = row
            .members
            .iter()
            .map(|raw| ObjectId::parse(raw))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Team {
            id: row.id,
            name: row.name,
            captain: row.captain_id,
            members,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_TEAM: &str = r#"
    SELECT t.id, t.name, t.captain_id, t.created_at, t.updated_at,
           ARRAY(
               SELECT m.user_id FROM team_members m
               WHERE m.team_id = t.id
               ORDER BY m.position
           ) AS members
    FROM teams t
"#;

impl Team {
    /// Creates a team and its captain membership in one transaction
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `teams_name_key` when the name is taken.
    pub async fn create(pool: &PgPool, data: CreateTeam) -> Result<Self, sqlx::Error> {
        let id = ObjectId::new();
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO teams (id, name, captain_id) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(&data.name)
            .bind(&data.captain)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO team_members (team_id, user_id) VALUES ($1, $2)")
            .bind(&id)
            .bind(&data.captain)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: &ObjectId) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, TeamRow>(&format!("{SELECT_TEAM} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Team::try_from).transpose()
    }

    /// Finds a team by exact name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, TeamRow>(&format!("{SELECT_TEAM} WHERE t.name = $1"))
            .bind(name)
            .fetch_optional(pool)
            .await?;

        row.map(Team::try_from).transpose()
    }

    /// Lists teams a user belongs to, newest first
    pub async fn list_for_member(
        pool: &PgPool,
        user_id: &ObjectId,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!(
            "{SELECT_TEAM}
             WHERE EXISTS (
                 SELECT 1 FROM team_members m WHERE m.team_id = t.id AND m.user_id = $1
             )
             ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Team::try_from).collect()
    }

    /// Renames a team
    pub async fn rename(
        pool: &PgPool,
        id: &ObjectId,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let result = sqlx::query("UPDATE teams SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Appends a member
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `team_members_pkey` if already a member.
    pub async fn add_member(
        pool: &PgPool,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let touched = sqlx::query("UPDATE teams SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("INSERT INTO team_members (team_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::find_by_id(pool, id).await
    }

    /// Removes a non-captain member
    ///
    /// Returns the team unchanged if the user was the captain or not a member.
    pub async fn remove_member(
        pool: &PgPool,
        id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<Option<Self>, sqlx::Error> {
        let removed = sqlx::query(
            r#"
            DELETE FROM team_members m
            USING teams t
            WHERE m.team_id = t.id
              AND m.team_id = $1
              AND m.user_id = $2
              AND t.captain_id <> $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if removed.rows_affected() > 0 {
            sqlx::query("UPDATE teams SET updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        }

        Self::find_by_id(pool, id).await
    }

    /// Deletes a team; memberships and tasks cascade
    pub async fn delete(pool: &PgPool, id: &ObjectId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_with(captain: &ObjectId, others: &[ObjectId]) -> Team {
        let mut members = vec![captain.clone()];
        members.extend_from_slice(others);

        Team {
            id: ObjectId::new(),
            name: "Eng".to_string(),
            captain: captain.clone(),
            members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_of() {
        let captain = ObjectId::new();
        let member = ObjectId::new();
        let outsider = ObjectId::new();
        let team = team_with(&captain, &[member.clone()]);

        assert_eq!(team.role_of(&captain), Some(TeamRole::Captain));
        assert_eq!(team.role_of(&member), Some(TeamRole::Member));
        assert_eq!(team.role_of(&outsider), None);
        assert!(team.is_member(&captain));
    }

    #[test]
    fn test_row_conversion_rejects_bad_member_ids() {
        let row = TeamRow {
            id: ObjectId::new(),
            name: "Eng".to_string(),
            captain_id: ObjectId::new(),
            members: vec!["garbage".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(Team::try_from(row).is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let captain = ObjectId::new();
        let json = serde_json::to_value(team_with(&captain, &[])).unwrap();

        assert!(json["_id"].is_string());
        assert_eq!(json["captain"], captain.as_str());
        assert_eq!(json["members"].as_array().unwrap().len(), 1);
    }
}
