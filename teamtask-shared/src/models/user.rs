/// User model and database operations
///
/// Users sign up with a name, email and password. The `role` column is a
/// global flag that flips to `captain` the first time the user creates a team;
/// there is no demotion path. Authorization itself is team-scoped (see
/// [`crate::auth::authorization`]), the flag is kept for clients that display it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('captain', 'team_member');
///
/// CREATE TABLE users (
///     id TEXT PRIMARY KEY CHECK (char_length(id) = 24),
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'team_member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::object_id::ObjectId;

/// Global user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Has created at least one team
    Captain,

    /// Default role after signup
    TeamMember,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Captain => "captain",
            UserRole::TeamMember => "team_member",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::TeamMember
    }
}

/// User account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,

    /// Stored trimmed and lowercased, unique
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,

    /// Already normalized (see [`crate::validation::normalize_email`])
    pub email: String,

    /// Argon2id hash, never the plaintext password
    pub password_hash: String,
}

impl User {
    /// Inserts a user with the default `team_member` role
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(ObjectId::new())
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: &ObjectId) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by exact (normalized) email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Sets the global role flag
    pub async fn set_role(
        pool: &PgPool,
        id: &ObjectId,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Loads several users at once (used to populate references)
    pub async fn find_many(pool: &PgPool, ids: &[ObjectId]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(raw)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: ObjectId::parse("64b7f0c2a1b2c3d4e5f60718").unwrap(),
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::TeamMember,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_default_and_str() {
        assert_eq!(UserRole::default(), UserRole::TeamMember);
        assert_eq!(UserRole::Captain.as_str(), "captain");
        assert_eq!(UserRole::TeamMember.as_str(), "team_member");
    }

    #[test]
    fn test_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert_eq!(json["_id"], "64b7f0c2a1b2c3d4e5f60718");
        assert_eq!(json["role"], "team_member");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("createdAt").is_some());
    }
}
