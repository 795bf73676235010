/// Data models for TeamTask
///
/// # Models
///
/// - `object_id`: 24-hex document identifiers
/// - `user`: user accounts
/// - `team`: teams with captain and member list
/// - `task`: tasks, priority and status enums
/// - `task_patch`: validated partial task updates
/// - `view`: display forms with references resolved
///
/// The `impl` blocks on `User`, `Team` and `Task` hold the PostgreSQL
/// queries; handlers go through [`crate::store::Store`] rather than calling
/// them directly.
///
/// # Example
///
/// ```no_run
/// use teamtask_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamtask_shared::models::user::{CreateUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod object_id;
pub mod task;
pub mod task_patch;
pub mod team;
pub mod user;
pub mod view;
