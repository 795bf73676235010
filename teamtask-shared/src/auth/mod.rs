/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: session token generation and validation
/// - [`middleware`]: token extraction (bearer header or cookie) and session cookies
/// - [`authorization`]: captain / member / creator permission checks
///
/// # Example
///
/// ```no_run
/// use teamtask_shared::auth::password::{hash_password, verify_password};
/// use chrono::Duration;
/// use teamtask_shared::auth::jwt::{create_token, Claims};
/// use teamtask_shared::models::object_id::ObjectId;
/// use teamtask_shared::models::user::UserRole;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(ObjectId::new(), UserRole::TeamMember, Duration::days(7));
/// let token = create_token(&claims, "secret-key-of-at-least-thirty-two-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
