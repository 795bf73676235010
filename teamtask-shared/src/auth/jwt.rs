/// Session token generation and validation
///
/// Tokens are HS256-signed JWTs carrying the user id (`sub`) and the user's
/// global role at issue time. A token is valid for a fixed lifetime (seven
/// days by default, matching the session cookie's max-age); there is no
/// refresh flow and no server-side revocation.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, expiration, not-before and issuer
/// - **Secret**: at least 32 bytes, enforced by the API configuration
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use teamtask_shared::auth::jwt::{create_token, validate_token, Claims};
/// use teamtask_shared::models::object_id::ObjectId;
/// use teamtask_shared::models::user::UserRole;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = ObjectId::new();
/// let claims = Claims::new(user_id.clone(), UserRole::TeamMember, Duration::days(7));
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::object_id::ObjectId;
use crate::models::user::UserRole;

/// Issuer written into and required from every token
pub const ISSUER: &str = "teamtask";

/// Default session lifetime
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Longest session lifetime the API accepts
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// JWT claims
///
/// - `sub`: user id
/// - `role`: global role when the token was issued (informational only,
///   authorization re-reads team state on every request)
/// - `iss`, `iat`, `exp`, `nbf`: standard claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: ObjectId,

    pub role: UserRole,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    pub nbf: i64,
}

impl Claims {
    /// Creates claims expiring `ttl` from now
    pub fn new(user_id: ObjectId, role: UserRole, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token and returns its claims
///
/// # Errors
///
/// `Expired` for a token past `exp`, `InvalidIssuer` for a foreign issuer,
/// `ValidationError` for a bad signature or malformed token.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
