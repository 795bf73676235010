/// Request authentication for Axum
///
/// Session tokens travel either as `Authorization: Bearer <token>` (API
/// clients) or as the `token` cookie (browsers). The header is consulted
/// first (scheme matched case-insensitively); the cookie is the fallback
/// whenever the header is absent or carries no bearer token. Every
/// protected route accepts both.
///
/// After successful authentication the API layer inserts an [`AuthContext`]
/// into the request extensions; handlers read it with `Extension`.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use teamtask_shared::auth::middleware::{extract_token, TokenSource};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def.ghi"));
///
/// let (token, source) = extract_token(&headers).unwrap();
/// assert_eq!(token, "abc.def.ghi");
/// assert_eq!(source, TokenSource::Cookie);
/// ```

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Duration;
use serde::Serialize;

use super::jwt::{validate_token, JwtError};
use crate::models::object_id::ObjectId;
use crate::models::user::UserRole;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Where the session token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Header,
    Cookie,
}

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user_id: ObjectId,

    /// Global role when the token was issued
    pub role: UserRole,

    pub source: TokenSource,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Reads a cookie value from the `Cookie` request headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// Token from an `Authorization: Bearer <token>` header, if there is one
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Finds the session token, bearer header first
///
/// # Errors
///
/// `MissingCredentials` when neither source carries a token. A non-bearer
/// `Authorization` header does not stop the cookie lookup.
pub fn extract_token(headers: &HeaderMap) -> Result<(String, TokenSource), AuthError> {
    if let Some(token) = bearer_token(headers) {
        return Ok((token.to_string(), TokenSource::Header));
    }

    match cookie_value(headers, SESSION_COOKIE) {
        Some(token) if !token.is_empty() => Ok((token.to_string(), TokenSource::Cookie)),
        _ => Err(AuthError::MissingCredentials),
    }
}

/// Extracts and validates the session token
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let (token, source) = extract_token(headers)?;

    let claims = validate_token(&token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
        source,
    })
}

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl.num_seconds().max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static(
            "token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Secure",
        )
    } else {
        HeaderValue::from_static(
            "token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "token=from-cookie"),
        ]);

        let (token, source) = extract_token(&map).unwrap();
        assert_eq!(token, "from-header");
        assert_eq!(source, TokenSource::Header);
    }

    #[test]
    fn test_cookie_fallback_across_headers() {
        let map = headers(&[
            (header::COOKIE, "a=1; b=2"),
            (header::COOKIE, "tokenish=x; token=abc"),
        ]);

        let (token, source) = extract_token(&map).unwrap();
        assert_eq!(token, "abc");
        assert_eq!(source, TokenSource::Cookie);
    }

    #[test]
    fn test_missing_and_malformed() {
        assert!(matches!(
            extract_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_token(&headers(&[(header::COOKIE, "token=")])),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_token(&headers(&[(header::AUTHORIZATION, "Basic abc")])),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_token(&headers(&[(header::AUTHORIZATION, "Bearer   ")])),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let (token, source) =
            extract_token(&headers(&[(header::AUTHORIZATION, "bearer abc.def")])).unwrap();
        assert_eq!(token, "abc.def");
        assert_eq!(source, TokenSource::Header);

        let (token, _) =
            extract_token(&headers(&[(header::AUTHORIZATION, "BEARER xyz")])).unwrap();
        assert_eq!(token, "xyz");
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (header::COOKIE, "token=from-cookie"),
        ]);

        let (token, source) = extract_token(&map).unwrap();
        assert_eq!(token, "from-cookie");
        assert_eq!(source, TokenSource::Cookie);
    }

    #[test]
    fn test_authenticate_builds_context() {
        let user_id = ObjectId::new();
        let token =
            create_token(&Claims::new(user_id.clone(), UserRole::TeamMember, Duration::days(7)), SECRET)
                .unwrap();

        let mut map = HeaderMap::new();
        map.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("token={token}")).unwrap(),
        );

        let ctx = authenticate(&map, SECRET).unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.source, TokenSource::Cookie);

        assert!(matches!(
            authenticate(&map, "some-other-secret-of-32-bytes-length"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie("abc", Duration::days(7), false).unwrap();
        let text = value.to_str().unwrap();

        assert!(text.starts_with("token=abc;"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Path=/"));
        assert!(text.contains("Max-Age=604800"));
        assert!(!text.contains("Secure"));

        let secure = session_cookie("abc", Duration::days(7), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires() {
        let text = clear_session_cookie(false);
        let text = text.to_str().unwrap();
        assert!(text.starts_with("token=;"));
        assert!(text.contains("Max-Age=0"));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("Invalid token".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
