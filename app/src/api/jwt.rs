use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use super::error::ApiError;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // Email for convenience
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

/// The authenticated caller, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

/// Signing secret and token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            secret: Arc::from(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a JWT token for the given user
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
    }

    /// Verify and decode a JWT token
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    /// Cookie carrying the token, expiring with it
    pub fn auth_cookie(&self, token: &str) -> String {
        format!(
            "{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Strict; Max-Age={}; Path=/",
            self.ttl.num_seconds()
        )
    }
}

/// Cookie that clears the auth token
pub fn logout_cookie() -> String {
    format!("{TOKEN_COOKIE}=; HttpOnly; SameSite=Strict; Max-Age=0; Path=/")
}

/// Extract JWT token from Authorization header or cookie
fn extract_token_from_request(request: &Request) -> Option<String> {
    // Try Authorization header first (Bearer token)
    if let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    // Try cookie as fallback
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Middleware to protect routes that require authentication
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token_from_request(&request) else {
        return ApiError::Unauthorized("Missing authentication token".to_string()).into_response();
    };

    let Ok(claims) = state.jwt().verify(&token) else {
        return ApiError::Unauthorized("Invalid or expired token".to_string()).into_response();
    };

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return ApiError::Unauthorized("Invalid token subject".to_string()).into_response();
    };

    // Verify user still exists in the system
    match state.manager().user_exists(&user_id).await {
        Ok(true) => {}
        Ok(false) => {
            return ApiError::Unauthorized("Unknown user".to_string()).into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    }

    request.extensions_mut().insert(CurrentUser {
        id: user_id,
        email: claims.email,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret", Duration::hours(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "a@b.c").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@b.c");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = keys().issue(Uuid::new_v4(), "a@b.c").unwrap();
        let other = JwtKeys::new(b"another-secret", Duration::hours(1));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = JwtKeys::new(b"test-secret", Duration::hours(-2));
        let token = keys.issue(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_token_extraction() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token_from_request(&request).as_deref(), Some("abc"));

        let request = axum::http::Request::builder()
            .header(header::COOKIE, "theme=dark; token=xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token_from_request(&request).as_deref(), Some("xyz"));

        let request = axum::http::Request::builder()
            .header(header::COOKIE, "token=")
            .body(Body::empty())
            .unwrap();
        assert!(extract_token_from_request(&request).is_none());
    }

    #[test]
    fn test_cookies() {
        let keys = keys();
        assert!(keys.auth_cookie("abc").starts_with("token=abc;"));
        assert!(keys.auth_cookie("abc").contains("Max-Age=3600"));
        assert!(logout_cookie().contains("Max-Age=0"));
    }
}
