//! Authentication: password hashing, bearer tokens and the request guard
//!
//! Tokens are HS256 JWTs carrying the user's id, email and role. The
//! middleware accepts them from the `Authorization: Bearer` header or, for
//! `EventSource` clients that cannot set headers, a `token` query parameter.

use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use newsdesk_common::models::Role;

use crate::{db, ApiError, ApiResult, AppState};

/// Token signing settings
#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub token_lifetime: Duration,
}

impl AuthSettings {
    pub fn new(secret: impl Into<String>, token_lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            token_lifetime,
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signed-in user, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// 403 unless the user holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> ApiResult<()> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(ApiError::insufficient_permissions())
        }
    }
}

/// Hash a password into a PHC string (Argon2id, random salt)
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| ApiError::Internal(format!("Failed to generate salt: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
///
/// An unparseable hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(
    user_id: &str,
    email: &str,
    role: Role,
    settings: &AuthSettings,
) -> ApiResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now,
        exp: now + settings.token_lifetime.as_secs() as i64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, settings: &AuthSettings) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Token rejected: {}", e);
        ApiError::invalid_token()
    })
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn bearer_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.token)
    })
}

/// Authentication middleware
///
/// Rejects the request with 401 unless it carries a valid token for a user
/// that still exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .filter(|token| !token.is_empty())
        .ok_or_else(ApiError::invalid_token)?;

    let claims = verify_token(&token, &state.auth)?;

    let user = db::users::find_by_id(&state.db, &claims.id)
        .await?
        .ok_or_else(ApiError::invalid_token)?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn test_token_carries_claims() {
        let token = issue_token("u1", "w@news.test", Role::Editor, &settings()).unwrap();
        let claims = verify_token(&token, &settings()).unwrap();
        assert_eq!(claims.id, "u1");
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_with_other_secret_is_rejected() {
        let token = issue_token("u1", "w@news.test", Role::Writer, &settings()).unwrap();
        let other = AuthSettings::new("another-secret", Duration::from_secs(3600));
        assert!(matches!(verify_token(&token, &other), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            id: "u1".into(),
            email: "w@news.test".into(),
            role: Role::Writer,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(verify_token(&token, &settings()).is_err());
    }

    #[test]
    fn test_require_role() {
        let user = AuthUser {
            id: "u1".into(),
            email: "e@news.test".into(),
            name: "Ed".into(),
            role: Role::Editor,
        };
        assert!(user.require_role(&[Role::Editor, Role::Admin]).is_ok());
        assert!(matches!(user.require_role(&[Role::Admin]), Err(ApiError::Forbidden(_))));
    }
}
