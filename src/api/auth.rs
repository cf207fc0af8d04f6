//! Bearer-token authentication.
//!
//! Access tokens are HS256 JWTs carrying the user id and admin flag. The
//! [`Identity`] extractor rejects requests without a valid token.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ApiJson};
use crate::config::AuthConfig;
use crate::db::{Entity, LoginRequest, LoginResponse, User, UserResponse};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub is_admin: bool,
}

/// Issue an access token for `user`
pub fn issue_token(config: &AuthConfig, user: &User) -> Result<String, ApiError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user.id().to_string(),
        is_admin: user.is_admin,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::minutes(config.token_ttl_minutes)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to sign token: {}", e);
        ApiError::internal("Failed to issue token")
    })
}

/// Verify signature and expiry of an access token
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ApiError::unauthorized("Token has expired")
        }
        _ => ApiError::unauthorized("Invalid token"),
    })
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor for the authenticated caller
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let claims = verify_token(&state.config.auth, token)?;
        Ok(Identity {
            id: claims.sub,
            is_admin: claims.is_admin,
        })
    }
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .facade
        .authenticate_user(&request.email, &request.password)
        .await?;

    let Some(user) = user else {
        warn!("Failed login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let access_token = issue_token(&state.config.auth, &user)?;
    info!(user_id = %user.id(), "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        user: UserResponse::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..Default::default()
        }
    }

    fn user(is_admin: bool) -> User {
        User::new("a@x.com", "$argon2id$h".to_string(), "A", "B", is_admin).unwrap()
    }

    #[test]
    fn test_token_roundtrip() {
        let user = user(true);
        let token = issue_token(&config(), &user).unwrap();
        let claims = verify_token(&config(), &token).unwrap();
        assert_eq!(claims.sub, user.id());
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let token = issue_token(&config(), &user(false)).unwrap();
        let other = AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..Default::default()
        };
        assert_eq!(
            verify_token(&other, &token).unwrap_err().status(),
            axum::http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: -10,
            ..Default::default()
        };
        let token = issue_token(&expired, &user(false)).unwrap();
        assert!(verify_token(&config(), &token).is_err());
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_token(&headers), Some("abc.def"));

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_token(&headers).is_none());
    }
}
