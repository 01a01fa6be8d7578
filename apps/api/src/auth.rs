//! JWT authentication module.
//!
//! Issues and validates HS256 bearer tokens, and guards the patient routes
//! with an `Admin` role check.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ├── header missing / not Bearer / bad signature / expired → 401
//!        ├── roles claim lacks "Admin"                              → 403
//!        └── ok → Claims stored in request extensions → handler
//! ```

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user name)
    pub sub: String,

    /// Granted roles
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Generate a token for `subject` carrying `roles`.
    pub fn issue_token(&self, subject: &str, roles: &[&str]) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware: requires a valid token whose roles include `Admin`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".into()))?;

    let claims = state.jwt.validate_token(token)?;

    if !claims.has_role(ward_core::ADMIN_ROLE) {
        return Err(ApiError::Forbidden(format!(
            "{} lacks the {} role",
            claims.sub,
            ward_core::ADMIN_ROLE
        )));
    }

    debug!(subject = %claims.sub, "Authorized request");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);

        let token = manager.issue_token("nurse", &["Admin"]).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "nurse");
        assert!(claims.has_role("Admin"));
        assert!(!claims.has_role("admin"));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = JwtManager::new("one", 3600).issue_token("x", &["Admin"]).unwrap();
        let err = JwtManager::new("two", 3600).validate_token(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let manager = JwtManager::new("test-secret", -3600);
        let token = manager.issue_token("x", &["Admin"]).unwrap();
        assert!(matches!(manager.validate_token(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
