//! Session management with JWT tokens.
//!
//! A session token carries the caller's role. Reader sessions are handed
//! out freely; admin sessions require the configured admin secret and
//! unlock soft-deleted reads and deletions.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid session token")]
    InvalidToken,

    /// Token missing or lacking the required role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Caller privilege level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary read/write access
    Reader,
    /// May see soft-deleted objects and delete
    Admin,
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User identifier
    pub user_id: String,

    /// Granted role
    pub role: Role,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

impl SessionClaims {
    /// Whether the session carries the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// JWT session token
    pub token: String,

    /// Granted role
    pub role: Role,

    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Session manager handles JWT token generation and validation
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

impl SessionManager {
    /// Create a new session manager with the given JWT secret and expiry
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
        }
    }

    /// Generate a new session token for the given user and role
    pub fn generate_token(&self, user_id: &str, role: Role) -> Result<SessionResponse, SessionError> {
        let now = verity_domain::now_millis() / 1000;

        let claims = SessionClaims {
            user_id: user_id.to_string(),
            role,
            exp: now + self.token_expiry_secs,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(SessionResponse {
            token,
            role,
            expires_in: self.token_expiry_secs,
        })
    }

    /// Validate a session token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::default();
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// Validate an `Authorization` header value and require the admin role
    pub fn require_admin(&self, authorization: Option<&str>) -> Result<SessionClaims, SessionError> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| SessionError::Unauthorized("bearer token required".to_string()))?;
        let claims = self.validate_token(token.trim())?;
        if !claims.is_admin() {
            return Err(SessionError::Unauthorized("admin role required".to_string()));
        }
        Ok(claims)
    }
}
