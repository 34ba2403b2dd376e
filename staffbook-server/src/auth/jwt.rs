//! JWT token service
//!
//! Issues and validates access / refresh tokens. Both carry the user id in
//! `sub` and are told apart by the `type` claim.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_expire_minutes: i64,
    pub refresh_expire_days: i64,
}

/// Token purpose, stored in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::InvalidToken(format!("bad subject: {e}")))
    }
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("expected a {expected:?} token")]
    WrongType { expected: TokenType },

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn access_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue(
            user_id,
            TokenType::Access,
            Duration::minutes(self.config.access_expire_minutes),
        )
    }

    pub fn refresh_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue(
            user_id,
            TokenType::Refresh,
            Duration::days(self.config.refresh_expire_days),
        )
    }

    fn issue(&self, user_id: Uuid, token_type: TokenType, ttl: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            token_type,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Verify signature and expiry, and require the given token type
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(JwtError::WrongType { expected });
        }
        Ok(claims)
    }

    /// Strip the `Bearer ` prefix from an Authorization header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}
