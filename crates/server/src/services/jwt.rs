//! Session token signing and validation (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use foodlane_core::{Email, Role};

use crate::config::JwtConfig;
use crate::models::Principal;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id (user or vendor, see `role`)
    pub sub: Uuid,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    #[serde(default)]
    pub food_types: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            display_name: claims.name,
            role: claims.role,
            verified: claims.verified,
            food_types: claims.food_types,
        }
    }
}

/// Token errors.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_minutes: i64,
    issuer: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_minutes", &self.expiration_minutes)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiration_minutes: config.expiration_minutes,
            issuer: config.issuer.clone(),
        }
    }

    /// Token lifetime, used for the cookie `Max-Age`.
    #[must_use]
    pub const fn expiration_minutes(&self) -> i64 {
        self.expiration_minutes
    }

    /// Sign a token for `principal`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::GenerationFailed` if encoding fails.
    pub fn issue(&self, principal: &Principal) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            name: principal.display_name.clone(),
            role: principal.role,
            verified: principal.verified,
            food_types: principal.food_types.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.expiration_minutes)).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate signature, expiry and issuer, then decode the claims.
    ///
    /// # Errors
    ///
    /// Returns the matching `JwtError` variant for each failure kind.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

/// Extract a token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn extract_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
