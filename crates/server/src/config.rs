//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODLANE_JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `FOODLANE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the server runs on the in-memory store)
//! - `FOODLANE_HOST` - Bind address (default: 127.0.0.1)
//! - `FOODLANE_PORT` - Listen port (default: 8000)
//! - `FOODLANE_JWT_EXPIRATION_MINUTES` - Session lifetime (default: 1440)
//! - `FOODLANE_JWT_ISSUER` - Token issuer claim (default: foodlane)
//! - `FOODLANE_COOKIE_SECURE` - Mark the session cookie `Secure` (default: false)
//! - `FOODLANE_IMAGES_DIR` - Upload directory, served at `/images` (default: images)
//! - `FOODLANE_RATE_LIMIT` - Rate limit the login endpoints (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL. `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session token settings
    pub jwt: JwtConfig,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Directory uploaded images are written to
    pub images_dir: PathBuf,
    /// Whether login endpoints are rate limited
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Session token signing configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: SecretString,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    /// `iss` claim written and required on every token
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiration_minutes", &self.expiration_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FOODLANE_DATABASE_URL");
        let host = parse_env("FOODLANE_HOST", "127.0.0.1")?;
        let port = parse_env("FOODLANE_PORT", "8000")?;
        let jwt = JwtConfig::from_env()?;
        let cookie_secure = parse_env("FOODLANE_COOKIE_SECURE", "false")?;
        let images_dir = PathBuf::from(get_env_or_default("FOODLANE_IMAGES_DIR", "images"));
        let rate_limit = parse_env("FOODLANE_RATE_LIMIT", "true")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            cookie_secure,
            images_dir,
            rate_limit,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("FOODLANE_JWT_SECRET")?;
        validate_secret_length(&secret, "FOODLANE_JWT_SECRET")?;
        Ok(Self {
            secret,
            expiration_minutes: parse_env("FOODLANE_JWT_EXPIRATION_MINUTES", "1440")?,
            issuer: get_env_or_default("FOODLANE_JWT_ISSUER", "foodlane"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            database_url: None,
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            jwt: JwtConfig {
                secret: SecretString::from("k7#Qm2!vR9@xT4$wL8^pZ1&nB6*cF3%h"),
                expiration_minutes: 60,
                issuer: "foodlane".to_string(),
            },
            cookie_secure: false,
            images_dir: PathBuf::from("images"),
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let err =
            validate_secret_strength("your-jwt-key-goes-here-please-1234", "FOODLANE_JWT_SECRET")
                .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "FOODLANE_JWT_SECRET").is_err());
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        let result = validate_secret_strength(&"ab".repeat(20), "FOODLANE_JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "K").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "K").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_debug_redacts_jwt_secret() {
        let debug_output = format!("{:?}", config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k7#Qm2!vR9"));
        assert!(debug_output.contains("foodlane"));
    }
}
