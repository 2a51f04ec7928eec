//! Gatekeeper Configuration System
//!
//! TOML-based configuration with environment variable overrides. The core
//! crate never reads configuration itself; the host loads an [`AppConfig`]
//! and passes plain values into constructors.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::{apply_overrides, ConfigLoader};

/// HMAC-SHA-256 keys shorter than this are rejected.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted token lifetime in seconds (about ten years).
pub const MAX_TOKEN_EXPIRY_SECS: i64 = 3650 * 24 * 3600;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub auth: AuthEndpointsConfig,
    pub refresh_cookie: RefreshCookieConfig,

    /// Accounts seeded into the in-memory user directory
    pub users: Vec<UserSeed>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 bytes
    pub secret: String,
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_expiry_secs: 900,        // 15 minutes
            refresh_token_expiry_secs: 1_209_600, // 14 days
        }
    }
}

// Keeps the secret out of debug logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_secs", &self.refresh_token_expiry_secs)
            .finish()
    }
}

/// Built-in `/auth` endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpointsConfig {
    /// Mount POST /auth/login, /auth/refresh, /auth/logout and GET /auth/me
    pub endpoints_enabled: bool,
    /// Prefix stripped from the Authorization header
    pub bearer_prefix: String,
}

impl Default for AuthEndpointsConfig {
    fn default() -> Self {
        Self {
            endpoints_enabled: true,
            bearer_prefix: "Bearer ".to_string(),
        }
    }
}

/// Refresh token cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshCookieConfig {
    pub enabled: bool,
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
    /// Strict, Lax or None
    pub same_site: String,
}

impl Default for RefreshCookieConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "refresh_token".to_string(),
            http_only: true,
            secure: true,
            path: "/".to_string(),
            same_site: "Lax".to_string(),
        }
    }
}

/// A user account seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub user_id: String,
    pub username: String,
    /// PHC-format Argon2id hash
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check the values the host cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.as_bytes().len() < MIN_SECRET_BYTES {
            return Err(ConfigError::ValidationError(format!(
                "jwt.secret must be at least {} bytes (got {})",
                MIN_SECRET_BYTES,
                self.jwt.secret.as_bytes().len()
            )));
        }
        for (key, secs) in [
            ("jwt.access_token_expiry_secs", self.jwt.access_token_expiry_secs),
            ("jwt.refresh_token_expiry_secs", self.jwt.refresh_token_expiry_secs),
        ] {
            if secs <= 0 || secs > MAX_TOKEN_EXPIRY_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must be between 1 and {MAX_TOKEN_EXPIRY_SECS} (got {secs})"
                )));
            }
        }
        if self.refresh_cookie.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "refresh_cookie.name must not be blank".to_string(),
            ));
        }
        match self.refresh_cookie.same_site.to_ascii_lowercase().as_str() {
            "strict" | "lax" | "none" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "refresh_cookie.same_site must be Strict, Lax or None (got {other:?})"
                )))
            }
        }
        for user in &self.users {
            if user.user_id.trim().is_empty()
                || user.username.trim().is_empty()
                || user.password_hash.trim().is_empty()
            {
                return Err(ConfigError::ValidationError(format!(
                    "users entry {:?} needs user_id, username and password_hash",
                    user.username
                )));
            }
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Gatekeeper Configuration
# Environment variables (GATEKEEPER_*) override these settings

[http]
host = "0.0.0.0"
port = 8080

[jwt]
# At least 32 bytes. Prefer GATEKEEPER_JWT_SECRET over committing it here.
secret = "change-me-change-me-change-me-change-me"
access_token_expiry_secs = 900        # 15 minutes
refresh_token_expiry_secs = 1209600   # 14 days

[auth]
endpoints_enabled = true
bearer_prefix = "Bearer "

[refresh_cookie]
enabled = true
name = "refresh_token"
http_only = true
secure = true
path = "/"
same_site = "Lax"  # Strict, Lax, None

[[users]]
user_id = "u-1"
username = "alice"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
roles = ["USER"]
"#
        .to_string()
    }
}
