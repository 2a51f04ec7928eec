//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "gatekeeper.toml",
    "config.toml",
    "./config/gatekeeper.toml",
    "/etc/gatekeeper/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok());

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured path does not exist, searching defaults");
        }

        if let Ok(path) = env::var("GATEKEEPER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `GATEKEEPER_*` overrides read through `lookup`.
///
/// Unparseable numeric or boolean values are ignored and the file value kept.
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("GATEKEEPER_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(port) = lookup("GATEKEEPER_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }

    // JWT
    if let Some(val) = lookup("GATEKEEPER_JWT_SECRET") {
        config.jwt.secret = val;
    }
    if let Some(secs) = lookup("GATEKEEPER_JWT_ACCESS_EXPIRY_SECS").and_then(|v| v.parse().ok()) {
        config.jwt.access_token_expiry_secs = secs;
    }
    if let Some(secs) = lookup("GATEKEEPER_JWT_REFRESH_EXPIRY_SECS").and_then(|v| v.parse().ok()) {
        config.jwt.refresh_token_expiry_secs = secs;
    }

    // Endpoints
    if let Some(enabled) = lookup("GATEKEEPER_AUTH_ENDPOINTS_ENABLED").and_then(|v| parse_bool(&v)) {
        config.auth.endpoints_enabled = enabled;
    }
    if let Some(val) = lookup("GATEKEEPER_AUTH_BEARER_PREFIX") {
        config.auth.bearer_prefix = val;
    }

    // Refresh cookie
    if let Some(enabled) = lookup("GATEKEEPER_REFRESH_COOKIE_ENABLED").and_then(|v| parse_bool(&v)) {
        config.refresh_cookie.enabled = enabled;
    }
    if let Some(val) = lookup("GATEKEEPER_REFRESH_COOKIE_NAME") {
        config.refresh_cookie.name = val;
    }
    if let Some(secure) = lookup("GATEKEEPER_REFRESH_COOKIE_SECURE").and_then(|v| parse_bool(&v)) {
        config.refresh_cookie.secure = secure;
    }
    if let Some(val) = lookup("GATEKEEPER_REFRESH_COOKIE_PATH") {
        config.refresh_cookie.path = val;
    }
    if let Some(val) = lookup("GATEKEEPER_REFRESH_COOKIE_SAME_SITE") {
        config.refresh_cookie.same_site = val;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
