//! Token Service
//!
//! HS256-signed access and refresh tokens. Both kinds share one key and
//! one claim layout; `token_type` keeps them from being swapped.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, Result};
use crate::model::Principal;
use crate::ports::TokenService;

/// HMAC-SHA-256 keys shorter than this are rejected.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted lifetime for either token kind (about ten years).
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 14;

/// Which of the two token kinds a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims shared by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject (user ID)
    sub: String,

    /// Kept as raw JSON so a non-list value degrades to no roles
    #[serde(default)]
    roles: Value,

    token_type: String,

    /// Issued at (Unix timestamp)
    iat: i64,

    /// Expiration time (Unix timestamp)
    exp: i64,

    /// JWT ID, makes tokens issued in the same second distinct
    jti: String,
}

/// Signing configuration for [`JwtTokenService`]
#[derive(Clone)]
pub struct TokenServiceConfig {
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenServiceConfig {
    /// Default lifetimes: 15 minutes for access tokens, 14 days for refresh tokens.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

impl fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// HS256 implementation of [`TokenService`]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    pub fn new(config: TokenServiceConfig) -> Result<Self> {
        if config.secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::configuration(format!(
                "signing secret must be at least {} bytes (got {})",
                MIN_SECRET_BYTES,
                config.secret.len()
            )));
        }
        check_ttl("access", config.access_ttl)?;
        check_ttl("refresh", config.refresh_ttl)?;

        info!(
            access_ttl_secs = config.access_ttl.num_seconds(),
            refresh_ttl_secs = config.refresh_ttl.num_seconds(),
            "JwtTokenService initialized with HS256"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            clock: Arc::new(SystemClock),
        })
    }

    /// Read issue and expiry times from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn issue(&self, principal: &Principal, kind: TokenKind) -> Result<String> {
        let now = self.clock.now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = TokenClaims {
            sub: principal.user_id().to_string(),
            roles: Value::from(principal.roles().iter().cloned().collect::<Vec<_>>()),
            token_type: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| AuthError::internal(format!("{} token expiry out of range", kind)))?
                .timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to encode JWT: {}", e)))
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<Principal> {
        // Expiry is checked against our clock below, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::invalid_token(format!("{}", e)))?;

        if claims.exp < self.clock.now().timestamp() {
            debug!(kind = %expected, "Rejected expired token");
            return Err(AuthError::invalid_token("token has expired"));
        }

        if claims.token_type != expected.as_str() {
            debug!(expected = %expected, actual = %claims.token_type, "Rejected token of wrong kind");
            return Err(AuthError::invalid_token(format!(
                "expected {} token, got {:?}",
                expected, claims.token_type
            )));
        }

        Principal::new(claims.sub, roles_from_claim(&claims.roles))
            .map_err(|_| AuthError::invalid_token("token subject is blank"))
    }
}

impl TokenService for JwtTokenService {
    fn issue_access_token(&self, principal: &Principal) -> Result<String> {
        self.issue(principal, TokenKind::Access)
    }

    fn issue_refresh_token(&self, principal: &Principal) -> Result<String> {
        self.issue(principal, TokenKind::Refresh)
    }

    fn verify_access_token(&self, token: &str) -> Result<Principal> {
        self.verify(token, TokenKind::Access)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<Principal> {
        self.verify(token, TokenKind::Refresh)
    }
}

/// Positive, within [`MAX_TOKEN_TTL_DAYS`] and representable from now.
fn check_ttl(kind: &str, ttl: Duration) -> Result<()> {
    if ttl <= Duration::zero() {
        return Err(AuthError::configuration(format!(
            "{} token lifetime must be positive",
            kind
        )));
    }
    if ttl > Duration::days(MAX_TOKEN_TTL_DAYS) || Utc::now().checked_add_signed(ttl).is_none() {
        return Err(AuthError::configuration(format!(
            "{} token lifetime must not exceed {} days",
            kind, MAX_TOKEN_TTL_DAYS
        )));
    }
    Ok(())
}

/// A list becomes its elements as strings; anything else becomes no roles.
fn roles_from_claim(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(role) => Some(role.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}
