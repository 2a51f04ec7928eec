//! Ports the orchestrator depends on
//!
//! Lookups and the refresh store cross a storage boundary and are async.
//! Hash verification and token signing are CPU-only and stay synchronous.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Principal, User};

/// Finds accounts by username.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// `Ok(None)` when no such user exists. `Err` only for backend failures.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Checks a raw password against a stored hash.
pub trait CredentialVerifier: Send + Sync {
    /// Never fails; anything other than a confirmed match is `false`.
    fn matches(&self, raw_password: &str, stored_hash: &str) -> bool;
}

/// Issues and verifies signed tokens of two kinds.
pub trait TokenService: Send + Sync {
    fn issue_access_token(&self, principal: &Principal) -> Result<String>;

    fn issue_refresh_token(&self, principal: &Principal) -> Result<String>;

    /// Fails with `InvalidToken` on bad signature, malformed input, expiry,
    /// or a token of the refresh kind.
    fn verify_access_token(&self, token: &str) -> Result<Principal>;

    /// Fails with `InvalidToken` on bad signature, malformed input, expiry,
    /// or a token of the access kind.
    fn verify_refresh_token(&self, token: &str) -> Result<Principal>;
}

/// Server-side record of live refresh tokens, keyed by (user id, token).
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Record a token. Saving the same pair again replaces its expiry.
    async fn save(&self, user_id: &str, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// True only when the pair is present and not past its expiry.
    async fn exists(&self, user_id: &str, token: &str) -> Result<bool>;

    /// Remove the pair. Removing an absent pair is a no-op.
    ///
    /// Returns `true` only when this call removed a live entry, so of two
    /// concurrent revokes of the same pair at most one sees `true`.
    async fn revoke(&self, user_id: &str, token: &str) -> Result<bool>;
}
