//! Authentication Service
//!
//! Login, refresh and logout flows over the four ports. Knows nothing of
//! HTTP, cookies or where users and tokens are kept.

use std::sync::Arc;

use chrono::Duration;
use gk_common::is_blank;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, Result};
use crate::model::{Principal, TokenPair};
use crate::ports::{CredentialVerifier, RefreshTokenStore, TokenService, UserLookup};
use crate::token_service::MAX_TOKEN_TTL_DAYS;

/// Refresh token lifetime used when none, a non-positive one, or one longer
/// than [`MAX_TOKEN_TTL_DAYS`] is given.
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 14;

pub struct AuthService {
    user_lookup: Arc<dyn UserLookup>,
    credential_verifier: Arc<dyn CredentialVerifier>,
    token_service: Arc<dyn TokenService>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        user_lookup: Arc<dyn UserLookup>,
        credential_verifier: Arc<dyn CredentialVerifier>,
        token_service: Arc<dyn TokenService>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        refresh_ttl: Option<Duration>,
    ) -> Self {
        let max_ttl = Duration::days(MAX_TOKEN_TTL_DAYS);
        let refresh_ttl = match refresh_ttl {
            Some(ttl) if ttl > Duration::zero() && ttl <= max_ttl => ttl,
            Some(ttl) => {
                warn!(
                    ttl_secs = ttl.num_seconds(),
                    "Refresh token lifetime out of range, using {} days", DEFAULT_REFRESH_TTL_DAYS
                );
                Duration::days(DEFAULT_REFRESH_TTL_DAYS)
            }
            None => Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        };

        Self {
            user_lookup,
            credential_verifier,
            token_service,
            refresh_store,
            refresh_ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Compute store expiries from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Exchange a username and password for a new token pair.
    ///
    /// The refresh token is recorded in the store before returning.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        if is_blank(username) || is_blank(password) {
            return Err(AuthError::validation("username/password must not be blank"));
        }

        let user = match self.user_lookup.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!(username, "Login failed: unknown user");
                return Err(AuthError::UserNotFound);
            }
        };

        if !self.credential_verifier.matches(password, user.password_hash()) {
            warn!(user_id = %user.user_id(), "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user.to_principal()).await?;
        info!(user_id = %user.user_id(), "Login succeeded");
        Ok(tokens)
    }

    /// Rotate a refresh token: revoke it and issue a fresh pair.
    ///
    /// A token already rotated, logged out, or expired in the store yields
    /// `TokenRevoked`. When two calls race on the same token, only the one
    /// whose revoke removes the entry proceeds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        if is_blank(refresh_token) {
            return Err(AuthError::validation("refreshToken must not be blank"));
        }

        let principal = self.verify_refresh(refresh_token)?;
        let user_id = principal.user_id();

        if !self.refresh_store.exists(user_id, refresh_token).await? {
            warn!(user_id, "Refresh rejected: token not active");
            return Err(AuthError::TokenRevoked);
        }

        if !self.refresh_store.revoke(user_id, refresh_token).await? {
            warn!(user_id, "Refresh rejected: token revoked concurrently");
            return Err(AuthError::TokenRevoked);
        }

        let tokens = self.issue_pair(&principal).await?;
        info!(user_id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revoke a refresh token. Revoking one already gone is not an error.
    ///
    /// Access tokens are not tracked and stay valid until they expire.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        if is_blank(refresh_token) {
            return Err(AuthError::validation("refreshToken must not be blank"));
        }

        let principal = self.verify_refresh(refresh_token)?;
        let removed = self
            .refresh_store
            .revoke(principal.user_id(), refresh_token)
            .await?;

        if removed {
            info!(user_id = %principal.user_id(), "Logged out");
        } else {
            debug!(user_id = %principal.user_id(), "Logout of inactive refresh token");
        }
        Ok(())
    }

    fn verify_refresh(&self, refresh_token: &str) -> Result<Principal> {
        self.token_service
            .verify_refresh_token(refresh_token)
            .map_err(|e| match e {
                AuthError::InvalidToken { .. } => e,
                other => AuthError::invalid_token(format!("invalid refresh token: {}", other)),
            })
    }

    async fn issue_pair(&self, principal: &Principal) -> Result<TokenPair> {
        let access = self.token_service.issue_access_token(principal)?;
        let refresh = self.token_service.issue_refresh_token(principal)?;

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.refresh_ttl)
            .ok_or_else(|| AuthError::internal("refresh token expiry out of range"))?;
        self.refresh_store
            .save(principal.user_id(), &refresh, expires_at)
            .await?;

        TokenPair::new(access, refresh)
    }
}
