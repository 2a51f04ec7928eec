//! Bearer token authentication for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use gk_core::{AuthError, Principal};
use tracing::debug;

use crate::auth_api::AuthState;
use crate::error::ApiError;

/// Authenticated principal extractor.
/// Verifies an access token from the `Authorization` header.
pub struct Authenticated(pub Principal);

impl std::ops::Deref for Authenticated {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Token after `prefix`, or `None` when the prefix is missing or nothing follows it.
pub fn extract_bearer_token<'a>(header: &'a str, prefix: &str) -> Option<&'a str> {
    header
        .strip_prefix(prefix)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for Authenticated
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| extract_bearer_token(header, &state.bearer_prefix))
            .ok_or_else(|| {
                debug!("Request without bearer token");
                ApiError(AuthError::invalid_token("missing bearer token"))
            })?;

        let principal = state.token_service.verify_access_token(token)?;
        Ok(Authenticated(principal))
    }
}
