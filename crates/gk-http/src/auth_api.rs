//! Auth API Endpoints
//!
//! - POST /auth/login - Password login, issues a token pair
//! - POST /auth/refresh - Rotate the refresh token
//! - POST /auth/logout - Revoke the refresh token
//! - GET /auth/me - Current principal from the access token

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use gk_config::AppConfig;
use gk_core::{AuthError, AuthService, TokenPair, TokenService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::cookie::RefreshCookie;
use crate::error::{ApiError, ErrorResponse};
use crate::middleware::Authenticated;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

/// Refresh or logout request, used when no refresh cookie is sent
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Issued tokens
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Only present when the refresh cookie is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Current user info response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Auth endpoint state
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    /// Verifies bearer tokens for [`Authenticated`]
    pub token_service: Arc<dyn TokenService>,
    pub refresh_cookie: RefreshCookie,
    /// Prefix stripped from the Authorization header (default: "Bearer ")
    pub bearer_prefix: String,
    /// Reported as `expiresIn`
    pub access_token_expiry_secs: i64,
}

impl AuthState {
    /// Create with default bearer prefix and a 15 minute access lifetime
    pub fn new(
        auth_service: Arc<AuthService>,
        token_service: Arc<dyn TokenService>,
        refresh_cookie: RefreshCookie,
    ) -> Self {
        Self {
            auth_service,
            token_service,
            refresh_cookie,
            bearer_prefix: "Bearer ".to_string(),
            access_token_expiry_secs: 900,
        }
    }

    /// Take cookie, bearer and lifetime settings from the application config
    pub fn from_config(
        auth_service: Arc<AuthService>,
        token_service: Arc<dyn TokenService>,
        config: &AppConfig,
    ) -> Self {
        let refresh_cookie = RefreshCookie::new(
            config.refresh_cookie.clone(),
            config.jwt.refresh_token_expiry_secs,
        );
        Self::new(auth_service, token_service, refresh_cookie)
            .with_bearer_prefix(&config.auth.bearer_prefix)
            .with_access_token_expiry_secs(config.jwt.access_token_expiry_secs)
    }

    pub fn with_bearer_prefix(mut self, prefix: &str) -> Self {
        self.bearer_prefix = prefix.to_string();
        self
    }

    pub fn with_access_token_expiry_secs(mut self, secs: i64) -> Self {
        self.access_token_expiry_secs = secs;
        self
    }

    /// Cookie first, then a JSON body with `refreshToken`.
    fn presented_refresh_token(&self, jar: &CookieJar, body: &[u8]) -> Result<String, ApiError> {
        if let Some(token) = self.refresh_cookie.read(jar) {
            return Ok(token);
        }

        let request: RefreshTokenRequest = if body.is_empty() {
            RefreshTokenRequest::default()
        } else {
            serde_json::from_slice(body)
                .map_err(|_| AuthError::validation("request body must be JSON"))?
        };

        request
            .refresh_token
            .filter(|token| !gk_common::is_blank(token))
            .ok_or_else(|| ApiError(AuthError::validation("refreshToken must not be blank")))
    }

    fn token_response(&self, jar: CookieJar, tokens: TokenPair) -> (CookieJar, Json<TokenResponse>) {
        let (access_token, refresh_token) = tokens.into_parts();

        let (jar, refresh_token) = if self.refresh_cookie.enabled() {
            (self.refresh_cookie.write(jar, refresh_token), None)
        } else {
            (jar, Some(refresh_token))
        };

        let response = TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_secs,
            refresh_token,
        };

        (jar, Json(response))
    }
}

/// Login with username and password
///
/// Returns an access token. The refresh token is set as a cookie, or
/// returned in the body when cookies are disabled.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Blank username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let tokens = state.auth_service.login(&req.username, &req.password).await?;
    Ok(state.token_response(jar, tokens))
}

/// Refresh access token
///
/// Exchange a refresh token for a new pair.
/// The refresh token is rotated (old one invalidated, new one issued).
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "auth",
    operation_id = "postAuthRefresh",
    request_body(content = RefreshTokenRequest, description = "Optional when the refresh cookie is sent"),
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 400, description = "No refresh token presented", body = ErrorResponse),
        (status = 401, description = "Invalid or revoked refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let presented = state.presented_refresh_token(&jar, &body)?;
    let tokens = state.auth_service.refresh(&presented).await?;
    Ok(state.token_response(jar, tokens))
}

/// Logout
///
/// Revokes the refresh token and clears the refresh cookie.
/// Access tokens stay valid until they expire.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    operation_id = "postAuthLogout",
    request_body(content = RefreshTokenRequest, description = "Optional when the refresh cookie is sent"),
    responses(
        (status = 204, description = "Logout successful"),
        (status = 400, description = "No refresh token presented", body = ErrorResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let presented = state.presented_refresh_token(&jar, &body)?;
    state.auth_service.logout(&presented).await?;
    Ok((state.refresh_cookie.clear(jar), StatusCode::NO_CONTENT))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    operation_id = "getAuthMe",
    responses(
        (status = 200, description = "Current user info", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_current_user(auth: Authenticated) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user_id: auth.user_id().to_string(),
        roles: auth.roles().iter().cloned().collect(),
    })
}

/// Create the auth router
pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(refresh))
        .routes(routes!(logout))
        .routes(routes!(get_current_user))
        .with_state(state)
}
