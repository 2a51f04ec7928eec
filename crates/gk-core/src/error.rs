//! Authentication Error Types

use thiserror::Error;

/// Every failure the core can report.
///
/// `UserNotFound` and `InvalidCredentials` stay distinct for logging and
/// tests, but share one [`AuthError::public_message`] so a host can answer
/// both identically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Blank or missing required input
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, malformed structure, wrong token kind, or expired claim
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// Signature-valid refresh token unknown to (or expired in) the store
    #[error("Refresh token revoked")]
    TokenRevoked,

    /// Construction-time only; never raised per request
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A port backend failed (database down, network error)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Stable symbolic code for responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "INVALID_REQUEST",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken { .. } => "INVALID_TOKEN",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::Configuration { .. } => "CONFIGURATION_ERROR",
            AuthError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show a caller. Never says which half of a
    /// username/password pair was wrong.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Validation { message } => message.clone(),
            AuthError::UserNotFound | AuthError::InvalidCredentials => {
                "invalid username or password".to_string()
            }
            AuthError::InvalidToken { .. } => "invalid or expired token".to_string(),
            AuthError::TokenRevoked => "token has been revoked".to_string(),
            AuthError::Configuration { .. } | AuthError::Internal { .. } => {
                "internal error".to_string()
            }
        }
    }

    /// True for the two login failures a host should collapse into one response.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AuthError::UserNotFound | AuthError::InvalidCredentials)
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
