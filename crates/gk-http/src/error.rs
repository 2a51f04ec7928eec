//! HTTP mapping for core errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gk_core::AuthError;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Symbolic error code
    pub error: String,
    /// Caller-safe message
    pub message: String,
}

/// Wraps [`AuthError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    /// Status and public code. Unknown user and wrong password answer alike.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AuthError::Validation { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AuthError::UserNotFound | AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            AuthError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AuthError::TokenRevoked => (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED"),
            AuthError::Configuration { .. } | AuthError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.0.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_indistinguishable() {
        let unknown = ApiError(AuthError::UserNotFound);
        let wrong = ApiError(AuthError::InvalidCredentials);
        assert_eq!(unknown.status_and_code(), wrong.status_and_code());
        assert_eq!(unknown.0.public_message(), wrong.0.public_message());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(AuthError::validation("x")).status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AuthError::TokenRevoked).status_and_code(),
            (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED")
        );
        assert_eq!(
            ApiError(AuthError::internal("db down")).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
