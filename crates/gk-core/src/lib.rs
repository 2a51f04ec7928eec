//! Gatekeeper Core
//!
//! Authentication orchestration independent of transport and storage:
//! - Credential verification against a pluggable hash algorithm
//! - Paired access/refresh token issuance and verification
//! - Server-side refresh token tracking with single-use rotation
//! - Session revocation on logout
//!
//! ## Module Organization
//!
//! - `model` - identity value types (`User`, `Principal`, `TokenPair`)
//! - `ports` - the four interfaces the orchestrator depends on
//! - `auth_service` - the orchestrator (`login`, `refresh`, `logout`)
//! - `token_service`, `refresh_token_store`, `password_service`,
//!   `user_directory` - reference implementations of the ports

pub mod auth_service;
pub mod clock;
pub mod error;
pub mod model;
pub mod password_service;
pub mod ports;
pub mod refresh_token_store;
pub mod token_service;
pub mod user_directory;

pub use auth_service::{AuthService, DEFAULT_REFRESH_TTL_DAYS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, Result};
pub use model::{Principal, TokenPair, User};
pub use password_service::{Argon2Config, Argon2CredentialVerifier};
pub use ports::{CredentialVerifier, RefreshTokenStore, TokenService, UserLookup};
pub use refresh_token_store::InMemoryRefreshTokenStore;
pub use token_service::{
    JwtTokenService, TokenKind, TokenServiceConfig, MAX_TOKEN_TTL_DAYS, MIN_SECRET_BYTES,
};
pub use user_directory::InMemoryUserDirectory;
