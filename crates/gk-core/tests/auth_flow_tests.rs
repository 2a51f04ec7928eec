//! End-to-end flows through AuthService with the reference implementations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gk_core::{
    Argon2Config, Argon2CredentialVerifier, AuthError, AuthService, InMemoryRefreshTokenStore,
    InMemoryUserDirectory, JwtTokenService, ManualClock, Principal, RefreshTokenStore,
    TokenService, TokenServiceConfig, User,
};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

struct Harness {
    service: AuthService,
    tokens: Arc<JwtTokenService>,
    store: Arc<InMemoryRefreshTokenStore>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let verifier = Argon2CredentialVerifier::new(Argon2Config::testing()).unwrap();
    let alice = User::new(
        "u-alice",
        "alice",
        verifier.hash_password("secret").unwrap(),
        ["USER"],
    )
    .unwrap();
    let users = Arc::new(InMemoryUserDirectory::with_users([alice]));

    let tokens = Arc::new(
        JwtTokenService::new(TokenServiceConfig::new(SECRET))
            .unwrap()
            .with_clock(clock.clone()),
    );
    let store = Arc::new(InMemoryRefreshTokenStore::with_clock(clock.clone()));

    let service = AuthService::new(
        users,
        Arc::new(verifier),
        tokens.clone(),
        store.clone(),
        Some(Duration::days(14)),
    )
    .with_clock(clock.clone());

    Harness {
        service,
        tokens,
        store,
        clock,
    }
}

#[tokio::test]
async fn test_alice_and_bob_scenario() {
    let h = harness();

    let pair = h.service.login("alice", "secret").await.unwrap();
    assert!(h.store.exists("u-alice", pair.refresh_token()).await.unwrap());

    let principal = h.tokens.verify_access_token(pair.access_token()).unwrap();
    assert_eq!(principal.user_id(), "u-alice");
    assert!(principal.has_role("USER"));

    assert_eq!(
        h.service.login("alice", "wrong").await.unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert_eq!(
        h.service.login("bob", "x").await.unwrap_err(),
        AuthError::UserNotFound
    );

    // Only the successful login left an entry behind
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_blank_inputs_are_validation_errors() {
    let h = harness();

    for (username, password) in [("", "secret"), ("alice", ""), ("  ", "\t")] {
        assert!(matches!(
            h.service.login(username, password).await,
            Err(AuthError::Validation { .. })
        ));
    }
    assert!(matches!(
        h.service.refresh(" ").await,
        Err(AuthError::Validation { .. })
    ));
    assert!(matches!(
        h.service.logout("").await,
        Err(AuthError::Validation { .. })
    ));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_round_trip_preserves_principal() {
    let h = harness();
    let principal = Principal::new("u-7", ["ADMIN", "USER", "AUDITOR"]).unwrap();

    let access = h.tokens.issue_access_token(&principal).unwrap();
    let refresh = h.tokens.issue_refresh_token(&principal).unwrap();

    assert_eq!(h.tokens.verify_access_token(&access).unwrap(), principal);
    assert_eq!(h.tokens.verify_refresh_token(&refresh).unwrap(), principal);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let h = harness();
    let pair = h.service.login("alice", "secret").await.unwrap();

    assert!(matches!(
        h.service.refresh(pair.access_token()).await,
        Err(AuthError::InvalidToken { .. })
    ));
    assert!(matches!(
        h.tokens.verify_access_token(pair.refresh_token()),
        Err(AuthError::InvalidToken { .. })
    ));
}

#[tokio::test]
async fn test_rotation_rejects_reuse() {
    let h = harness();
    let first = h.service.login("alice", "secret").await.unwrap();

    let second = h.service.refresh(first.refresh_token()).await.unwrap();
    assert_ne!(second.refresh_token(), first.refresh_token());
    assert!(!h.store.exists("u-alice", first.refresh_token()).await.unwrap());
    assert!(h.store.exists("u-alice", second.refresh_token()).await.unwrap());

    assert_eq!(
        h.service.refresh(first.refresh_token()).await.unwrap_err(),
        AuthError::TokenRevoked
    );

    // The rotated-in token still works
    let third = h.service.refresh(second.refresh_token()).await.unwrap();
    assert_ne!(third.refresh_token(), second.refresh_token());
}

#[tokio::test]
async fn test_logout_then_refresh_is_revoked() {
    let h = harness();
    let pair = h.service.login("alice", "secret").await.unwrap();

    h.service.logout(pair.refresh_token()).await.unwrap();
    assert_eq!(
        h.service.refresh(pair.refresh_token()).await.unwrap_err(),
        AuthError::TokenRevoked
    );

    // Logging out again is fine
    h.service.logout(pair.refresh_token()).await.unwrap();
}

#[tokio::test]
async fn test_logout_with_forged_token_is_invalid() {
    let h = harness();
    let other = JwtTokenService::new(TokenServiceConfig::new(
        "another-secret-that-is-32-bytes-long!!",
    ))
    .unwrap();
    let forged = other
        .issue_refresh_token(&Principal::new("u-alice", ["USER"]).unwrap())
        .unwrap();

    assert!(matches!(
        h.service.logout(&forged).await,
        Err(AuthError::InvalidToken { .. })
    ));
}

#[tokio::test]
async fn test_store_expiry_reports_revoked() {
    let h = harness();
    let store = Arc::new(InMemoryRefreshTokenStore::with_clock(h.clock.clone()));

    // Store entries last one hour while the JWT itself lasts 14 days
    let verifier = Argon2CredentialVerifier::new(Argon2Config::testing()).unwrap();
    let users = InMemoryUserDirectory::with_users([User::new(
        "u-alice",
        "alice",
        verifier.hash_password("secret").unwrap(),
        ["USER"],
    )
    .unwrap()]);
    let service = AuthService::new(
        Arc::new(users),
        Arc::new(verifier),
        h.tokens.clone(),
        store.clone(),
        Some(Duration::hours(1)),
    )
    .with_clock(h.clock.clone());

    let pair = service.login("alice", "secret").await.unwrap();
    h.clock.advance(Duration::hours(2));

    assert_eq!(
        service.refresh(pair.refresh_token()).await.unwrap_err(),
        AuthError::TokenRevoked
    );
    assert!(store.is_empty(), "expired entry evicted by the failed lookup");
}

#[tokio::test]
async fn test_expired_refresh_token_is_invalid() {
    let h = harness();
    let pair = h.service.login("alice", "secret").await.unwrap();

    h.clock.advance(Duration::days(15));
    assert!(matches!(
        h.service.refresh(pair.refresh_token()).await,
        Err(AuthError::InvalidToken { .. })
    ));
}

#[tokio::test]
async fn test_multiple_sessions_per_user() {
    let h = harness();
    let laptop = h.service.login("alice", "secret").await.unwrap();
    let phone = h.service.login("alice", "secret").await.unwrap();

    assert_eq!(h.store.active_sessions("u-alice"), 2);

    h.service.logout(laptop.refresh_token()).await.unwrap();
    assert!(h.service.refresh(phone.refresh_token()).await.is_ok());
}

#[test]
fn test_short_secret_fails_at_construction() {
    let err = JwtTokenService::new(TokenServiceConfig::new("only-31-bytes-long-secret-value"))
        .err()
        .unwrap();
    assert!(matches!(err, AuthError::Configuration { .. }));
}

#[tokio::test]
async fn test_unrepresentable_ttl_never_reaches_a_request() {
    let huge = Duration::days(100_000_000);

    let err = JwtTokenService::new(TokenServiceConfig::new(SECRET).with_refresh_ttl(huge))
        .err()
        .unwrap();
    assert!(matches!(err, AuthError::Configuration { .. }));

    // The orchestrator falls back to its default instead of overflowing later
    let h = harness();
    let verifier = Argon2CredentialVerifier::new(Argon2Config::testing()).unwrap();
    let users = InMemoryUserDirectory::with_users([User::new(
        "u-alice",
        "alice",
        verifier.hash_password("secret").unwrap(),
        ["USER"],
    )
    .unwrap()]);
    let service = AuthService::new(
        Arc::new(users),
        Arc::new(verifier),
        h.tokens.clone(),
        h.store.clone(),
        Some(huge),
    );
    assert_eq!(service.refresh_ttl(), Duration::days(14));

    let pair = tokio::spawn(async move { service.login("alice", "secret").await })
        .await
        .expect("login task must not panic")
        .unwrap();
    assert!(h.store.exists("u-alice", pair.refresh_token()).await.unwrap());
}
