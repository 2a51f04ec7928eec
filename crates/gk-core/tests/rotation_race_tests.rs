//! Concurrent refreshes of one token: exactly one may win.

use std::sync::Arc;

use chrono::Duration;
use gk_core::{
    AuthError, AuthService, CredentialVerifier, InMemoryRefreshTokenStore, InMemoryUserDirectory,
    JwtTokenService, RefreshTokenStore, TokenServiceConfig, User,
};

struct PlainVerifier;

impl CredentialVerifier for PlainVerifier {
    fn matches(&self, raw_password: &str, stored_hash: &str) -> bool {
        raw_password == stored_hash
    }
}

fn service(store: Arc<InMemoryRefreshTokenStore>) -> Arc<AuthService> {
    let users = InMemoryUserDirectory::with_users([User::new("u1", "alice", "pw", ["USER"]).unwrap()]);
    let tokens = JwtTokenService::new(TokenServiceConfig::new(
        "race-test-secret-0123456789abcdef0123",
    ))
    .unwrap();

    Arc::new(AuthService::new(
        Arc::new(users),
        Arc::new(PlainVerifier),
        Arc::new(tokens),
        store,
        Some(Duration::hours(1)),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_refresh_has_single_winner() {
    for _ in 0..20 {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let service = service(store.clone());
        let pair = service.login("alice", "pw").await.unwrap();
        let token = pair.refresh_token().to_string();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                let token = token.clone();
                tokio::spawn(async move { service.refresh(&token).await })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(pair) => winners.push(pair),
                Err(err) => assert_eq!(err, AuthError::TokenRevoked),
            }
        }

        assert_eq!(winners.len(), 1, "exactly one refresh must succeed");
        assert!(!store.exists("u1", &token).await.unwrap());
        assert!(store
            .exists("u1", winners[0].refresh_token())
            .await
            .unwrap());
        assert_eq!(store.len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logout_and_refresh() {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    let service = service(store.clone());
    let pair = service.login("alice", "pw").await.unwrap();
    let token = pair.refresh_token().to_string();

    let refresh = {
        let service = service.clone();
        let token = token.clone();
        tokio::spawn(async move { service.refresh(&token).await })
    };
    let logout = {
        let service = service.clone();
        let token = token.clone();
        tokio::spawn(async move { service.logout(&token).await })
    };

    logout.await.unwrap().unwrap();
    match refresh.await.unwrap() {
        // Refresh won: its new token is the only one left
        Ok(pair) => {
            assert!(store.exists("u1", pair.refresh_token()).await.unwrap());
            assert_eq!(store.len(), 1);
        }
        Err(err) => {
            assert_eq!(err, AuthError::TokenRevoked);
            assert!(store.is_empty());
        }
    }
    assert!(!store.exists("u1", &token).await.unwrap());
}
