//! In-Memory Refresh Token Store
//!
//! Process-local [`RefreshTokenStore`]. Entries live until revoked or
//! until a lookup finds them past their expiry. Nothing survives a restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::ports::RefreshTokenStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    user_id: String,
    token: String,
}

impl EntryKey {
    fn new(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: token.to_string(),
        }
    }
}

/// Refresh token store backed by a concurrent map
pub struct InMemoryRefreshTokenStore {
    entries: DashMap<EntryKey, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of entries held, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        self.entries.retain(|_, expires_at| {
            let live = now <= *expires_at;
            if !live {
                purged += 1;
            }
            live
        });
        if purged > 0 {
            debug!(purged, "Purged expired refresh tokens");
        }
        purged
    }

    /// Live refresh tokens held for `user_id`.
    pub fn active_sessions(&self, user_id: &str) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|entry| entry.key().user_id == user_id && now <= *entry.value())
            .count()
    }

    /// Revoke every token held for `user_id`. Returns how many were removed.
    pub fn revoke_all_for_user(&self, user_id: &str) -> usize {
        let mut revoked = 0;
        self.entries.retain(|key, _| {
            let keep = key.user_id != user_id;
            if !keep {
                revoked += 1;
            }
            keep
        });
        debug!(user_id, revoked, "Revoked all refresh tokens for user");
        revoked
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, user_id: &str, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.insert(EntryKey::new(user_id, token), expires_at);
        Ok(())
    }

    async fn exists(&self, user_id: &str, token: &str) -> Result<bool> {
        let key = EntryKey::new(user_id, token);
        let now = self.clock.now();

        // Lazy eviction: an expired entry is removed by the lookup that finds it.
        if self
            .entries
            .remove_if(&key, |_, expires_at| now > *expires_at)
            .is_some()
        {
            debug!(user_id, "Evicted expired refresh token");
            return Ok(false);
        }

        Ok(self.entries.contains_key(&key))
    }

    async fn revoke(&self, user_id: &str, token: &str) -> Result<bool> {
        let now = self.clock.now();
        let removed = self.entries.remove(&EntryKey::new(user_id, token));
        Ok(matches!(removed, Some((_, expires_at)) if now <= expires_at))
    }
}
