//! In-memory [`UserLookup`] keyed by username.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::model::User;
use crate::ports::UserLookup;

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Add or replace the user with this username. Returns the replaced user.
    pub fn insert(&self, user: User) -> Option<User> {
        self.users.write().insert(user.username().to_string(), user)
    }

    pub fn remove(&self, username: &str) -> Option<User> {
        self.users.write().remove(username)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().get(username).cloned())
    }
}
