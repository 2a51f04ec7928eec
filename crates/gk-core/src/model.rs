//! Identity value types

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use gk_common::is_blank;

use crate::error::{AuthError, Result};

fn collect_roles<I, R>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    roles.into_iter().map(Into::into).collect()
}

/// Stored account record.
///
/// Two users are equal when their `user_id` matches, regardless of the
/// other fields.
#[derive(Clone)]
pub struct User {
    user_id: String,
    username: String,
    password_hash: String,
    roles: BTreeSet<String>,
}

impl User {
    pub fn new<I, R>(
        user_id: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let user_id = user_id.into();
        let username = username.into();
        let password_hash = password_hash.into();

        if is_blank(&user_id) {
            return Err(AuthError::validation("userId must not be blank"));
        }
        if is_blank(&username) {
            return Err(AuthError::validation("username must not be blank"));
        }
        if is_blank(&password_hash) {
            return Err(AuthError::validation("passwordHash must not be blank"));
        }

        Ok(Self {
            user_id,
            username,
            password_hash,
            roles: collect_roles(roles),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// The identity carried in tokens for this user.
    pub fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.user_id.clone(),
            roles: self.roles.clone(),
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_id.hash(state);
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

/// Authenticated identity: who, and which roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, R>(user_id: impl Into<String>, roles: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let user_id = user_id.into();
        if is_blank(&user_id) {
            return Err(AuthError::validation("userId must not be blank"));
        }
        Ok(Self {
            user_id,
            roles: collect_roles(roles),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Access and refresh token issued together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();

        if is_blank(&access_token) {
            return Err(AuthError::validation("accessToken must not be blank"));
        }
        if is_blank(&refresh_token) {
            return Err(AuthError::validation("refreshToken must not be blank"));
        }

        Ok(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn into_parts(self) -> (String, String) {
        (self.access_token, self.refresh_token)
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &format_args!("<{} chars>", self.refresh_token.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_requires_non_blank_fields() {
        assert!(User::new("u1", "alice", "hash", ["USER"]).is_ok());

        let err = User::new(" ", "alice", "hash", ["USER"]).unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
        assert!(User::new("u1", "", "hash", Vec::<String>::new()).is_err());
        assert!(User::new("u1", "alice", "\t", Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_user_equality_is_by_id() {
        let a = User::new("u1", "alice", "hash-a", ["USER"]).unwrap();
        let b = User::new("u1", "alice-renamed", "hash-b", ["ADMIN"]).unwrap();
        let c = User::new("u2", "alice", "hash-a", ["USER"]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: std::collections::HashSet<User> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_user_debug_redacts_hash() {
        let user = User::new("u1", "alice", "$argon2id$secret", ["USER"]).unwrap();
        assert!(!format!("{:?}", user).contains("secret"));
    }

    #[test]
    fn test_principal_roles() {
        let principal = Principal::new("u1", ["USER", "ADMIN", "USER"]).unwrap();
        assert_eq!(principal.roles().len(), 2);
        assert!(principal.has_role("ADMIN"));
        assert!(!principal.has_role("admin"));

        assert!(Principal::new("", ["USER"]).is_err());
    }

    #[test]
    fn test_user_to_principal() {
        let user = User::new("u1", "alice", "hash", ["USER"]).unwrap();
        let principal = user.to_principal();
        assert_eq!(principal.user_id(), "u1");
        assert!(principal.has_role("USER"));
    }

    #[test]
    fn test_token_pair_validation() {
        let pair = TokenPair::new("a", "r").unwrap();
        assert_eq!(pair.access_token(), "a");
        assert_eq!(pair.refresh_token(), "r");

        assert!(TokenPair::new("", "r").is_err());
        assert!(TokenPair::new("a", "  ").is_err());
    }
}
