// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory Providers
//!
//! The external user store is reached only through [`UserDirectory`], which
//! exposes the three operations provisioning needs:
//!
//! | Operation | Result |
//! |-----------|--------|
//! | `find_user_by_email` | user id, or `None` |
//! | `create_user` | new user id |
//! | `update_user` | full overwrite of username, avatar and (optionally) groups |
//!
//! Every call carries an explicit [`SystemActor`]: the privileged credential
//! the directory authorizes the change against.
//!
//! ## Implementations
//!
//! - [`ForumApiClient`] - JSON:API user-management endpoints over HTTPS
//! - [`InMemoryDirectory`] - process-local directory for development and tests

pub mod forum;
pub mod memory;
#[cfg(test)]
pub mod recording;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use forum::ForumApiClient;
pub use memory::InMemoryDirectory;

/// Opaque identifier assigned by the user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

/// Privileged credential used for directory writes.
#[derive(Clone, PartialEq, Eq)]
pub struct SystemActor {
    pub api_key: String,
    /// Directory user the API key acts as.
    pub user_id: String,
}

impl SystemActor {
    pub fn new(api_key: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Token {}; userId={}", self.api_key, self.user_id)
    }
}

impl std::fmt::Debug for SystemActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemActor")
            .field("api_key", &"<REDACTED>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Attributes for a new, already-activated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub password: String,
    pub is_activated: bool,
}

/// Full overwrite of a user's synchronized attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: String,
    pub avatar_url: String,
    /// `None` leaves group membership untouched; `Some` replaces it.
    pub group_ids: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory configuration missing: {0}")]
    MissingConfig(String),

    #[error("Directory request failed: {0}")]
    Request(String),

    #[error("Directory response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Directory user not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Exact, case-sensitive lookup by email.
    async fn find_user_by_email(
        &self,
        actor: &SystemActor,
        email: &str,
    ) -> Result<Option<UserId>, DirectoryError>;

    async fn create_user(
        &self,
        actor: &SystemActor,
        user: &NewUser,
    ) -> Result<UserId, DirectoryError>;

    async fn update_user(
        &self,
        actor: &SystemActor,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), DirectoryError>;

    /// Short backend label for health reporting.
    fn kind(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_authorization_header_uses_token_scheme() {
        let actor = SystemActor::new("k3y", "1");
        assert_eq!(actor.authorization(), "Token k3y; userId=1");
    }

    #[test]
    fn actor_debug_redacts_api_key() {
        let actor = SystemActor::new("super-secret", "1");
        let rendered = format!("{actor:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<REDACTED>"));
    }
}
