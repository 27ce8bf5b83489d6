// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local user directory.
//!
//! Used when no forum API is configured (development mode) and by tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DirectoryError, NewUser, SystemActor, UserDirectory, UserId, UserUpdate};

/// Stored account state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub groups: BTreeSet<String>,
    pub is_activated: bool,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, DirectoryUser>,
    next_id: u64,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    inner: Mutex<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_by_email(&self, email: &str) -> Option<DirectoryUser> {
        let inner = self.lock().ok()?;
        inner.users.values().find(|u| u.email == email).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|inner| inner.users.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, DirectoryError> {
        self.inner
            .lock()
            .map_err(|_| DirectoryError::Request("directory lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user_by_email(
        &self,
        _actor: &SystemActor,
        email: &str,
    ) -> Result<Option<UserId>, DirectoryError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.email == email)
            .map(|u| u.id.clone()))
    }

    async fn create_user(
        &self,
        _actor: &SystemActor,
        user: &NewUser,
    ) -> Result<UserId, DirectoryError> {
        let mut inner = self.lock()?;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(DirectoryError::InvalidResponse(format!(
                "email already registered: {}",
                user.email
            )));
        }

        inner.next_id += 1;
        let id = UserId(inner.next_id.to_string());
        inner.users.insert(
            id.clone(),
            DirectoryUser {
                id: id.clone(),
                email: user.email.clone(),
                username: user.username.clone(),
                avatar_url: user.avatar_url.clone(),
                groups: BTreeSet::new(),
                is_activated: user.is_activated,
            },
        );
        Ok(id)
    }

    async fn update_user(
        &self,
        _actor: &SystemActor,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), DirectoryError> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;
        user.username = update.username.clone();
        user.avatar_url = update.avatar_url.clone();
        if let Some(group_ids) = &update.group_ids {
            user.groups = group_ids.iter().cloned().collect();
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> SystemActor {
        SystemActor::new("", "1")
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            avatar_url: String::new(),
            password: "pw".to_string(),
            is_activated: true,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_exact_email() {
        let directory = InMemoryDirectory::new();
        let id = directory.create_user(&actor(), &new_user("a@x.com")).await.unwrap();

        assert_eq!(
            directory.find_user_by_email(&actor(), "a@x.com").await.unwrap(),
            Some(id)
        );
        assert_eq!(
            directory.find_user_by_email(&actor(), "A@x.com").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let directory = InMemoryDirectory::new();
        directory.create_user(&actor(), &new_user("a@x.com")).await.unwrap();
        assert!(directory.create_user(&actor(), &new_user("a@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn update_without_groups_keeps_membership() {
        let directory = InMemoryDirectory::new();
        let id = directory.create_user(&actor(), &new_user("a@x.com")).await.unwrap();

        let with_groups = UserUpdate {
            username: "alice".to_string(),
            avatar_url: String::new(),
            group_ids: Some(vec!["1".to_string(), "2".to_string()]),
        };
        directory.update_user(&actor(), &id, &with_groups).await.unwrap();

        let rename_only = UserUpdate {
            username: "alice2".to_string(),
            avatar_url: String::new(),
            group_ids: None,
        };
        directory.update_user(&actor(), &id, &rename_only).await.unwrap();

        let user = directory.user_by_email("a@x.com").unwrap();
        assert_eq!(user.username, "alice2");
        assert_eq!(user.groups.len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_user_is_not_found() {
        let directory = InMemoryDirectory::new();
        let update = UserUpdate {
            username: "ghost".to_string(),
            avatar_url: String::new(),
            group_ids: None,
        };
        let err = directory
            .update_user(&actor(), &UserId::from("99"), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }
}
