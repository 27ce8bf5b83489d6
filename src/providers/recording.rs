// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test directory that records every call before delegating to
//! [`InMemoryDirectory`].

use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    memory::DirectoryUser, DirectoryError, InMemoryDirectory, NewUser, SystemActor,
    UserDirectory, UserId, UserUpdate,
};

/// A directory call as observed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Find {
        email: String,
    },
    Create {
        username: String,
        email: String,
    },
    Update {
        id: UserId,
        username: String,
        group_ids: Option<Vec<String>>,
    },
}

#[derive(Default)]
pub struct RecordingDirectory {
    inner: InMemoryDirectory,
    calls: Mutex<Vec<DirectoryCall>>,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn user_by_email(&self, email: &str) -> Option<DirectoryUser> {
        self.inner.user_by_email(email)
    }

    pub fn user_count(&self) -> usize {
        self.inner.user_count()
    }

    fn record(&self, call: DirectoryCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl UserDirectory for RecordingDirectory {
    async fn find_user_by_email(
        &self,
        actor: &SystemActor,
        email: &str,
    ) -> Result<Option<UserId>, DirectoryError> {
        self.record(DirectoryCall::Find {
            email: email.to_string(),
        });
        self.inner.find_user_by_email(actor, email).await
    }

    async fn create_user(
        &self,
        actor: &SystemActor,
        user: &NewUser,
    ) -> Result<UserId, DirectoryError> {
        self.record(DirectoryCall::Create {
            username: user.username.clone(),
            email: user.email.clone(),
        });
        self.inner.create_user(actor, user).await
    }

    async fn update_user(
        &self,
        actor: &SystemActor,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), DirectoryError> {
        self.record(DirectoryCall::Update {
            id: id.clone(),
            username: update.username.clone(),
            group_ids: update.group_ids.clone(),
        });
        self.inner.update_user(actor, id, update).await
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order_and_delegates_state() {
        let directory = RecordingDirectory::new();
        let actor = SystemActor::new("", "1");

        assert_eq!(directory.find_user_by_email(&actor, "a@x.com").await.unwrap(), None);
        let id = directory
            .create_user(
                &actor,
                &NewUser {
                    username: "alice".to_string(),
                    email: "a@x.com".to_string(),
                    avatar_url: String::new(),
                    password: "pw".to_string(),
                    is_activated: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(directory.user_count(), 1);
        assert_eq!(directory.user_by_email("a@x.com").unwrap().id, id);
        assert_eq!(
            directory.calls(),
            vec![
                DirectoryCall::Find {
                    email: "a@x.com".to_string()
                },
                DirectoryCall::Create {
                    username: "alice".to_string(),
                    email: "a@x.com".to_string(),
                },
            ]
        );
    }
}
