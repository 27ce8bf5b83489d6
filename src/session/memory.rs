// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process session store.
//!
//! Suitable for a single node. Sessions expire `ttl` after the last write.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{SessionError, SessionRecord, SessionResult, SessionStore};

pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    ttl: chrono::Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(1)),
        }
    }

    fn expiry(&self, now: DateTime<Utc>) -> SessionResult<DateTime<Utc>> {
        now.checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Unavailable("session TTL out of range".to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put_nonce(&self, session_id: &str, nonce: String) -> SessionResult<()> {
        let now = Utc::now();
        let expires_at = self.expiry(now)?;
        let mut sessions = self.sessions.lock().await;
        let record = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord {
                nonce: None,
                identity: None,
                expires_at: now,
            });
        if record.is_expired(now) {
            record.identity = None;
        }
        record.nonce = Some(nonce);
        record.expires_at = expires_at;
        Ok(())
    }

    async fn take_nonce(&self, session_id: &str) -> SessionResult<Option<String>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let Some(record) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        if record.is_expired(now) {
            sessions.remove(session_id);
            return Ok(None);
        }
        Ok(record.nonce.take())
    }

    async fn exists(&self, session_id: &str) -> SessionResult<bool> {
        let now = Utc::now();
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session_id)
            .is_some_and(|record| !record.is_expired(now)))
    }

    async fn authenticate(&self, session_id: &str, identity: String) -> SessionResult<String> {
        let now = Utc::now();
        let expires_at = self.expiry(now)?;
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(session_id) {
            Some(record) if !record.is_expired(now) => {
                let rotated = Uuid::new_v4().to_string();
                sessions.insert(
                    rotated.clone(),
                    SessionRecord {
                        nonce: None,
                        identity: Some(identity),
                        expires_at,
                    },
                );
                Ok(rotated)
            }
            _ => Err(SessionError::NotFound),
        }
    }

    async fn identity(&self, session_id: &str) -> SessionResult<Option<String>> {
        let now = Utc::now();
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session_id)
            .filter(|record| !record.is_expired(now))
            .and_then(|record| record.identity.clone()))
    }

    async fn purge_expired(&self) -> SessionResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        Ok(before - sessions.len())
    }

    async fn len(&self) -> SessionResult<usize> {
        let now = Utc::now();
        let sessions = self.sessions.lock().await;
        Ok(sessions.values().filter(|r| !r.is_expired(now)).count())
    }
}
