// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use nonces binding a login attempt to the session that started it.

use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};
use tracing::error;

use crate::session::{SessionError, SessionStore};

const NONCE_BYTES: usize = 16;

/// `true` only when the session nonce is present and equals the payload's.
pub fn nonce_matches(session_nonce: Option<&str>, payload_nonce: &str) -> bool {
    matches!(session_nonce, Some(expected) if expected == payload_nonce)
}

#[derive(Clone)]
pub struct NonceGuard {
    sessions: Arc<dyn SessionStore>,
    rng: SystemRandom,
}

impl NonceGuard {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            rng: SystemRandom::new(),
        }
    }

    /// Generate a fresh nonce and make it the session's only outstanding one.
    pub async fn issue(&self, session_id: &str) -> Result<String, SessionError> {
        let mut bytes = [0u8; NONCE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| SessionError::Unavailable("system RNG failure".to_string()))?;
        let nonce = hex::encode(bytes);
        self.sessions.put_nonce(session_id, nonce.clone()).await?;
        Ok(nonce)
    }

    /// Consume the session's nonce and compare it with `payload_nonce`.
    ///
    /// The stored nonce is cleared whether or not it matches, so each issued
    /// nonce admits at most one callback.
    pub async fn consume(&self, session_id: Option<&str>, payload_nonce: &str) -> bool {
        let Some(session_id) = session_id else {
            return false;
        };
        match self.sessions.take_nonce(session_id).await {
            Ok(stored) => nonce_matches(stored.as_deref(), payload_nonce),
            Err(e) => {
                error!(error = %e, "Failed to consume session nonce");
                false
            }
        }
    }

    /// Clear any outstanding nonce without checking it.
    pub async fn discard(&self, session_id: Option<&str>) {
        if let Some(session_id) = session_id {
            if let Err(e) = self.sessions.take_nonce(session_id).await {
                error!(error = %e, "Failed to clear session nonce");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use std::time::Duration;

    fn guard() -> NonceGuard {
        NonceGuard::new(Arc::new(InMemorySessionStore::new(Duration::from_secs(60))))
    }

    #[test]
    fn nonce_matches_requires_exact_value() {
        assert!(nonce_matches(Some("abc"), "abc"));
        assert!(!nonce_matches(Some("abc"), "ABC"));
        assert!(!nonce_matches(Some("abc"), "abcd"));
        assert!(!nonce_matches(None, "abc"));
        assert!(!nonce_matches(None, ""));
    }

    #[tokio::test]
    async fn issued_nonce_is_consumed_once() {
        let guard = guard();
        let nonce = guard.issue("s1").await.unwrap();
        assert_eq!(nonce.len(), NONCE_BYTES * 2);

        assert!(guard.consume(Some("s1"), &nonce).await);
        assert!(!guard.consume(Some("s1"), &nonce).await);
    }

    #[tokio::test]
    async fn mismatch_still_clears_nonce() {
        let guard = guard();
        let nonce = guard.issue("s1").await.unwrap();

        assert!(!guard.consume(Some("s1"), "forged").await);
        assert!(!guard.consume(Some("s1"), &nonce).await);
    }

    #[tokio::test]
    async fn nonce_is_bound_to_issuing_session() {
        let guard = guard();
        let nonce = guard.issue("s1").await.unwrap();

        assert!(!guard.consume(Some("s2"), &nonce).await);
        assert!(!guard.consume(None, &nonce).await);
        assert!(guard.consume(Some("s1"), &nonce).await);
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_nonce() {
        let guard = guard();
        let first = guard.issue("s1").await.unwrap();
        let second = guard.issue("s1").await.unwrap();
        assert_ne!(first, second);

        assert!(!guard.consume(Some("s1"), &first).await);
    }

    #[tokio::test]
    async fn discard_clears_outstanding_nonce() {
        let guard = guard();
        let nonce = guard.issue("s1").await.unwrap();
        guard.discard(Some("s1")).await;

        assert!(!guard.consume(Some("s1"), &nonce).await);
    }
}
