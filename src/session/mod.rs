// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Storage
//!
//! Server-side session state shared by the two legs of the SSO handshake.
//!
//! A session holds at most one outstanding nonce (set by the login leg,
//! consumed by the callback leg) and, once the callback succeeds, the email
//! of the identity it is authenticated as.
//!
//! ## Atomicity
//!
//! [`SessionStore::take_nonce`] reads and clears the nonce in a single
//! critical section. Two callbacks racing on the same session can never both
//! observe the nonce.
//!
//! ## Fixation
//!
//! A session id chosen before login never becomes an authenticated id:
//! [`SessionStore::authenticate`] always moves the identity to a new id.

pub mod memory;
pub mod sweeper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemorySessionStore;
pub use sweeper::SessionSweeper;

/// Name of the cookie carrying the opaque session id.
pub const SESSION_COOKIE: &str = "sso_session";

/// Result type for session store operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by session backends.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Per-session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Outstanding SSO nonce, if a login was initiated and not yet consumed.
    pub nonce: Option<String>,
    /// Email of the authenticated identity.
    pub identity: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session capability injected into the SSO pipeline and HTTP handlers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `nonce` as the session's only outstanding nonce, creating the
    /// session if needed. Any previous nonce is replaced.
    async fn put_nonce(&self, session_id: &str, nonce: String) -> SessionResult<()>;

    /// Atomically remove and return the session's nonce.
    async fn take_nonce(&self, session_id: &str) -> SessionResult<Option<String>>;

    /// Whether `session_id` names a live session.
    async fn exists(&self, session_id: &str) -> SessionResult<bool>;

    /// Authenticate as `identity` under a freshly issued session id.
    ///
    /// The old record is deleted and the new id is returned; callers must
    /// hand it back to the client in place of the old one.
    async fn authenticate(&self, session_id: &str, identity: String) -> SessionResult<String>;

    /// Identity the session is authenticated as.
    async fn identity(&self, session_id: &str) -> SessionResult<Option<String>>;

    /// Drop expired sessions, returning how many were removed.
    async fn purge_expired(&self) -> SessionResult<usize>;

    /// Number of live sessions.
    async fn len(&self) -> SessionResult<usize>;
}
