// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Final decision step: which identity to log in as and where to send it.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::session::SessionStore;

/// Instruction for the HTTP layer to authenticate and redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectInstruction {
    /// Email of the local identity to authenticate as.
    pub identity: String,
    pub location: String,
}

#[derive(Clone)]
pub struct AuthSessionBinder {
    sessions: Arc<dyn SessionStore>,
    default_redirect: String,
}

impl AuthSessionBinder {
    pub fn new(sessions: Arc<dyn SessionStore>, default_redirect: impl Into<String>) -> Self {
        Self {
            sessions,
            default_redirect: default_redirect.into(),
        }
    }

    pub async fn bind(
        &self,
        session_id: Option<&str>,
        email: &str,
        original_url: Option<&str>,
    ) -> RedirectInstruction {
        // Already taken by the nonce guard; clearing again is a no-op.
        if let Some(session_id) = session_id {
            if let Err(e) = self.sessions.take_nonce(session_id).await {
                warn!(error = %e, "Failed to re-clear session nonce");
            }
        }

        RedirectInstruction {
            identity: email.to_string(),
            location: original_url
                .filter(|url| !url.is_empty())
                .unwrap_or(&self.default_redirect)
                .to_string(),
        }
    }
}
