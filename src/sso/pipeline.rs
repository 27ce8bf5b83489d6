// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Callback pipeline: signature → decode → nonce → provision → bind.
//!
//! Each gate short-circuits with an [`SsoError`]. The directory is never
//! touched before both the signature and the nonce have been accepted.

use tracing::{info, warn};

use super::{
    binder::{AuthSessionBinder, RedirectInstruction},
    codec,
    error::SsoError,
    nonce::NonceGuard,
    provisioner::{ProvisioningOutcome, ProvisioningRequest, UserProvisioner},
    signature,
};

#[derive(Clone)]
pub struct SsoPipeline {
    secret: String,
    nonces: NonceGuard,
    provisioner: UserProvisioner,
    binder: AuthSessionBinder,
}

impl SsoPipeline {
    pub fn new(
        secret: impl Into<String>,
        nonces: NonceGuard,
        provisioner: UserProvisioner,
        binder: AuthSessionBinder,
    ) -> Self {
        Self {
            secret: secret.into(),
            nonces,
            provisioner,
            binder,
        }
    }

    /// Run a provider callback for `session_id` to a terminal outcome.
    pub async fn complete(
        &self,
        session_id: Option<&str>,
        sso: &str,
        sig: &str,
    ) -> Result<RedirectInstruction, SsoError> {
        if !signature::validate(sso, sig, &self.secret) {
            return Err(SsoError::SignatureInvalid);
        }

        let payload = match codec::decode(sso) {
            Ok(payload) => payload,
            Err(e) => {
                self.nonces.discard(session_id).await;
                return Err(e.into());
            }
        };

        if !self.nonces.consume(session_id, &payload.nonce).await {
            return Err(SsoError::NonceMismatch);
        }

        let request = ProvisioningRequest {
            email: payload.email.clone(),
            username: payload.username.clone(),
            roles: payload.roles.clone(),
            avatar_url: payload.avatar_url.clone(),
        };

        match self.provisioner.provision(&request).await {
            ProvisioningOutcome::Created(id) => {
                info!(user_id = %id, "SSO login provisioned a new account");
            }
            ProvisioningOutcome::Updated(id) => {
                info!(user_id = %id, "SSO login synchronized an existing account");
            }
            ProvisioningOutcome::Failed(reason) => {
                warn!(%reason, "SSO login provisioning failed");
                return Err(SsoError::ProvisioningFailed(reason));
            }
        }

        Ok(self
            .binder
            .bind(session_id, &payload.email, payload.original_url.as_deref())
            .await)
    }

    pub fn nonces(&self) -> &NonceGuard {
        &self.nonces
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::recording::{DirectoryCall, RecordingDirectory};
    use crate::providers::{SystemActor, UserDirectory};
    use crate::session::{InMemorySessionStore, SessionStore};
    use std::sync::Arc;
    use std::time::Duration;

    const SECRET: &str = "shared-secret";
    const DEFAULT_URL: &str = "https://forum.example.com/";

    struct Harness {
        pipeline: SsoPipeline,
        sessions: Arc<dyn SessionStore>,
        directory: Arc<RecordingDirectory>,
    }

    fn harness() -> Harness {
        let sessions: Arc<dyn SessionStore> =
            Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
        let directory = Arc::new(RecordingDirectory::new());
        let dyn_directory: Arc<dyn UserDirectory> = directory.clone();
        let pipeline = SsoPipeline::new(
            SECRET,
            NonceGuard::new(Arc::clone(&sessions)),
            UserProvisioner::new(dyn_directory, SystemActor::new("key", "1")),
            AuthSessionBinder::new(Arc::clone(&sessions), DEFAULT_URL),
        );
        Harness {
            pipeline,
            sessions,
            directory,
        }
    }

    fn signed(fields: &[(&str, &str)]) -> (String, String) {
        let sso = codec::encode(fields);
        let sig = signature::sign(&sso, SECRET);
        (sso, sig)
    }

    fn alice() -> Vec<(&'static str, &'static str)> {
        vec![
            ("nonce", "abc"),
            ("email", "a@x.com"),
            ("username", "Al#ice"),
            ("roles", "1,2"),
        ]
    }

    #[tokio::test]
    async fn new_user_is_provisioned_and_bound() {
        let h = harness();
        h.sessions.put_nonce("s1", "abc".into()).await.unwrap();
        let (sso, sig) = signed(&alice());

        let instruction = h.pipeline.complete(Some("s1"), &sso, &sig).await.unwrap();

        assert_eq!(instruction.identity, "a@x.com");
        assert_eq!(instruction.location, DEFAULT_URL);
        let calls = h.directory.calls();
        assert!(matches!(
            &calls[1],
            DirectoryCall::Create { username, .. } if username == "Alice"
        ));
        assert!(matches!(
            &calls[2],
            DirectoryCall::Update { group_ids: Some(groups), .. } if groups == &["1", "2"]
        ));
    }

    #[tokio::test]
    async fn replayed_payload_is_rejected_without_directory_calls() {
        let h = harness();
        h.sessions.put_nonce("s1", "abc".into()).await.unwrap();
        let (sso, sig) = signed(&alice());

        h.pipeline.complete(Some("s1"), &sso, &sig).await.unwrap();
        let calls_after_first = h.directory.calls().len();

        let replay = h.pipeline.complete(Some("s1"), &sso, &sig).await;
        assert!(matches!(replay, Err(SsoError::NonceMismatch)));
        assert_eq!(h.directory.calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_nonce_and_directory() {
        let h = harness();
        h.sessions.put_nonce("s1", "abc".into()).await.unwrap();
        let (sso, sig) = signed(&alice());
        let tampered = format!("{}{}", if sig.starts_with('0') { '1' } else { '0' }, &sig[1..]);

        let result = h.pipeline.complete(Some("s1"), &sso, &tampered).await;
        assert!(matches!(result, Err(SsoError::SignatureInvalid)));
        assert!(h.directory.calls().is_empty());
        // The nonce is still available for the legitimate callback.
        assert!(h.pipeline.complete(Some("s1"), &sso, &sig).await.is_ok());
    }

    #[tokio::test]
    async fn mismatched_nonce_is_rejected_and_cleared() {
        let h = harness();
        h.sessions.put_nonce("s1", "other".into()).await.unwrap();
        let (sso, sig) = signed(&alice());

        let result = h.pipeline.complete(Some("s1"), &sso, &sig).await;
        assert!(matches!(result, Err(SsoError::NonceMismatch)));
        assert!(h.directory.calls().is_empty());
        assert_eq!(h.sessions.take_nonce("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_session_is_a_nonce_mismatch() {
        let h = harness();
        let (sso, sig) = signed(&alice());

        let result = h.pipeline.complete(None, &sso, &sig).await;
        assert!(matches!(result, Err(SsoError::NonceMismatch)));
    }

    #[tokio::test]
    async fn signed_but_malformed_payload_clears_nonce() {
        let h = harness();
        h.sessions.put_nonce("s1", "abc".into()).await.unwrap();
        let (sso, sig) = signed(&[("nonce", "abc"), ("username", "alice")]);

        let result = h.pipeline.complete(Some("s1"), &sso, &sig).await;
        assert!(matches!(result, Err(SsoError::PayloadMalformed(_))));
        assert_eq!(h.sessions.take_nonce("s1").await.unwrap(), None);
        assert!(h.directory.calls().is_empty());
    }

    #[tokio::test]
    async fn existing_user_is_updated_and_redirected_to_original_url() {
        let h = harness();
        h.sessions.put_nonce("s1", "abc".into()).await.unwrap();
        let (sso, sig) = signed(&alice());
        h.pipeline.complete(Some("s1"), &sso, &sig).await.unwrap();

        h.sessions.put_nonce("s1", "def".into()).await.unwrap();
        let (sso, sig) = signed(&[
            ("nonce", "def"),
            ("email", "a@x.com"),
            ("username", "alice"),
            ("originalUrl", "https://forum.example.com/d/7"),
        ]);
        let instruction = h.pipeline.complete(Some("s1"), &sso, &sig).await.unwrap();

        assert_eq!(instruction.location, "https://forum.example.com/d/7");
        assert_eq!(h.directory.user_count(), 1);
        let user = h.directory.user_by_email("a@x.com").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.groups.len(), 2);
    }
}
