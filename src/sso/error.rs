// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SSO login errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::codec::DecodeError;

/// The only message a client ever sees for a rejected login.
pub const GENERIC_LOGIN_ERROR: &str = "Invalid SSO login. Please contact an administrator.";

/// Terminal, non-retryable reasons an SSO callback is rejected.
///
/// The variants are distinguished in logs only; every variant renders the
/// same response body.
#[derive(Debug, thiserror::Error)]
pub enum SsoError {
    #[error("SSO signature is invalid")]
    SignatureInvalid,

    #[error("SSO payload is malformed: {0}")]
    PayloadMalformed(#[from] DecodeError),

    #[error("SSO nonce does not match the session")]
    NonceMismatch,

    #[error("SSO provisioning failed: {0}")]
    ProvisioningFailed(String),
}

#[derive(Serialize)]
struct SsoErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl SsoError {
    /// Internal error code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            SsoError::SignatureInvalid => "signature_invalid",
            SsoError::PayloadMalformed(_) => "payload_malformed",
            SsoError::NonceMismatch => "nonce_mismatch",
            SsoError::ProvisioningFailed(_) => "provisioning_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl IntoResponse for SsoError {
    fn into_response(self) -> Response {
        let body = Json(SsoErrorBody {
            error: GENERIC_LOGIN_ERROR,
            error_code: "invalid_sso_login",
        });
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_variant_renders_the_same_body() {
        let errors = [
            SsoError::SignatureInvalid,
            SsoError::PayloadMalformed(DecodeError::InvalidBase64),
            SsoError::NonceMismatch,
            SsoError::ProvisioningFailed("directory down".to_string()),
        ];

        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);

            let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
            assert_eq!(body["error"], GENERIC_LOGIN_ERROR);
            assert_eq!(body["error_code"], "invalid_sso_login");
        }
    }

    #[test]
    fn error_codes_distinguish_variants() {
        assert_eq!(SsoError::SignatureInvalid.error_code(), "signature_invalid");
        assert_eq!(SsoError::NonceMismatch.error_code(), "nonce_mismatch");
        assert_eq!(
            SsoError::PayloadMalformed(DecodeError::MissingField("email")).error_code(),
            "payload_malformed"
        );
        assert_eq!(
            SsoError::ProvisioningFailed(String::new()).error_code(),
            "provisioning_failed"
        );
    }
}
