// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # SSO Module
//!
//! Verification and provisioning for the provider's signed-payload login.
//!
//! ## Callback Flow
//!
//! 1. Provider redirects the browser to `/auth/sso/callback?sso=..&sig=..`
//! 2. Server:
//!    - Checks `sig` = HMAC-SHA256(secret, `sso`) in constant time
//!    - Decodes `sso` (base64 of a form-urlencoded field set)
//!    - Consumes the session's nonce and requires an exact match
//!    - Creates or updates the local account by email
//!    - Authenticates the session and redirects
//!
//! ## Security
//!
//! - Nothing in the payload is trusted before the signature check
//! - Nonces are single-use and bound to the session that issued them
//! - All rejections render one generic message

pub mod binder;
pub mod codec;
pub mod error;
pub mod nonce;
pub mod pipeline;
pub mod provisioner;
pub mod signature;

pub use binder::{AuthSessionBinder, RedirectInstruction};
pub use codec::{DecodeError, SsoPayload};
pub use error::{SsoError, GENERIC_LOGIN_ERROR};
pub use nonce::NonceGuard;
pub use pipeline::SsoPipeline;
pub use provisioner::{ProvisioningOutcome, ProvisioningRequest, UserProvisioner};
