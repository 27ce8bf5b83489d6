// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational SSO Bridge - signed-payload single sign-on service
//!
//! Accepts identity assertions from an external provider, verifies their
//! HMAC-SHA256 signature and nonce, provisions the matching account in the
//! user directory, and binds the identity to a browser session.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `providers` - User directory backends (remote forum API, in-memory)
//! - `session` - Session store and expiry sweeper
//! - `sso` - Payload codec, signature check, nonce guard, provisioning

pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod sso;
pub mod state;
