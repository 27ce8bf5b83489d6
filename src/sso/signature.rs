// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC-SHA256 signatures over the raw `sso` parameter.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Check `signature` (hex) against HMAC-SHA256(`secret`, `raw_param`).
///
/// The digest comparison runs in constant time. Returns `false` for an empty
/// secret, a signature that is not hex, or any mismatch.
pub fn validate(raw_param: &str, signature: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_param.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Hex-encoded HMAC-SHA256 of `raw_param` under `secret`.
pub fn sign(raw_param: &str, secret: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
    mac.update(raw_param.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
