// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire codec for the provider's SSO parameter.
//!
//! The `sso` parameter is base64 text wrapping a form-urlencoded key/value
//! set, e.g. `nonce=abc&email=a%40x.com&username=alice&roles=1,2`.

use std::collections::HashMap;

use base64ct::{Base64, Encoding};

/// Errors produced while decoding an `sso` parameter.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is not valid base64")]
    InvalidBase64,

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("payload is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Identity assertion carried by a signed SSO parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoPayload {
    pub nonce: String,
    pub email: String,
    /// Already restricted to `[A-Za-z0-9_-]`.
    pub username: String,
    pub avatar_url: Option<String>,
    pub original_url: Option<String>,
    pub roles: Vec<String>,
}

/// Decode a base64 `sso` parameter into an [`SsoPayload`].
///
/// Unknown keys are ignored and the last value wins on duplicate keys.
pub fn decode(raw: &str) -> Result<SsoPayload, DecodeError> {
    let bytes = Base64::decode_vec(&normalize_base64(raw)).map_err(|_| DecodeError::InvalidBase64)?;
    let query = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;

    let mut fields: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let nonce = fields.remove("nonce").ok_or(DecodeError::MissingField("nonce"))?;
    let email = fields.remove("email").ok_or(DecodeError::MissingField("email"))?;
    let username = fields
        .remove("username")
        .ok_or(DecodeError::MissingField("username"))?;

    Ok(SsoPayload {
        nonce,
        email,
        username: sanitize_username(&username),
        avatar_url: fields.remove("avatarUrl").filter(|v| !v.is_empty()),
        original_url: fields.remove("originalUrl").filter(|v| !v.is_empty()),
        roles: fields
            .remove("roles")
            .map(|roles| parse_roles(&roles))
            .unwrap_or_default(),
    })
}

/// Form-urlencode `fields` in order and wrap the result in base64.
pub fn encode<K, V>(fields: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    Base64::encode_string(serializer.finish().as_bytes())
}

/// Strip every character outside `[A-Za-z0-9_-]`.
pub fn sanitize_username(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn parse_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

/// Providers wrap base64 at fixed columns, and an unescaped `+` arrives as a
/// space once the query string has been decoded.
fn normalize_base64(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .map(|c| if c == ' ' { '+' } else { c })
        .collect()
}
