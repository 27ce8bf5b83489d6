// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. A missing SSO
//! secret is fatal; everything else has a development default.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SSO_SECRET` | HMAC secret shared with the identity provider | Required |
//! | `SSO_DEFAULT_REDIRECT_URL` | Post-login target when the payload has none | `http://localhost:8080/` |
//! | `SSO_PROVIDER_LOGIN_URL` | Provider endpoint the login leg redirects to | Optional |
//! | `SSO_CALLBACK_URL` | Public URL of `/auth/sso/callback` | `http://localhost:8080/auth/sso/callback` |
//! | `SSO_SESSION_TTL_SECS` | Session lifetime in seconds, at most 30 days | `3600` |
//! | `COOKIE_SECURE` | Mark the session cookie `Secure` | `false` |
//! | `FORUM_API_URL` | User-management API base URL | Optional (in-memory directory) |
//! | `FORUM_API_KEY` | API key of the provisioning actor | Required with `FORUM_API_URL` |
//! | `FORUM_API_ACTOR_ID` | User id the API key acts as | `1` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use crate::providers::SystemActor;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SSO_SECRET_ENV: &str = "SSO_SECRET";
pub const SSO_DEFAULT_REDIRECT_URL_ENV: &str = "SSO_DEFAULT_REDIRECT_URL";
pub const SSO_PROVIDER_LOGIN_URL_ENV: &str = "SSO_PROVIDER_LOGIN_URL";
pub const SSO_CALLBACK_URL_ENV: &str = "SSO_CALLBACK_URL";
pub const SSO_SESSION_TTL_SECS_ENV: &str = "SSO_SESSION_TTL_SECS";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const FORUM_API_URL_ENV: &str = "FORUM_API_URL";
pub const FORUM_API_KEY_ENV: &str = "FORUM_API_KEY";
pub const FORUM_API_ACTOR_ID_ENV: &str = "FORUM_API_ACTOR_ID";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/";
const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/auth/sso/callback";
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;
const DEFAULT_ACTOR_ID: &str = "1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration missing: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Connection details for the remote user-management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumApiConfig {
    pub base_url: String,
    pub actor: SystemActor,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub sso_secret: String,
    pub default_redirect_url: String,
    pub provider_login_url: Option<String>,
    pub callback_url: String,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    /// `None` selects the in-memory directory.
    pub forum_api: Option<ForumApiConfig>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sso_secret = get(SSO_SECRET_ENV).ok_or(ConfigError::Missing(SSO_SECRET_ENV))?;

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let session_ttl_secs = match get(SSO_SESSION_TTL_SECS_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 && secs <= MAX_SESSION_TTL_SECS => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: SSO_SESSION_TTL_SECS_ENV,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let cookie_secure = match get(COOKIE_SECURE_ENV).as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: COOKIE_SECURE_ENV,
                    value: other.to_string(),
                })
            }
        };

        let forum_api = match get(FORUM_API_URL_ENV) {
            Some(base_url) => {
                let api_key =
                    get(FORUM_API_KEY_ENV).ok_or(ConfigError::Missing(FORUM_API_KEY_ENV))?;
                let actor_id = get(FORUM_API_ACTOR_ID_ENV)
                    .unwrap_or_else(|| DEFAULT_ACTOR_ID.to_string());
                Some(ForumApiConfig {
                    base_url,
                    actor: SystemActor::new(api_key, actor_id),
                })
            }
            None => None,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            sso_secret,
            default_redirect_url: get(SSO_DEFAULT_REDIRECT_URL_ENV)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
            provider_login_url: get(SSO_PROVIDER_LOGIN_URL_ENV),
            callback_url: get(SSO_CALLBACK_URL_ENV)
                .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string()),
            session_ttl: Duration::from_secs(session_ttl_secs),
            cookie_secure,
            forum_api,
            log_format,
        })
    }

    /// Actor for directory calls. The in-memory directory ignores the key.
    pub fn system_actor(&self) -> SystemActor {
        self.forum_api
            .as_ref()
            .map(|api| api.actor.clone())
            .unwrap_or_else(|| SystemActor::new("", DEFAULT_ACTOR_ID))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sso_secret", &"<REDACTED>")
            .field("default_redirect_url", &self.default_redirect_url)
            .field("provider_login_url", &self.provider_login_url)
            .field("callback_url", &self.callback_url)
            .field("session_ttl", &self.session_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("forum_api", &self.forum_api)
            .field("log_format", &self.log_format)
            .finish()
    }
}
