// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SSO endpoints: login initiation and provider callback.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::IntoParams;

use crate::{
    error::ApiError,
    session::SESSION_COOKIE,
    sso::{codec, signature, SsoError},
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Page to return to after a successful login.
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    /// Base64 payload from the identity provider.
    pub sso: Option<String>,
    /// Hex HMAC-SHA256 of `sso`.
    pub sig: Option<String>,
}

fn session_cookie(session_id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn found(location: String) -> [(header::HeaderName, String); 1] {
    [(header::LOCATION, location)]
}

/// Start an SSO login.
///
/// Issues a fresh nonce for the caller's session and redirects to the
/// identity provider with a signed request payload.
#[utoipa::path(
    get,
    path = "/auth/sso/login",
    params(LoginQuery),
    tag = "SSO",
    responses(
        (status = 302, description = "Redirect to the identity provider"),
        (status = 503, description = "Provider login URL is not configured"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    let Some(provider_url) = state.config.provider_login_url.as_deref() else {
        return Err(ApiError::service_unavailable("SSO login is not configured"));
    };

    // Only a session this server already issued is reused.
    let presented = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let existing = match presented {
        Some(id) => match state.sessions.exists(&id).await {
            Ok(true) => Some(id),
            Ok(false) => None,
            Err(e) => {
                error!(error = %e, "Failed to look up session");
                return Err(ApiError::internal("Failed to start SSO login"));
            }
        },
        None => None,
    };
    let session_id = existing.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let nonce = state.pipeline.nonces().issue(&session_id).await.map_err(|e| {
        error!(error = %e, "Failed to issue SSO nonce");
        ApiError::internal("Failed to start SSO login")
    })?;

    let mut fields = vec![
        ("nonce", nonce),
        ("return_sso_url", state.config.callback_url.clone()),
    ];
    if let Some(return_to) = params.return_to.filter(|v| !v.is_empty()) {
        fields.push(("originalUrl", return_to));
    }
    let sso = codec::encode(&fields);
    let sig = signature::sign(&sso, state.pipeline.secret());

    let location = url::Url::parse_with_params(provider_url, &[("sso", &sso), ("sig", &sig)])
        .map_err(|e| {
            error!(error = %e, "SSO provider login URL is invalid");
            ApiError::internal("Failed to start SSO login")
        })?;

    let jar = jar.add(session_cookie(session_id, state.config.cookie_secure));
    Ok((StatusCode::FOUND, jar, found(location.to_string())).into_response())
}

/// Complete an SSO login.
///
/// Every rejection renders the same generic message; the reason is only
/// logged.
#[utoipa::path(
    get,
    path = "/auth/sso/callback",
    params(CallbackQuery),
    tag = "SSO",
    responses(
        (status = 302, description = "Session authenticated; redirect to the target page"),
        (status = 403, description = "Invalid SSO login"),
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    let sso = params.sso.unwrap_or_default();
    let sig = params.sig.unwrap_or_default();

    let instruction = match state
        .pipeline
        .complete(session_id.as_deref(), &sso, &sig)
        .await
    {
        Ok(instruction) => instruction,
        Err(e) => {
            warn!(error = %e, error_code = e.error_code(), "SSO login rejected");
            return e.into_response();
        }
    };

    // A matched nonce implies the session exists.
    let Some(session_id) = session_id else {
        return SsoError::NonceMismatch.into_response();
    };
    let rotated = match state
        .sessions
        .authenticate(&session_id, instruction.identity.clone())
        .await
    {
        Ok(rotated) => rotated,
        Err(e) => {
            error!(error = %e, "Failed to authenticate session after SSO login");
            return SsoError::ProvisioningFailed(e.to_string()).into_response();
        }
    };

    info!(identity = %instruction.identity, "SSO login succeeded");
    let jar = jar.add(session_cookie(rotated, state.config.cookie_secure));
    (StatusCode::FOUND, jar, found(instruction.location)).into_response()
}
