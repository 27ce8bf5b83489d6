// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session introspection endpoint.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::ApiError, session::SESSION_COOKIE, state::AppState};

/// Response for GET /auth/session
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct SessionResponse {
    pub authenticated: bool,
    /// Email of the authenticated identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<Option<String>> for SessionResponse {
    fn from(email: Option<String>) -> Self {
        Self {
            authenticated: email.is_some(),
            email,
        }
    }
}

/// Get the identity the current session is authenticated as.
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<SessionResponse>, ApiError> {
    let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(Json(None.into()));
    };

    let email = state
        .sessions
        .identity(&session_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read session: {e}")))?;
    Ok(Json(email.into()))
}
