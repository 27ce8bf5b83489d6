// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forum user-management API client (JSON:API over HTTPS).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::debug;

use super::{DirectoryError, NewUser, SystemActor, UserDirectory, UserId, UserUpdate};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

#[derive(Debug, Clone)]
pub struct ForumApiClient {
    base_url: String,
    http: Client,
}

impl ForumApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DirectoryError::MissingConfig("FORUM_API_URL".to_string()));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DirectoryError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        actor: &SystemActor,
        body: Option<&Value>,
    ) -> Result<Value, DirectoryError> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header("Authorization", actor.authorization())
            .header("Accept", JSON_API_CONTENT_TYPE)
            .query(query);
        if let Some(body) = body {
            let body = serde_json::to_vec(body).map_err(|e| {
                DirectoryError::InvalidResponse(format!("serialize body failed: {e}"))
            })?;
            request = request
                .header("Content-Type", JSON_API_CONTENT_TYPE)
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Request(format!("{method} {path} failed: {e}")))?;

        let status = response.status();
        debug!(%method, path, %status, "Forum API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Request(format!(
                "{method} {path} returned {status}: {body}"
            )));
        }

        let value: Value = response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("{method} {path} invalid JSON: {e}"))
        })?;

        if value.get("data").map_or(true, Value::is_null) {
            return Err(DirectoryError::InvalidResponse(format!(
                "{method} {path} response has no data"
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl UserDirectory for ForumApiClient {
    async fn find_user_by_email(
        &self,
        actor: &SystemActor,
        email: &str,
    ) -> Result<Option<UserId>, DirectoryError> {
        let response = self
            .send_json(
                Method::GET,
                "/api/users",
                &[("filter[email]", email)],
                actor,
                None,
            )
            .await?;
        Ok(find_matching_user(&response, email))
    }

    async fn create_user(
        &self,
        actor: &SystemActor,
        user: &NewUser,
    ) -> Result<UserId, DirectoryError> {
        let response = self
            .send_json(
                Method::POST,
                "/api/users",
                &[],
                actor,
                Some(&create_user_body(user)),
            )
            .await?;
        resource_id(&response).ok_or_else(|| {
            DirectoryError::InvalidResponse("missing user id in response".to_string())
        })
    }

    async fn update_user(
        &self,
        actor: &SystemActor,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<(), DirectoryError> {
        self.send_json(
            Method::PATCH,
            &format!("/api/users/{id}"),
            &[],
            actor,
            Some(&update_user_body(id, update)),
        )
        .await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "forum_api"
    }
}

fn create_user_body(user: &NewUser) -> Value {
    json!({
        "data": {
            "type": "users",
            "attributes": {
                "username": user.username,
                "email": user.email,
                "password": user.password,
                "isActivated": user.is_activated,
                "avatarUrl": user.avatar_url
            }
        }
    })
}

fn update_user_body(id: &UserId, update: &UserUpdate) -> Value {
    let mut data = json!({
        "type": "users",
        "id": id.0,
        "attributes": {
            "username": update.username,
            "avatarUrl": update.avatar_url
        }
    });

    if let Some(group_ids) = &update.group_ids {
        let groups: Vec<Value> = group_ids
            .iter()
            .map(|group_id| json!({ "type": "groups", "id": group_id }))
            .collect();
        data["relationships"] = json!({ "groups": { "data": groups } });
    }

    json!({ "data": data })
}

fn resource_id(response: &Value) -> Option<UserId> {
    match response.pointer("/data/id")? {
        Value::String(id) => Some(UserId(id.clone())),
        Value::Number(id) => Some(UserId(id.to_string())),
        _ => None,
    }
}

/// Search endpoints may match loosely; only an exact email hit counts.
fn find_matching_user(response: &Value, email: &str) -> Option<UserId> {
    let candidates = match response.get("data")? {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        single @ Value::Object(_) => vec![single],
        _ => return None,
    };

    candidates
        .into_iter()
        .find(|user| user.pointer("/attributes/email").and_then(Value::as_str) == Some(email))
        .and_then(|user| match user.get("id")? {
            Value::String(id) => Some(UserId(id.clone())),
            Value::Number(id) => Some(UserId(id.to_string())),
            _ => None,
        })
}
