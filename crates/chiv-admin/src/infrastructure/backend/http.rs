//! HTTP + JSON client for the validation and moderation endpoints.
//!
//! # Wire format
//!
//! ```text
//! POST {validate_url}
//!   {"check_wanted_board": true, "server_name": "...", "players": [{"display_name", "playfab_id"}]}
//!   <- {"validated_players": [...]}
//!
//! POST {action_url}
//!   {"action": "ban", "playfab_id": "...", "parameters": {"charges": ["..."]}}
//!   <- {"command": "..."}        // older deployments answer {"ban_command": "..."}
//! ```
//!
//! Every request carries `Authorization: Bearer <token>`, where the token is
//! an ID token minted for that endpoint's URL (see [`super::id_token`]).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chiv_core::{ActionParameters, ConnectedPlayer, PlayerAction, ValidatedPlayer};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id_token::{BearerSource, ServiceAccountTokenSource, StaticToken};
use crate::application::backend::{BackendClient, BackendError};
use crate::infrastructure::storage::credentials::ServiceAccountKey;

/// Longest slice of an error body quoted back to the operator.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    check_wanted_board: bool,
    server_name: &'a str,
    players: &'a [ConnectedPlayer],
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    validated_players: Vec<ValidatedPlayer>,
}

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    action: PlayerAction,
    playfab_id: &'a str,
    parameters: &'a ActionParameters,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default, alias = "ban_command")]
    command: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// [`BackendClient`] talking to the hosted moderation service.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    validate_url: String,
    action_url: String,
    validate_auth: Arc<dyn BearerSource>,
    action_auth: Arc<dyn BearerSource>,
}

impl HttpBackend {
    /// Authenticates with ID tokens minted from `key`, one audience per
    /// endpoint. Requests (token exchange included) time out after `timeout`.
    pub fn from_service_account(
        validate_url: impl Into<String>,
        action_url: impl Into<String>,
        key: &ServiceAccountKey,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = build_client(timeout)?;
        let validate_url = validate_url.into();
        let action_url = action_url.into();
        let validate_auth = ServiceAccountTokenSource::new(client.clone(), key, &validate_url)?;
        let action_auth = ServiceAccountTokenSource::new(client.clone(), key, &action_url)?;
        Ok(Self {
            client,
            validate_url,
            action_url,
            validate_auth: Arc::new(validate_auth),
            action_auth: Arc::new(action_auth),
        })
    }

    /// Sends the same fixed `token` to both endpoints.
    pub fn with_bearer_token(
        validate_url: impl Into<String>,
        action_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let auth: Arc<dyn BearerSource> = Arc::new(StaticToken::new(token));
        Ok(Self {
            client: build_client(timeout)?,
            validate_url: validate_url.into(),
            action_url: action_url.into(),
            validate_auth: Arc::clone(&auth),
            action_auth: auth,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        auth: &dyn BearerSource,
        body: &B,
    ) -> Result<String, BackendError> {
        let token = auth.bearer_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        debug!(url, status = status.as_u16(), bytes = text.len(), "backend responded");

        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn validate(
        &self,
        server_name: &str,
        players: &[ConnectedPlayer],
    ) -> Result<Vec<ValidatedPlayer>, BackendError> {
        let request = ValidateRequest {
            check_wanted_board: true,
            server_name,
            players,
        };
        let body = self
            .post(&self.validate_url, self.validate_auth.as_ref(), &request)
            .await?;
        decode_validate_response(&body)
    }

    async fn action(
        &self,
        action: PlayerAction,
        playfab_id: &str,
        parameters: &ActionParameters,
    ) -> Result<String, BackendError> {
        let request = ActionRequest {
            action,
            playfab_id,
            parameters,
        };
        let body = self
            .post(&self.action_url, self.action_auth.as_ref(), &request)
            .await?;
        decode_action_response(&body)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Request(e.to_string()))
}

fn decode_validate_response(body: &str) -> Result<Vec<ValidatedPlayer>, BackendError> {
    serde_json::from_str::<ValidateResponse>(body)
        .map(|r| r.validated_players)
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// A missing or null command means there is nothing to paste.
fn decode_action_response(body: &str) -> Result<String, BackendError> {
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    serde_json::from_str::<ActionResponse>(body)
        .map(|r| r.command.unwrap_or_default())
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// One-line description of a non-success response.
fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error)
        .ok()
        .or_else(|| {
            let line = body.lines().next().unwrap_or_default().trim();
            (!line.is_empty()).then(|| line.chars().take(MAX_ERROR_BODY_CHARS).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no reason given").to_string());
    BackendError::Status {
        status: status.as_u16(),
        message,
    }
}
