//! Bearer tokens for the backend endpoints.
//!
//! The endpoints accept Google-signed ID tokens whose audience is the
//! endpoint URL. A service account obtains one by signing a JWT assertion
//! with its private key and exchanging it at the key's `token_uri`:
//!
//! ```text
//! assertion = RS256({iss, sub: client_email, aud: token_uri,
//!                    target_audience: <endpoint url>, iat, exp})
//! POST token_uri  grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer
//!                 assertion=<assertion>
//!   <- {"id_token": "..."}
//! ```
//!
//! Tokens live for an hour; [`ServiceAccountTokenSource`] caches one per
//! audience and mints a new one shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::application::backend::BackendError;
use crate::infrastructure::storage::credentials::ServiceAccountKey;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime Google grants to both the assertion and the ID token.
const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// A cached token is replaced this long before it would expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Supplies the `Authorization: Bearer` value for one endpoint.
#[async_trait]
pub trait BearerSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String, BackendError>;
}

/// A fixed token, for deployments behind a gateway that issues its own.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl BearerSource for StaticToken {
    async fn bearer_token(&self) -> Result<String, BackendError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    target_audience: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Mints and caches ID tokens for one audience from a service-account key.
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    signing_key: EncodingKey,
    audience: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// # Errors
    ///
    /// [`BackendError::Auth`] when the private key is not a PEM RSA key.
    pub fn new(
        client: reqwest::Client,
        key: &ServiceAccountKey,
        audience: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| BackendError::Auth(format!("unusable service-account private key: {e}")))?;
        Ok(Self {
            client,
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.clone(),
            token_uri: key.token_uri.clone(),
            signing_key,
            audience: audience.into(),
            cached: Mutex::new(None),
        })
    }

    /// Signed JWT assertion for the token exchange, issued at `issued_at`
    /// (seconds since the Unix epoch).
    fn assertion(&self, issued_at: i64) -> Result<String, BackendError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            sub: &self.client_email,
            aud: &self.token_uri,
            target_audience: &self.audience,
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME.as_secs() as i64,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| BackendError::Auth(format!("could not sign token request: {e}")))
    }

    async fn mint(&self) -> Result<String, BackendError> {
        let assertion = self.assertion(Utc::now().timestamp())?;
        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| BackendError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Auth(format!("token request failed: {e}")))?;
        if !status.is_success() {
            let reason = body.lines().next().unwrap_or_default().trim();
            return Err(BackendError::Auth(format!(
                "token endpoint returned status {}: {reason}",
                status.as_u16()
            )));
        }

        serde_json::from_str::<TokenResponse>(&body)
            .map(|r| r.id_token)
            .map_err(|e| BackendError::Auth(format!("malformed token response: {e}")))
    }
}

#[async_trait]
impl BearerSource for ServiceAccountTokenSource {
    async fn bearer_token(&self) -> Result<String, BackendError> {
        // Held across the exchange so concurrent callers share one request.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.token.clone());
        }

        let token = self.mint().await?;
        debug!(audience = %self.audience, "minted ID token");
        *cached = Some(CachedToken {
            token: token.clone(),
            refresh_at: Instant::now() + (TOKEN_LIFETIME - REFRESH_MARGIN),
        });
        Ok(token)
    }
}
