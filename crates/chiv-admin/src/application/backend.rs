//! The seam between the event loop and the remote moderation service.
//!
//! Use cases depend on [`BackendClient`] only; the HTTP implementation lives
//! in `infrastructure::backend` and tests inject recording doubles.

use async_trait::async_trait;
use chiv_core::{ActionParameters, ConnectedPlayer, PlayerAction, ValidatedPlayer};
use thiserror::Error;

/// Transport-level failures talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected schema.
    #[error("malformed backend response: {0}")]
    Decode(String),

    /// No ID token could be obtained for the request.
    #[error("backend authentication failed: {0}")]
    Auth(String),

    /// No usable backend connection exists (e.g. credentials failed to load).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Remote validation and moderation service.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Enriches the connected players of `server_name`.
    ///
    /// Idempotent and free of side effects on the moderation system. The
    /// order of the returned players is unspecified.
    async fn validate(
        &self,
        server_name: &str,
        players: &[ConnectedPlayer],
    ) -> Result<Vec<ValidatedPlayer>, BackendError>;

    /// Applies a moderation action to `playfab_id`.
    ///
    /// Returns the display-ready operator command, which may be empty.
    async fn action(
        &self,
        action: PlayerAction,
        playfab_id: &str,
        parameters: &ActionParameters,
    ) -> Result<String, BackendError>;
}
