//! Backend adapters implementing [`BackendClient`].
//!
//! - [`http::HttpBackend`]: the real moderation service over HTTPS + JSON,
//!   authenticated by [`id_token`] bearer sources.
//! - [`UnavailableBackend`]: degraded mode when no credentials could be loaded.
//! - [`mock::MockBackend`]: scripted, recording double for tests.

use async_trait::async_trait;
use chiv_core::{ActionParameters, ConnectedPlayer, PlayerAction, ValidatedPlayer};

use crate::application::backend::{BackendClient, BackendError};

pub mod http;
pub mod id_token;
pub mod mock;

/// Fails every call with [`BackendError::Unavailable`].
///
/// Keeps the console usable (`kick` still works) when the backend cannot be
/// reached at all.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl BackendClient for UnavailableBackend {
    async fn validate(
        &self,
        _server_name: &str,
        _players: &[ConnectedPlayer],
    ) -> Result<Vec<ValidatedPlayer>, BackendError> {
        Err(BackendError::Unavailable(self.reason.clone()))
    }

    async fn action(
        &self,
        _action: PlayerAction,
        _playfab_id: &str,
        _parameters: &ActionParameters,
    ) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_backend_fails_every_call() {
        let backend = UnavailableBackend::new("no credentials file");

        let validate = backend.validate("srv", &[]).await.unwrap_err();
        let action = backend
            .action(PlayerAction::Ban, "ID", &ActionParameters::none())
            .await
            .unwrap_err();

        assert_eq!(validate.to_string(), "backend unavailable: no credentials file");
        assert!(matches!(action, BackendError::Unavailable(_)));
    }
}
