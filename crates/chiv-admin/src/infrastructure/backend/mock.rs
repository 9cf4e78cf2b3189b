//! Scripted backend for tests.
//!
//! Validation answers with a canned roster (or echoes the connected players);
//! actions answer with queued responses. Every call is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chiv_core::{ActionParameters, ConnectedPlayer, PlayerAction, ValidatedPlayer};

use crate::application::backend::{BackendClient, BackendError};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Validate {
        server_name: String,
        players: Vec<ConnectedPlayer>,
    },
    Action {
        action: PlayerAction,
        playfab_id: String,
        parameters: ActionParameters,
    },
}

#[derive(Debug, Default)]
struct Script {
    /// Enrichment keyed by playfab id; unknown ids come back as plain records.
    known_players: HashMap<String, ValidatedPlayer>,
    validate_failure: Option<String>,
    action_responses: VecDeque<Result<String, String>>,
    delay: Option<Duration>,
    calls: Vec<BackendCall>,
}

/// Recording [`BackendClient`]. Clones share the script and the record.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation returns `player` whenever its playfab id is connected.
    pub fn with_known_player(self, player: ValidatedPlayer) -> Self {
        self.lock()
            .known_players
            .insert(player.playfab_id.clone(), player);
        self
    }

    /// Every validation fails with [`BackendError::Request`].
    pub fn fail_validation(&self, reason: impl Into<String>) {
        self.lock().validate_failure = Some(reason.into());
    }

    pub fn succeed_validation(&self) {
        self.lock().validate_failure = None;
    }

    /// Queues the response of the next action call. Unqueued calls return "".
    pub fn push_action_response(&self, response: Result<String, String>) {
        self.lock().action_responses.push_back(response);
    }

    /// Delays every call, to exercise shutdown while a call is in flight.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn action_calls(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, BackendCall::Action { .. }))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("lock poisoned")
    }

    fn delay(&self) -> Option<Duration> {
        self.lock().delay
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn validate(
        &self,
        server_name: &str,
        players: &[ConnectedPlayer],
    ) -> Result<Vec<ValidatedPlayer>, BackendError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.lock();
        script.calls.push(BackendCall::Validate {
            server_name: server_name.to_string(),
            players: players.to_vec(),
        });
        if let Some(reason) = &script.validate_failure {
            return Err(BackendError::Request(reason.clone()));
        }
        Ok(players
            .iter()
            .map(|p| {
                script
                    .known_players
                    .get(&p.playfab_id)
                    .cloned()
                    .unwrap_or_else(|| ValidatedPlayer::new(&p.playfab_id, &p.display_name))
            })
            .collect())
    }

    async fn action(
        &self,
        action: PlayerAction,
        playfab_id: &str,
        parameters: &ActionParameters,
    ) -> Result<String, BackendError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.lock();
        script.calls.push(BackendCall::Action {
            action,
            playfab_id: playfab_id.to_string(),
            parameters: parameters.clone(),
        });
        match script.action_responses.pop_front() {
            Some(Ok(command)) => Ok(command),
            Some(Err(reason)) => Err(BackendError::Request(reason)),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chiv_core::WantedLevel;

    fn connected(id: &str, name: &str) -> ConnectedPlayer {
        ConnectedPlayer {
            display_name: name.to_string(),
            playfab_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_validate_enriches_known_players_and_echoes_others() {
        // Arrange
        let mut wanted = ValidatedPlayer::new("ID-W", "villain");
        wanted.wanted_level = WantedLevel::Wanted;
        let backend = MockBackend::new().with_known_player(wanted);

        // Act
        let players = backend
            .validate("srv", &[connected("ID-W", "villain"), connected("ID-X", "x")])
            .await
            .unwrap();

        // Assert
        assert_eq!(players[0].wanted_level, WantedLevel::Wanted);
        assert_eq!(players[1].wanted_level, WantedLevel::None);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_action_responses_are_consumed_in_order() {
        let backend = MockBackend::new();
        backend.push_action_response(Ok("first".to_string()));
        backend.push_action_response(Err("denied".to_string()));

        let none = ActionParameters::none();
        let first = backend.action(PlayerAction::Ban, "A", &none).await;
        let second = backend.action(PlayerAction::Ban, "A", &none).await;
        let third = backend.action(PlayerAction::Ban, "A", &none).await;

        assert_eq!(first.unwrap(), "first");
        assert!(matches!(second, Err(BackendError::Request(_))));
        assert_eq!(third.unwrap(), "");
        assert_eq!(backend.action_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_validation_failure_can_be_toggled() {
        let backend = MockBackend::new();
        backend.fail_validation("offline");
        assert!(backend.validate("srv", &[]).await.is_err());

        backend.succeed_validation();
        assert!(backend.validate("srv", &[]).await.is_ok());
    }
}
