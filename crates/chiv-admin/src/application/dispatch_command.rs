//! CommandDispatcher: turns one console line into an operator command.
//!
//! ```text
//! "ban 2 cheating"
//!   └─ Command::parse            -> Command::Ban { index: 2, charges }
//!   └─ SessionState::get(2)      -> playfab id of roster row 2
//!   └─ BackendClient::action     -> "banbyid 6D1F... 720 \"cheating\""
//! ```
//!
//! `kick` is answered locally. `trust` waits for the backend to accept the
//! action before the id enters the local trust set, so the local override
//! never claims a trust the server rejected.

use std::sync::Arc;

use chiv_core::{
    ActionParameters, Command, CommandError, PlayerAction, SessionError, SessionState,
};
use thiserror::Error;
use tracing::{debug, info};

use super::backend::{BackendClient, BackendError};

/// Shown after a successful `trust`.
pub const TRUST_PROPAGATION_NOTICE: &str =
    "This action may take up to 15 minutes to apply globally";

/// Why a console line did not produce any output.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    NoSuchIndex(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] BackendError),
}

/// Result of a successfully dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// A command for the operator to paste into the game console. May be empty
    /// when the backend had nothing to hand back.
    OperatorCommand(String),
    /// Informational text with nothing to paste.
    Notice(String),
}

/// Interprets console lines against the current session.
pub struct CommandDispatcher {
    backend: Arc<dyn BackendClient>,
}

impl CommandDispatcher {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    /// Parses and executes `line`.
    ///
    /// Only `trust` mutates `session`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Command`] for syntax errors.
    /// - [`DispatchError::NoSuchIndex`] when a player number is outside the
    ///   current roster.
    /// - [`DispatchError::Transport`] when the backend call fails.
    pub async fn dispatch(
        &self,
        line: &str,
        session: &mut SessionState,
    ) -> Result<CommandOutput, DispatchError> {
        let command = Command::parse(line)?;
        debug!(command = command.name(), generation = session.generation(), "dispatching");

        match command {
            Command::Kick { index } => {
                let player = session.get(index)?;
                Ok(CommandOutput::OperatorCommand(kick_command(&player.playfab_id)))
            }
            Command::Ban { index, charges } => {
                let playfab_id = session.get(index)?.playfab_id.clone();
                self.ban(&playfab_id, charges).await
            }
            Command::BanById { playfab_id, charges } => self.ban(&playfab_id, charges).await,
            Command::UnbanById { playfab_id } => {
                let output = self
                    .backend
                    .action(PlayerAction::Unban, &playfab_id, &ActionParameters::none())
                    .await?;
                Ok(CommandOutput::OperatorCommand(output))
            }
            Command::Trust { index } => {
                let playfab_id = session.get(index)?.playfab_id.clone();
                // The returned command is of no use to the operator.
                self.backend
                    .action(PlayerAction::Trust, &playfab_id, &ActionParameters::none())
                    .await?;
                if session.trust(playfab_id.clone()) {
                    info!(%playfab_id, "player trusted for this session");
                }
                Ok(CommandOutput::Notice(TRUST_PROPAGATION_NOTICE.to_string()))
            }
        }
    }

    async fn ban(
        &self,
        playfab_id: &str,
        charges: Vec<String>,
    ) -> Result<CommandOutput, DispatchError> {
        let output = self
            .backend
            .action(PlayerAction::Ban, playfab_id, &ActionParameters::charges(charges))
            .await?;
        Ok(CommandOutput::OperatorCommand(output))
    }
}

/// One-off kick command in the game's console syntax.
pub fn kick_command(playfab_id: &str) -> String {
    format!("kickbyid {playfab_id}")
}
