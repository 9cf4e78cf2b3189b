//! EventLoop: the single consumer of clipboard and console events.
//!
//! # State machine
//!
//! ```text
//!          run()            shutdown signal
//! Idle ──────────► Running ───────────────────► Draining ──► Stopped
//!                    ▲  │                      (in-flight call gets
//!                    └──┘                       the grace period)
//!     clipboard / console event (errors are reported, never fatal)
//! ```
//!
//! The current state is published on a `watch` channel
//! ([`EventLoop::watch_state`]) so it can be observed while `run` holds the
//! loop.
//!
//! Both producers feed bounded channels. The loop waits on both channels and
//! the shutdown signal at once; whichever is ready first wins, with no
//! priority between the two sources. Each event is handled to completion
//! (including its backend round trip) before the next one is taken, so the
//! session is only ever touched from this task.
//!
//! If shutdown arrives while an event is in flight, the call gets a short
//! grace period to settle and is abandoned afterwards.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chiv_core::{is_roster_text, parse_roster, RosterParseError, SessionState, ValidatedPlayer};
use thiserror::Error;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::backend::{BackendClient, BackendError};
use super::dispatch_command::{CommandDispatcher, CommandOutput};
use super::shutdown::ShutdownSignal;

/// Default time an in-flight backend call may take after shutdown was requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, `run` not called yet.
    Idle,
    Running,
    /// Shutdown requested; no new events are accepted.
    Draining,
    Stopped,
}

/// Renders roster tables and command results for the operator.
pub trait Presenter: Send + Sync {
    /// Shows a freshly validated roster, already sorted and with the local
    /// trust override applied.
    fn render_roster(&self, server_name: &str, players: &[ValidatedPlayer]);

    fn show_output(&self, output: &CommandOutput);

    /// Shows a one-line explanation of a rejected command or failed refresh.
    fn report_error(&self, message: &str);

    /// Informational line that is neither a result nor an error.
    fn notice(&self, message: &str);
}

/// Optional destination for operator commands (the system clipboard).
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Why a clipboard event did not produce a new roster.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("could not read player list: {0}")]
    Parse(#[from] RosterParseError),

    #[error("player validation failed: {0}")]
    Transport(#[from] BackendError),
}

enum LoopEvent {
    Clipboard(String),
    Console(String),
}

/// Owns the session and serializes every state transition.
pub struct EventLoop {
    session: SessionState,
    backend: Arc<dyn BackendClient>,
    dispatcher: CommandDispatcher,
    presenter: Arc<dyn Presenter>,
    clipboard: Option<Arc<dyn ClipboardSink>>,
    grace: Duration,
    state: watch::Sender<LoopState>,
}

impl EventLoop {
    pub fn new(backend: Arc<dyn BackendClient>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            session: SessionState::new(),
            dispatcher: CommandDispatcher::new(Arc::clone(&backend)),
            backend,
            presenter,
            clipboard: None,
            grace: DEFAULT_SHUTDOWN_GRACE,
            state: watch::Sender::new(LoopState::Idle),
        }
    }

    /// Copies every non-empty operator command to `sink` after it is shown.
    pub fn with_clipboard_sink(mut self, sink: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = Some(sink);
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Receiver that sees every state transition, including those made while
    /// `run` is executing.
    pub fn watch_state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Consumes events until `shutdown` is triggered.
    ///
    /// A closed source is simply no longer selected; only the shutdown signal
    /// ends the loop.
    pub async fn run(
        &mut self,
        mut clipboard_rx: Receiver<String>,
        mut console_rx: Receiver<String>,
        shutdown: ShutdownSignal,
    ) {
        let state = self.state.clone();
        state.send_replace(LoopState::Running);
        info!("event loop running");

        let grace = self.grace;
        let mut clipboard_open = true;
        let mut console_open = true;

        loop {
            let event = tokio::select! {
                () = shutdown.triggered() => break,
                text = clipboard_rx.recv(), if clipboard_open => match text {
                    Some(text) => LoopEvent::Clipboard(text),
                    None => {
                        debug!("clipboard source closed");
                        clipboard_open = false;
                        continue;
                    }
                },
                line = console_rx.recv(), if console_open => match line {
                    Some(line) => LoopEvent::Console(line),
                    None => {
                        debug!("console source closed");
                        console_open = false;
                        continue;
                    }
                },
            };

            if shutdown.is_triggered() {
                debug!("discarding event received after shutdown");
                break;
            }

            let interrupted = {
                let work = self.handle_event(event);
                tokio::pin!(work);
                tokio::select! {
                    () = &mut work => false,
                    () = shutdown.triggered() => {
                        state.send_replace(LoopState::Draining);
                        info!("event loop draining");
                        if tokio::time::timeout(grace, &mut work).await.is_err() {
                            warn!(?grace, "abandoning in-flight event at shutdown");
                        }
                        true
                    }
                }
            };
            if interrupted {
                break;
            }
        }

        if state.send_replace(LoopState::Draining) != LoopState::Draining {
            info!("event loop draining");
        }
        clipboard_rx.close();
        console_rx.close();

        state.send_replace(LoopState::Stopped);
        info!("event loop stopped");
    }

    async fn handle_event(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Clipboard(text) => self.on_clipboard(&text).await,
            LoopEvent::Console(line) => self.on_console(&line).await,
        }
    }

    async fn on_clipboard(&mut self, text: &str) {
        if !is_roster_text(text) {
            trace!("clipboard change is not roster output");
            return;
        }
        if let Err(e) = self.refresh_roster(text).await {
            warn!(error = %e, "roster refresh failed; keeping previous roster");
            self.presenter.report_error(&e.to_string());
        }
    }

    /// Parses, validates, and swaps in a new roster.
    ///
    /// The session is only touched after the backend answered successfully.
    async fn refresh_roster(&mut self, text: &str) -> Result<(), RefreshError> {
        let snapshot = parse_roster(text)?;
        info!(
            server = %snapshot.server_name,
            players = snapshot.players.len(),
            "validating roster"
        );

        let validated = self
            .backend
            .validate(&snapshot.server_name, &snapshot.players)
            .await?;

        self.session.replace_roster(snapshot.server_name, validated);
        debug!(
            generation = self.session.generation(),
            players = self.session.len(),
            "roster replaced"
        );

        let shown = self.session.display_roster();
        self.presenter
            .render_roster(self.session.server_name().unwrap_or_default(), &shown);
        Ok(())
    }

    async fn on_console(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match self.dispatcher.dispatch(line, &mut self.session).await {
            Ok(output) => {
                self.presenter.show_output(&output);
                if let (Some(sink), CommandOutput::OperatorCommand(command)) =
                    (&self.clipboard, &output)
                {
                    if !command.is_empty() {
                        if let Err(e) = sink.write_text(command).await {
                            warn!(error = %e, "could not copy command to clipboard");
                        }
                    }
                }
            }
            Err(e) => {
                warn!(line, error = %e, "command rejected");
                self.presenter.report_error(&e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chiv_core::{ActionParameters, ConnectedPlayer, PlayerAction};
    use tokio::sync::mpsc;

    const ROSTER: &str = "ServerName - Test Server - 2/64\n\
                          Name - PlayFabID - EOSID - Score - Kills - Deaths\n\
                          bob - ID-B - e - 0 - 0 - 0\n\
                          alice - ID-A - e - 0 - 0 - 0\n";

    /// Echoes connected players back, or fails every call.
    struct EchoBackend {
        fail: bool,
    }

    #[async_trait]
    impl BackendClient for EchoBackend {
        async fn validate(
            &self,
            _server_name: &str,
            players: &[ConnectedPlayer],
        ) -> Result<Vec<ValidatedPlayer>, BackendError> {
            if self.fail {
                return Err(BackendError::Request("offline".to_string()));
            }
            Ok(players
                .iter()
                .map(|p| ValidatedPlayer::new(p.playfab_id.clone(), p.display_name.clone()))
                .collect())
        }

        async fn action(
            &self,
            _action: PlayerAction,
            _playfab_id: &str,
            _parameters: &ActionParameters,
        ) -> Result<String, BackendError> {
            Err(BackendError::Request("offline".to_string()))
        }
    }

    #[derive(Default)]
    struct CollectingPresenter {
        rosters: Mutex<Vec<Vec<String>>>,
        errors: Mutex<Vec<String>>,
    }

    impl Presenter for CollectingPresenter {
        fn render_roster(&self, _server_name: &str, players: &[ValidatedPlayer]) {
            let names = players.iter().map(|p| p.display_name.clone()).collect();
            self.rosters.lock().unwrap().push(names);
        }

        fn show_output(&self, _output: &CommandOutput) {}

        fn report_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }

        fn notice(&self, _message: &str) {}
    }

    fn make_loop(fail: bool) -> (EventLoop, Arc<CollectingPresenter>) {
        let presenter = Arc::new(CollectingPresenter::default());
        let event_loop = EventLoop::new(Arc::new(EchoBackend { fail }), presenter.clone());
        (event_loop, presenter)
    }

    #[test]
    fn test_new_loop_is_idle() {
        let (event_loop, _) = make_loop(false);
        assert_eq!(event_loop.state(), LoopState::Idle);
        assert!(event_loop.session().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_roster_sorts_and_renders() {
        // Arrange
        let (mut event_loop, presenter) = make_loop(false);

        // Act
        event_loop.on_clipboard(ROSTER).await;

        // Assert
        assert_eq!(event_loop.session().generation(), 1);
        assert_eq!(event_loop.session().get(0).unwrap().playfab_id, "ID-A");
        assert_eq!(
            presenter.rosters.lock().unwrap().as_slice(),
            &[vec!["alice".to_string(), "bob".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_non_roster_clipboard_text_is_ignored() {
        let (mut event_loop, presenter) = make_loop(false);

        event_loop.on_clipboard("just some copied text").await;

        assert_eq!(event_loop.session().generation(), 0);
        assert!(presenter.rosters.lock().unwrap().is_empty());
        assert!(presenter.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_validation_keeps_previous_roster() {
        // Arrange – seed a roster, then make the backend fail
        let (mut event_loop, presenter) = make_loop(false);
        event_loop.on_clipboard(ROSTER).await;
        event_loop.backend = Arc::new(EchoBackend { fail: true });

        // Act
        event_loop.on_clipboard(ROSTER).await;

        // Assert
        assert_eq!(event_loop.session().generation(), 1);
        assert_eq!(event_loop.session().len(), 2);
        let errors = presenter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("player validation failed"));
    }

    #[tokio::test]
    async fn test_malformed_roster_is_reported() {
        let (mut event_loop, presenter) = make_loop(false);

        event_loop.on_clipboard("ServerName - broken").await;

        let errors = presenter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("could not read player list"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_with_no_events() {
        // Arrange
        let (mut event_loop, _) = make_loop(false);
        let (_clip_tx, clip_rx) = mpsc::channel(4);
        let (_con_tx, con_rx) = mpsc::channel(4);
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        // Act
        event_loop.run(clip_rx, con_rx, shutdown).await;

        // Assert
        assert_eq!(event_loop.state(), LoopState::Stopped);
    }
}
