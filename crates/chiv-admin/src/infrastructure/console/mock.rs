//! Recording presenter for tests.

use std::sync::{Arc, Mutex};

use chiv_core::ValidatedPlayer;

use crate::application::dispatch_command::CommandOutput;
use crate::application::event_loop::Presenter;

/// Everything a [`RecordingPresenter`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Roster {
        server_name: String,
        players: Vec<ValidatedPlayer>,
    },
    Output(CommandOutput),
    Error(String),
    Notice(String),
}

/// [`Presenter`] that stores every call. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().expect("lock poisoned").clone()
    }

    /// The most recently rendered roster, if any.
    pub fn last_roster(&self) -> Option<Vec<ValidatedPlayer>> {
        self.shown().into_iter().rev().find_map(|s| match s {
            Shown::Roster { players, .. } => Some(players),
            _ => None,
        })
    }

    pub fn outputs(&self) -> Vec<CommandOutput> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Output(output) => Some(output),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, shown: Shown) {
        self.shown.lock().expect("lock poisoned").push(shown);
    }
}

impl Presenter for RecordingPresenter {
    fn render_roster(&self, server_name: &str, players: &[ValidatedPlayer]) {
        self.record(Shown::Roster {
            server_name: server_name.to_string(),
            players: players.to_vec(),
        });
    }

    fn show_output(&self, output: &CommandOutput) {
        self.record(Shown::Output(output.clone()));
    }

    fn report_error(&self, message: &str) {
        self.record(Shown::Error(message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.record(Shown::Notice(message.to_string()));
    }
}
