//! Terminal presenter.
//!
//! Roster rows look like
//!
//! ```text
//!  0)  6D1F00AA11223344  2021-06-14 09:30     alice (ally, al)
//!  1)  0BADC0DE00000000  2023-01-02 18:05  G  bob   ()
//! Wanted for: griefing
//! banbyid 0BADC0DE00000000 720 "griefing"
//! ```
//!
//! Suspicious players are shown black on orange, wanted players on red, and a
//! wanted player rings the terminal bell.

use std::fmt::Display;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use chiv_core::{ValidatedPlayer, WantedLevel};
use crossterm::style::{Color, Stylize};
use tracing::trace;

use crate::application::dispatch_command::CommandOutput;
use crate::application::event_loop::Presenter;

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

const ORANGE: Color = Color::Rgb {
    r: 0xFF,
    g: 0xA5,
    b: 0x00,
};

const BELL: &str = "\x07";

/// One player's block of output lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub lines: Vec<String>,
    pub wanted_level: WantedLevel,
}

/// Lays out `players` as numbered rows. The number is the index commands
/// refer to.
pub fn format_roster(players: &[ValidatedPlayer]) -> Vec<RosterRow> {
    let name_width = players
        .iter()
        .map(|p| p.display_name.chars().count())
        .max()
        .unwrap_or(0);

    players
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let mut lines = vec![format!(
                "{index:>2})  {id:<16}  {created}  {platform}  {name:<name_width$} ({aliases})",
                id = player.playfab_id,
                created = player.created_at.format(CREATED_AT_FORMAT),
                platform = player.platform.glyph(),
                name = player.display_name,
                aliases = player.aliases.join(", "),
            )];
            if !player.wanted_for.is_empty() {
                lines.push(format!("Wanted for: {}", player.wanted_for.join(", ")));
            }
            if !player.ban_command.is_empty() {
                lines.push(player.ban_command.clone());
            }
            RosterRow {
                lines,
                wanted_level: player.wanted_level,
            }
        })
        .collect()
}

/// Writes to stdout, or to any writer in tests.
pub struct ConsolePresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsolePresenter {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, text: impl Display) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            trace!(error = %e, "console write failed");
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render_roster(&self, server_name: &str, players: &[ValidatedPlayer]) {
        self.emit(format!("{server_name} ({} players)", players.len()).bold());

        let mut ring = false;
        for row in format_roster(players) {
            for line in row.lines {
                match row.wanted_level {
                    WantedLevel::None => self.emit(line),
                    WantedLevel::Suspicious => self.emit(line.on(ORANGE).with(Color::Black)),
                    WantedLevel::Wanted => self.emit(line.on(Color::Red)),
                }
            }
            ring |= row.wanted_level == WantedLevel::Wanted;
        }
        if ring {
            self.emit(BELL);
        }
        self.emit("");
    }

    fn show_output(&self, output: &CommandOutput) {
        match output {
            CommandOutput::OperatorCommand(command) if command.is_empty() => {
                self.emit("(the backend returned no command)".dark_grey())
            }
            CommandOutput::OperatorCommand(command) => self.emit(command.as_str().green()),
            CommandOutput::Notice(message) => self.emit(message),
        }
    }

    fn report_error(&self, message: &str) {
        self.emit(format!("error: {message}").red());
    }

    fn notice(&self, message: &str) {
        self.emit(message);
    }
}
