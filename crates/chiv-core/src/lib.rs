//! # chiv-core
//!
//! Platform-independent core of chiv-admin-helper: the player types exchanged
//! with the validation backend, the parser for the in-game `listplayers`
//! output, the session state that indexes the last validated roster, and the
//! grammar of the operator's console commands.
//!
//! This crate has zero dependencies on OS APIs, network sockets, or an async
//! runtime. Everything here is driven by the `chiv-admin` application crate.
//!
//! - **`domain`** – Player records, wanted levels, moderation actions, and the
//!   [`SessionState`] that owns the active roster plus the local trust set.
//! - **`roster`** – Turns one clipboard payload into a [`RosterSnapshot`].
//! - **`command`** – Parses one console line into a typed [`Command`].

pub mod command;
pub mod domain;
pub mod roster;

pub use command::{Command, CommandError};
pub use domain::player::{
    ActionParameters, ConnectedPlayer, Platform, PlayerAction, RosterSnapshot, ValidatedPlayer,
    WantedLevel,
};
pub use domain::session::{SessionError, SessionState};
pub use roster::{is_roster_text, parse_roster, RosterParseError};
