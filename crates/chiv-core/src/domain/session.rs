//! SessionState: the active roster and the local trust set.
//!
//! The session is the only place players can be addressed by number. Console
//! commands say `kick 3`; the `3` means "the fourth row of the table that was
//! printed after the most recent successful validation".
//!
//! # Roster generations
//!
//! ```text
//! validate ok ──► replace_roster(R1)   generation 1, indices 0..len(R1)
//! validate ok ──► replace_roster(R2)   generation 2, every R1 index is stale
//! validate err     (no call)           generation stays 2, R2 untouched
//! ```
//!
//! The whole list is swapped in one assignment, so an index lookup always
//! observes exactly one generation.
//!
//! # Ownership
//!
//! The session is owned by the event loop and touched from that task only,
//! which is why it carries no locks.

use std::collections::HashSet;

use thiserror::Error;

use super::player::{ValidatedPlayer, WantedLevel};

/// Errors produced by roster lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The index does not address a player of the current roster.
    #[error("no player with number {index} (roster has {len} players)")]
    NoSuchIndex { index: usize, len: usize },
}

/// Authoritative view of the last validated roster.
#[derive(Debug, Default)]
pub struct SessionState {
    roster: Vec<ValidatedPlayer>,
    server_name: Option<String>,
    /// Ids trusted during this run. Never shrinks.
    trusted: HashSet<String>,
    generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swaps in a freshly validated roster.
    ///
    /// Players are sorted by display name (byte-wise, case-sensitive) before
    /// they are indexed. Every index handed out for the previous roster is
    /// invalid afterwards.
    pub fn replace_roster(
        &mut self,
        server_name: impl Into<String>,
        mut players: Vec<ValidatedPlayer>,
    ) -> &[ValidatedPlayer] {
        players.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        self.roster = players;
        self.server_name = Some(server_name.into());
        self.generation += 1;
        &self.roster
    }

    /// Returns the player at `index` in the current roster.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoSuchIndex`] when `index` is out of bounds,
    /// including every index while no roster has been validated yet.
    pub fn get(&self, index: usize) -> Result<&ValidatedPlayer, SessionError> {
        self.roster.get(index).ok_or(SessionError::NoSuchIndex {
            index,
            len: self.roster.len(),
        })
    }

    /// Records `playfab_id` as trusted for the rest of the process lifetime.
    ///
    /// Returns `false` if the id was already trusted.
    pub fn trust(&mut self, playfab_id: impl Into<String>) -> bool {
        self.trusted.insert(playfab_id.into())
    }

    pub fn is_trusted(&self, playfab_id: &str) -> bool {
        self.trusted.contains(playfab_id)
    }

    /// Whether the client must hide the server's classification of a player.
    ///
    /// Only `Suspicious` can be overridden locally; `Wanted` always shows.
    pub fn is_suppressed(&self, playfab_id: &str, wanted_level: WantedLevel) -> bool {
        wanted_level == WantedLevel::Suspicious && self.is_trusted(playfab_id)
    }

    /// The active roster as it should be displayed.
    ///
    /// Players covered by the trust override get their wanted level and ban
    /// command cleared; everything else is passed through unchanged.
    pub fn display_roster(&self) -> Vec<ValidatedPlayer> {
        self.roster
            .iter()
            .map(|player| {
                let mut shown = player.clone();
                if self.is_suppressed(&player.playfab_id, player.wanted_level) {
                    shown.wanted_level = WantedLevel::None;
                    shown.ban_command.clear();
                }
                shown
            })
            .collect()
    }

    /// The active roster, sorted and unmodified.
    pub fn roster(&self) -> &[ValidatedPlayer] {
        &self.roster
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Number of successful roster replacements so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trusted_count(&self) -> usize {
        self.trusted.len()
    }
}
