//! Parser for the game's `listplayers` output.
//!
//! The game copies a text block like this to the clipboard:
//!
//! ```text
//! ServerName - Foo's Server (EU) - 12/64
//! Name - PlayFabID - EOSID - Score - Kills - Deaths
//! Sir Lancelot - 6D1F3A0B2C4E5F60 - 000a1b2c - 120 - 4 - 2
//! A - B - 7E2A4B1C3D5F6071 - 000d4e5f - 80 - 2 - 3
//! Bot 3 - NULL - NULL - 0 - 0 - 0
//! ```
//!
//! Line 1 carries the server name between the first delimiter and the last
//! space; line 2 is a column header. Every following line is a record whose
//! last five fields are fixed metadata. Anything before those five fields is
//! the display name, rejoined with the delimiter, which is how a player named
//! `A - B` survives the split.

use thiserror::Error;
use tracing::debug;

use crate::domain::player::{ConnectedPlayer, RosterSnapshot, NULL_PLAYFAB_ID};

/// Field separator used on every line of the roster.
pub const DELIMITER: &str = " - ";

/// Prefix that marks clipboard text as `listplayers` output.
pub const ROSTER_MARKER: &str = "ServerName - ";

/// Number of trailing metadata fields on each player record.
const METADATA_FIELDS: usize = 5;

/// Errors produced while parsing roster text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterParseError {
    /// The text contained nothing to parse.
    #[error("roster text is empty")]
    Empty,

    /// Line 1 lacks the delimiter or the trailing space around the server name.
    #[error("malformed roster header: {0:?}")]
    MalformedHeader(String),

    /// A player record has fewer fields than the fixed metadata requires.
    #[error("malformed player record on line {line}: expected at least {expected} fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Returns `true` if `text` looks like `listplayers` output.
pub fn is_roster_text(text: &str) -> bool {
    text.starts_with(ROSTER_MARKER)
}

/// Parses one clipboard payload into a server name and its occupied slots.
///
/// Players are returned in file order. Records whose playfab id is `NULL`
/// (bots and empty slots) are dropped.
///
/// # Errors
///
/// - [`RosterParseError::Empty`] if `text` has no content.
/// - [`RosterParseError::MalformedHeader`] if the server name cannot be cut
///   out of line 1.
/// - [`RosterParseError::MalformedRecord`] if a record is too short to hold
///   a name plus the metadata fields.
pub fn parse_roster(text: &str) -> Result<RosterSnapshot, RosterParseError> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines = normalized.split('\n');

    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(RosterParseError::Empty),
    };
    let server_name = parse_server_name(header)?;

    // Line 2 is the column header.
    let records = lines.skip(1);

    let mut players = Vec::new();
    let mut empty_slots = 0usize;
    for (offset, line) in records.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() <= METADATA_FIELDS {
            return Err(RosterParseError::MalformedRecord {
                line: offset + 3,
                expected: METADATA_FIELDS + 1,
                found: fields.len(),
            });
        }
        let name_fields = fields.len() - METADATA_FIELDS;
        let playfab_id = fields[name_fields];
        if playfab_id == NULL_PLAYFAB_ID {
            empty_slots += 1;
            continue;
        }
        players.push(ConnectedPlayer {
            display_name: fields[..name_fields].join(DELIMITER),
            playfab_id: playfab_id.to_string(),
        });
    }

    debug!(
        server = %server_name,
        players = players.len(),
        empty_slots,
        "parsed roster"
    );

    Ok(RosterSnapshot {
        server_name,
        players,
    })
}

/// Cuts the server name out of the first roster line.
///
/// The name sits between the first delimiter and the last space. When the
/// trailer is itself joined with the delimiter (`... - 12/64`), the dangling
/// `" -"` left after the cut is removed as well.
fn parse_server_name(header: &str) -> Result<String, RosterParseError> {
    let malformed = || RosterParseError::MalformedHeader(header.to_string());

    let start = header.find(DELIMITER).ok_or_else(malformed)? + DELIMITER.len();
    let end = header.rfind(' ').ok_or_else(malformed)?;
    if end < start {
        return Err(malformed());
    }

    let cut = &header[start..end];
    let name = cut.strip_suffix(DELIMITER.trim_end()).unwrap_or(cut);
    Ok(name.to_string())
}
