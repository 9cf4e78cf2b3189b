//! Player records and moderation actions.
//!
//! Two shapes of player exist during one validation round trip:
//!
//! ```text
//! clipboard text ──► ConnectedPlayer (name + id, straight from the game)
//!                         │  validate
//!                         ▼
//!                    ValidatedPlayer (enriched by the backend)
//! ```
//!
//! The wire names match the JSON the validation backend speaks, so these types
//! are serialized directly into request bodies and deserialized from responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Playfab id the game reports for an unoccupied slot or a bot.
pub const NULL_PLAYFAB_ID: &str = "NULL";

/// A player as reported by one `listplayers` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPlayer {
    /// Name shown in game. May contain the roster delimiter itself.
    pub display_name: String,
    /// Stable external identity.
    pub playfab_id: String,
}

/// Server name plus the occupied slots of one `listplayers` run.
///
/// Lives only for the duration of a single validate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub server_name: String,
    pub players: Vec<ConnectedPlayer>,
}

/// Platform the account was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "console")]
    Console,
    #[serde(rename = "PC")]
    Pc,
    /// Also absorbs any platform string this build does not know.
    #[default]
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl Platform {
    /// Single-character marker used in the roster table.
    pub fn glyph(self) -> char {
        match self {
            Platform::Unknown => 'X',
            Platform::Console => 'G',
            Platform::Pc => ' ',
        }
    }
}

/// Server-assigned classification of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WantedLevel {
    #[serde(rename = "suspicious")]
    Suspicious,
    #[serde(rename = "wanted")]
    Wanted,
    /// Nothing on record. The backend sends an empty string; unknown levels
    /// land here too. `other` must stay on the last variant.
    #[default]
    #[serde(rename = "", alias = "none", other)]
    None,
}

/// A player record enriched by the validation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPlayer {
    pub playfab_id: String,
    pub display_name: String,
    /// Previously seen names, in the order the server reported them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    /// Unix epoch when the backend sends no timestamp.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: Platform,
    /// Pre-written in-game ban command; empty when there is none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ban_command: String,
    /// Reasons this player is on the wanted board; empty when there are none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub wanted_for: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wanted_level: WantedLevel,
}

impl ValidatedPlayer {
    /// Builds a record with no history: no aliases, unknown platform, nothing
    /// on record.
    pub fn new(playfab_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            playfab_id: playfab_id.into(),
            display_name: display_name.into(),
            aliases: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            platform: Platform::Unknown,
            ban_command: String::new(),
            wanted_for: Vec::new(),
            wanted_level: WantedLevel::None,
        }
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Moderation actions the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerAction {
    Ban,
    Unban,
    Trust,
}

impl PlayerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerAction::Ban => "ban",
            PlayerAction::Unban => "unban",
            PlayerAction::Trust => "trust",
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action-specific parameters sent alongside a [`PlayerAction`].
///
/// Serializes to `{}` when empty and `{"charges": [...]}` for bans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParameters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<String>,
}

impl ActionParameters {
    /// No parameters.
    pub fn none() -> Self {
        Self::default()
    }

    /// Ban parameters carrying the operator's reasons.
    pub fn charges(charges: Vec<String>) -> Self {
        Self { charges }
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }
}
