//! Grammar of the operator's console commands.
//!
//! One command per line, tokens separated by ASCII whitespace:
//!
//! | Command                          | Meaning                                    |
//! |----------------------------------|--------------------------------------------|
//! | `kick <nr>`                      | One-off kick of roster player `nr`         |
//! | `ban <nr> <reason>...`           | Global ban of roster player `nr`           |
//! | `banbyid <playfabId> <reason>...`| Global ban of a player not in the roster   |
//! | `unbanbyid <playfabId>`          | Lift a global ban                          |
//! | `trust <nr>`                     | Stop flagging roster player `nr`           |
//!
//! Parsing is purely syntactic. Whether `nr` addresses a player is decided
//! later against the current [`crate::SessionState`].

use thiserror::Error;

/// A syntactically valid console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Kick { index: usize },
    Ban { index: usize, charges: Vec<String> },
    BanById { playfab_id: String, charges: Vec<String> },
    UnbanById { playfab_id: String },
    Trust { index: usize },
}

/// Reasons a console line is rejected before any lookup or network call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("command not recognized: {0:?} (expected kick, ban, banbyid, unbanbyid or trust)")]
    UnrecognizedCommand(String),

    #[error("{command} requires {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid player number: {token:?}")]
    InvalidIndex { token: String },

    #[error("{command} takes no further arguments, got {extra:?}")]
    UnexpectedArguments {
        command: &'static str,
        extra: Vec<String>,
    },
}

impl Command {
    /// Parses one console line.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] naming the first rule the line breaks.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_ascii_whitespace();
        let action = tokens.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        match action {
            "kick" => {
                let index = single_index("kick", &args)?;
                Ok(Command::Kick { index })
            }
            "trust" => {
                let index = single_index("trust", &args)?;
                Ok(Command::Trust { index })
            }
            "ban" => {
                let token = args.first().ok_or(CommandError::MissingArgument {
                    command: "ban",
                    argument: "a player number",
                })?;
                let index = parse_index(token)?;
                let charges = charges("ban", &args[1..])?;
                Ok(Command::Ban { index, charges })
            }
            "banbyid" => {
                let playfab_id = args.first().ok_or(CommandError::MissingArgument {
                    command: "banbyid",
                    argument: "a playfab id",
                })?;
                let charges = charges("banbyid", &args[1..])?;
                Ok(Command::BanById {
                    playfab_id: playfab_id.to_string(),
                    charges,
                })
            }
            "unbanbyid" => {
                let (playfab_id, rest) = args.split_first().ok_or(CommandError::MissingArgument {
                    command: "unbanbyid",
                    argument: "a playfab id",
                })?;
                reject_extra("unbanbyid", rest)?;
                Ok(Command::UnbanById {
                    playfab_id: playfab_id.to_string(),
                })
            }
            other => Err(CommandError::UnrecognizedCommand(other.to_string())),
        }
    }

    /// The action name as typed by the operator.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Kick { .. } => "kick",
            Command::Ban { .. } => "ban",
            Command::BanById { .. } => "banbyid",
            Command::UnbanById { .. } => "unbanbyid",
            Command::Trust { .. } => "trust",
        }
    }
}

fn single_index(command: &'static str, args: &[&str]) -> Result<usize, CommandError> {
    let (token, rest) = args.split_first().ok_or(CommandError::MissingArgument {
        command,
        argument: "a player number",
    })?;
    let index = parse_index(token)?;
    reject_extra(command, rest)?;
    Ok(index)
}

fn parse_index(token: &str) -> Result<usize, CommandError> {
    token.parse::<usize>().map_err(|_| CommandError::InvalidIndex {
        token: token.to_string(),
    })
}

fn charges(command: &'static str, reasons: &[&str]) -> Result<Vec<String>, CommandError> {
    if reasons.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "at least 1 reason",
        });
    }
    Ok(reasons.iter().map(|r| r.to_string()).collect())
}

fn reject_extra(command: &'static str, rest: &[&str]) -> Result<(), CommandError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnexpectedArguments {
            command,
            extra: rest.iter().map(|s| s.to_string()).collect(),
        })
    }
}
