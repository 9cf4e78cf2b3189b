//! Integration tests for chiv-core.
//!
//! These tests drive the public API the way the application does: parse a
//! clipboard payload, turn the connected players into validated ones, swap
//! them into the session, and address them with console commands.

use chiv_core::{
    parse_roster, Command, ConnectedPlayer, SessionError, SessionState, ValidatedPlayer,
    WantedLevel,
};

/// Builds `listplayers` text with `occupied` real players and `empty` NULL slots.
fn listplayers(occupied: usize, empty: usize) -> String {
    let mut lines = vec![
        "ServerName - Integration Server - 0/64".to_string(),
        "Name - PlayFabID - EOSID - Score - Kills - Deaths".to_string(),
    ];
    for i in 0..occupied {
        lines.push(format!("player{i} - ID{i:04} - eos{i} - 0 - 0 - 0"));
        if i < empty {
            lines.push(format!("Bot {i} - NULL - NULL - 0 - 0 - 0"));
        }
    }
    for i in occupied..empty {
        lines.push(format!("Bot {i} - NULL - NULL - 0 - 0 - 0"));
    }
    lines.join("\r\n")
}

/// Stands in for the backend: echoes every connected player back.
fn validate_echo(players: &[ConnectedPlayer]) -> Vec<ValidatedPlayer> {
    players
        .iter()
        .map(|p| ValidatedPlayer::new(p.playfab_id.clone(), p.display_name.clone()))
        .collect()
}

#[test]
fn test_null_slots_never_leave_the_parser() {
    for (occupied, empty) in [(0, 0), (0, 5), (3, 0), (3, 3), (10, 2), (1, 7)] {
        let snapshot = parse_roster(&listplayers(occupied, empty)).expect("well-formed roster");

        assert_eq!(snapshot.players.len(), occupied, "k={occupied} m={empty}");
        assert!(snapshot.players.iter().all(|p| p.playfab_id != "NULL"));
    }
}

#[test]
fn test_end_to_end_example_from_game_output() {
    // Arrange
    let text = "ServerName - Foo's Server (EU) - 12/64\n\
                Name - PlayFabID - EOSID - Score - Kills - Deaths\n\
                Sir Lancelot - 6D1F3A0B2C4E5F60 - 000a1b2c - 120 - 4 - 2\n\
                Bot 3 - NULL - NULL - 0 - 0 - 0\n";

    // Act
    let snapshot = parse_roster(text).expect("parse");

    // Assert
    assert_eq!(snapshot.server_name, "Foo's Server (EU)");
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].playfab_id, "6D1F3A0B2C4E5F60");
}

#[test]
fn test_parsed_roster_is_addressable_after_validation() {
    // Arrange
    let snapshot = parse_roster(&listplayers(3, 1)).expect("parse");
    let mut session = SessionState::new();

    // Act
    session.replace_roster(snapshot.server_name.clone(), validate_echo(&snapshot.players));

    // Assert – every index inside the roster resolves, the next one does not
    for i in 0..3 {
        assert_eq!(session.get(i).unwrap().playfab_id, format!("ID{i:04}"));
    }
    assert_eq!(session.get(3), Err(SessionError::NoSuchIndex { index: 3, len: 3 }));
    assert_eq!(session.server_name(), Some("Integration Server"));
}

#[test]
fn test_trust_command_target_is_suppressed_in_display() {
    // Arrange
    let mut session = SessionState::new();
    let mut flagged = ValidatedPlayer::new("SUS1", "sneaky");
    flagged.wanted_level = WantedLevel::Suspicious;
    flagged.ban_command = "banbyid SUS1 24 \"suspicious\"".to_string();
    session.replace_roster("s", vec![flagged, ValidatedPlayer::new("OK1", "honest")]);

    // Act
    let Command::Trust { index } = Command::parse("trust 1").expect("parse") else {
        panic!("expected a trust command");
    };
    let id = session.get(index).expect("index 1 exists").playfab_id.clone();
    session.trust(id);

    // Assert – "honest" sorts first, so index 1 is "sneaky"
    let shown = session.display_roster();
    assert_eq!(shown[1].display_name, "sneaky");
    assert_eq!(shown[1].wanted_level, WantedLevel::None);
    assert!(shown[1].ban_command.is_empty());
}
