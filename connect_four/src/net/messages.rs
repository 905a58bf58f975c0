//! Wire events exchanged with connections.
//!
//! Every event is a JSON object whose `type` field names its kind. Inbound
//! text is decoded once, here, into [`ClientEvent`]; anything that does not
//! match a known shape is a protocol violation.

use super::errors::ProtocolError;
use crate::game::Player;
use crate::session::JoinCode;
use serde::{Deserialize, Deserializer, Serialize};

/// Events sent by a connection.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// First message. Without a `join` field it starts a new game.
    ///
    /// A present `join` always means joining, even when it is `null`:
    /// `Some(None)` is a join request for a code that cannot exist.
    Init {
        #[serde(
            default,
            deserialize_with = "present",
            skip_serializing_if = "Option::is_none"
        )]
        join: Option<Option<JoinCode>>,
    },
    /// Move attempt. Signed so that negative columns decode and are rejected
    /// as out of range rather than as malformed.
    Play { column: i64 },
}

/// Wraps a field that is present in the input, null or not, in `Some`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<JoinCode>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<JoinCode>::deserialize(deserializer).map(Some)
}

impl ClientEvent {
    /// Decode one inbound text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Name of the event kind, for logs and protocol errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::Init { .. } => "init",
            ClientEvent::Play { .. } => "play",
        }
    }
}

/// Events sent to a connection.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Reply to a successful start, carrying the code to share
    Init { join: JoinCode },
    /// Broadcast after every applied move
    Play {
        player: Player,
        row: usize,
        column: usize,
    },
    /// Broadcast once, right after the deciding play
    Win { player: Player },
    /// Broadcast once, right after the play that fills the board
    Draw,
    /// Sent to one connection only
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_start() {
        let event = ClientEvent::decode(r#"{"type":"init"}"#).unwrap();
        assert_eq!(event, ClientEvent::Init { join: None });
    }

    #[test]
    fn test_decode_join() {
        let event = ClientEvent::decode(r#"{"type":"init","join":"Ab12Cd34Ef56Gh78"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Init {
                join: Some(Some(JoinCode::from("Ab12Cd34Ef56Gh78")))
            }
        );
    }

    #[test]
    fn test_decode_null_join_is_still_a_join() {
        let event = ClientEvent::decode(r#"{"type":"init","join":null}"#).unwrap();
        assert_eq!(event, ClientEvent::Init { join: Some(None) });
    }

    #[test]
    fn test_decode_negative_column() {
        let event = ClientEvent::decode(r#"{"type":"play","column":-1}"#).unwrap();
        assert_eq!(event, ClientEvent::Play { column: -1 });
    }

    #[test]
    fn test_decode_play() {
        let event = ClientEvent::decode(r#"{"type":"play","column":3}"#).unwrap();
        assert_eq!(event, ClientEvent::Play { column: 3 });
        assert_eq!(event.kind(), "play");
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        for text in [
            "not json",
            r#"{"column":3}"#,
            r#"{"type":"play"}"#,
            r#"{"type":"play","column":1.5}"#,
            r#"{"type":"play","column":"three"}"#,
            r#"{"type":"resign"}"#,
            "[]",
        ] {
            assert!(
                matches!(ClientEvent::decode(text), Err(ProtocolError::Malformed(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_server_event_shapes() {
        let play = ServerEvent::Play {
            player: Player::Two,
            row: 1,
            column: 3,
        };
        assert_eq!(
            serde_json::to_value(&play).unwrap(),
            json!({"type": "play", "player": 2, "row": 1, "column": 3})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::Win {
                player: Player::One
            })
            .unwrap(),
            json!({"type": "win", "player": 1})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::Draw).unwrap(),
            json!({"type": "draw"})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::error("Game not found.")).unwrap(),
            json!({"type": "error", "message": "Game not found."})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::Init {
                join: JoinCode::from("abc")
            })
            .unwrap(),
            json!({"type": "init", "join": "abc"})
        );
    }
}
