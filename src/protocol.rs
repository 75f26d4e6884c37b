use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::models::{GameOverView, GameView, ParticipantSummary, Placement, PlayerId, TileId};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom { name: String },
    JoinRoom { code: String, name: String },
    StartGame,
    Play { placements: Vec<Placement> },
    Exchange { tile_ids: Vec<TileId> },
    Pass,
    Reconnect { code: String, player_id: PlayerId },
    Leave,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        code: String,
        player_id: PlayerId,
    },
    RoomJoined {
        code: String,
        player_id: PlayerId,
        participants: Vec<ParticipantSummary>,
    },
    ParticipantJoined {
        participant: ParticipantSummary,
    },
    ParticipantLeft {
        player_id: PlayerId,
    },
    ParticipantDisconnected {
        player_id: PlayerId,
    },
    ParticipantReconnected {
        player_id: PlayerId,
    },
    Reconnected {
        code: String,
        player_id: PlayerId,
    },
    State {
        view: Box<GameView>,
    },
    GameOver {
        result: Box<GameOverView>,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl From<&GameError> for ServerMessage {
    fn from(error: &GameError) -> Self {
        ServerMessage::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, GameError> {
        serde_json::from_str(text).map_err(|e| GameError::BadRequest(e.to_string()))
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialise server message");
            r#"{"type":"error","kind":"internal","message":"serialisation failed"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_with_optional_assignment() {
        let text = r#"{"type":"play","placements":[
            {"tile_id":3,"row":7,"col":7},
            {"tile_id":9,"row":7,"col":8,"assigned":"が"}]}"#;
        let message = ClientMessage::parse(text).unwrap();
        assert_eq!(
            message,
            ClientMessage::Play {
                placements: vec![Placement::new(3, 7, 7), Placement::new(9, 7, 8).assigned("が")]
            }
        );
    }

    #[test]
    fn test_parse_reconnect_and_unit_variants() {
        let message = ClientMessage::parse(r#"{"type":"reconnect","code":"ABCD","player_id":"p1"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::Reconnect {
                code: "ABCD".to_string(),
                player_id: PlayerId::from("p1")
            }
        );
        assert_eq!(ClientMessage::parse(r#"{"type":"pass"}"#).unwrap(), ClientMessage::Pass);
    }

    #[test]
    fn test_malformed_frame_is_bad_request() {
        let err = ClientMessage::parse(r#"{"type":"teleport"}"#).unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }

    #[test]
    fn test_error_message_shape() {
        let json = ServerMessage::from(&GameError::NotYourTurn).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["kind"], "not_your_turn");
    }
}
