use crate::models::TileId;

/// Every way a single intent can be refused. None of these mutate state and none
/// are fatal to the room that raised them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("no tiles were placed")]
    EmptyPlacement,

    #[error("tile {0} is not in your rack")]
    TileNotInRack(TileId),

    #[error("tile {0} was placed more than once")]
    DuplicateTile(TileId),

    #[error("cell ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("blank tile {0} needs an assigned letter")]
    BlankUnassigned(TileId),

    #[error("'{0}' is not a playable letter")]
    UnknownLetter(String),

    #[error("'{assigned}' is not a variant of '{base}'")]
    InvalidVariant { base: String, assigned: String },

    #[error("tiles must share a single row or column")]
    NotCollinear,

    #[error("tiles must form a continuous line")]
    Gap,

    #[error("the first word must cover the centre square")]
    FirstMoveOffCenter,

    #[error("the first word needs at least two tiles")]
    FirstMoveTooShort,

    #[error("tiles must touch a tile already on the board")]
    NotAdjacent,

    #[error("a single tile does not form a word")]
    LoneTile,

    #[error("'{0}' is not in the word list")]
    UnknownWord(String),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("the game is not in progress")]
    NotPlaying,

    #[error("at least two participants are needed to start")]
    TooFewParticipants,

    #[error("only the room creator can start the game")]
    NotCreator,

    #[error("no tiles were named for exchange")]
    EmptyExchange,

    #[error("cannot exchange {requested} tiles, only {remaining} left in the pool")]
    InsufficientPool { requested: usize, remaining: usize },

    #[error("room {0} does not exist")]
    RoomNotFound(String),

    #[error("room is full")]
    RoomFull,

    #[error("game has already started")]
    AlreadyStarted,

    #[error("participant is not part of this room")]
    UnknownParticipant,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl GameError {
    /// Stable identifier sent to clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::EmptyPlacement => "empty_placement",
            GameError::TileNotInRack(_) => "tile_not_in_rack",
            GameError::DuplicateTile(_) => "duplicate_tile",
            GameError::OutOfBounds { .. } => "out_of_bounds",
            GameError::CellOccupied { .. } => "cell_occupied",
            GameError::BlankUnassigned(_) => "blank_unassigned",
            GameError::UnknownLetter(_) => "unknown_letter",
            GameError::InvalidVariant { .. } => "invalid_variant",
            GameError::NotCollinear => "not_collinear",
            GameError::Gap => "gap",
            GameError::FirstMoveOffCenter => "first_move_off_center",
            GameError::FirstMoveTooShort => "first_move_too_short",
            GameError::NotAdjacent => "not_adjacent",
            GameError::LoneTile => "lone_tile",
            GameError::UnknownWord(_) => "unknown_word",
            GameError::NotYourTurn => "not_your_turn",
            GameError::NotPlaying => "not_playing",
            GameError::TooFewParticipants => "too_few_participants",
            GameError::NotCreator => "not_creator",
            GameError::EmptyExchange => "empty_exchange",
            GameError::InsufficientPool { .. } => "insufficient_pool",
            GameError::RoomNotFound(_) => "room_not_found",
            GameError::RoomFull => "room_full",
            GameError::AlreadyStarted => "already_started",
            GameError::UnknownParticipant => "unknown_participant",
            GameError::BadRequest(_) => "bad_request",
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR '{0}'")]
    BindAddr(String),

    #[error("could not load word list from {path}: {source}")]
    Dictionary {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable_for_wire() {
        assert_eq!(GameError::NotYourTurn.kind(), "not_your_turn");
        assert_eq!(
            GameError::InsufficientPool {
                requested: 3,
                remaining: 1
            }
            .kind(),
            "insufficient_pool"
        );
    }

    #[test]
    fn test_unknown_word_names_the_word() {
        let err = GameError::UnknownWord("ねこね".to_string());
        assert!(err.to_string().contains("ねこね"));
    }
}
