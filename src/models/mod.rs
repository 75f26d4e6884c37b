use std::time::Duration;

mod board;
mod bonus;
mod player;
mod registry;
mod room;
mod scoring;
mod session;
mod tile;
mod tile_pool;
mod timer;
mod validator;

pub use board::{Axis, Board};
pub use bonus::{Bonus, BonusLayout, BONUS_LAYOUT};
pub use player::{Participant, ParticipantSummary, PlayerId, Rack};
pub use registry::RoomRegistry;
pub use room::{Outbox, Room, RoomEvent, RoomHandle};
pub use scoring::{score_turn, score_word, WordScore};
pub use session::{
    ForfeitOutcome, GameOverView, GameSession, GameView, Phase, TurnAction, TurnOutcome,
    TurnRecord,
};
pub use tile::{is_letter, is_variant, total_tile_count, Placement, Tile, TileId};
pub use tile_pool::TilePool;
pub use timer::Timer;
pub use validator::{FormedWord, PlacementValidator, WordCell};

pub const BOARD_SIZE: usize = 15;
pub const CENTER: usize = BOARD_SIZE / 2;
pub const RACK_CAPACITY: usize = 7;
pub const ALL_TILES_BONUS: u32 = 50;
pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 4;
pub const TURN_DURATION: Duration = Duration::from_secs(90);
pub const RECONNECT_GRACE: Duration = Duration::from_secs(30);
