use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::tile::{Tile, TileId};

/// A participant's private hand, keyed by tile identity.
pub type Rack = BTreeMap<TileId, Tile>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        PlayerId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub rack: Rack,
}

impl Participant {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            rack: Rack::new(),
        }
    }

    pub fn take_tiles(&mut self, tiles: Vec<Tile>) {
        for tile in tiles {
            self.rack.insert(tile.id, tile);
        }
    }

    pub fn holds(&self, tile_id: TileId) -> bool {
        self.rack.contains_key(&tile_id)
    }

    /// Base points left in the rack; blanks count for nothing.
    pub fn rack_value(&self) -> i32 {
        self.rack.values().map(|tile| tile.points as i32).sum()
    }

    pub fn summary(&self, connected: bool) -> ParticipantSummary {
        ParticipantSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            score: self.score,
            rack_size: self.rack.len(),
            connected,
        }
    }
}

/// What everyone at the table may see about a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub rack_size: usize,
    pub connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rack_value_ignores_blanks() {
        let mut player = Participant::new(PlayerId::from("p1"), "alice".to_string());
        player.take_tiles(vec![Tile::new(1, "を", 10), Tile::blank(2), Tile::new(3, "あ", 1)]);
        assert_eq!(player.rack_value(), 11);
        assert!(player.holds(2));
        assert!(!player.holds(4));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(PlayerId::generate(), PlayerId::generate());
    }
}
