use rand::seq::SliceRandom;
use rand::Rng;

use super::tile::{Tile, TileId, BLANK_COUNT, LETTERS};
use crate::error::{GameError, Result};

#[derive(Debug, Clone)]
pub struct TilePool {
    tiles: Vec<Tile>,
}

impl Default for TilePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TilePool {
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool = Self::from_tiles(Self::full_set());
        pool.tiles.shuffle(rng);
        pool
    }

    /// A pool drawn in exactly the given order. Used to set up known games.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    fn full_set() -> Vec<Tile> {
        let mut next_id: TileId = 0;
        let mut tiles = Vec::new();
        for (letter, count, points) in LETTERS {
            for _ in 0..count {
                tiles.push(Tile::new(next_id, letter, points));
                next_id += 1;
            }
        }
        for _ in 0..BLANK_COUNT {
            tiles.push(Tile::blank(next_id));
            next_id += 1;
        }
        tiles
    }

    /// Takes up to `n` tiles off the front; fewer once the pool runs dry.
    pub fn draw(&mut self, n: usize) -> Vec<Tile> {
        let n = n.min(self.tiles.len());
        self.tiles.drain(..n).collect()
    }

    pub fn draw_to_fill(&mut self, current_rack_size: usize, rack_capacity: usize) -> Vec<Tile> {
        self.draw(rack_capacity.saturating_sub(current_rack_size))
    }

    /// Swaps `returned` for the same number of fresh tiles. Refused outright when
    /// the pool cannot cover the whole request.
    pub fn exchange(&mut self, returned: Vec<Tile>) -> Result<Vec<Tile>> {
        self.exchange_with_rng(returned, &mut rand::thread_rng())
    }

    pub fn exchange_with_rng<R: Rng + ?Sized>(
        &mut self,
        returned: Vec<Tile>,
        rng: &mut R,
    ) -> Result<Vec<Tile>> {
        if self.tiles.len() < returned.len() {
            return Err(GameError::InsufficientPool {
                requested: returned.len(),
                remaining: self.tiles.len(),
            });
        }

        let fresh = self.draw(returned.len());
        self.give_back(returned);
        self.tiles.shuffle(rng);
        Ok(fresh)
    }

    /// Returns tiles to the pool without drawing anything in their place.
    pub fn give_back(&mut self, returned: Vec<Tile>) {
        self.tiles.extend(returned.into_iter().map(|mut tile| {
            tile.assigned = None;
            tile
        }));
    }

    pub fn shuffle(&mut self) {
        self.tiles.shuffle(&mut rand::thread_rng());
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tile::total_tile_count;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn small_pool(n: u32) -> TilePool {
        TilePool::from_tiles((0..n).map(|id| Tile::new(id, "あ", 1)).collect())
    }

    #[test]
    fn test_new_pool_has_unique_ids() {
        let pool = TilePool::with_rng(&mut StdRng::seed_from_u64(7));
        let ids: HashSet<TileId> = pool.tiles.iter().map(|t| t.id).collect();
        assert_eq!(pool.remaining(), total_tile_count());
        assert_eq!(ids.len(), total_tile_count());
        assert_eq!(pool.tiles.iter().filter(|t| t.blank).count(), BLANK_COUNT);
    }

    #[test]
    fn test_draw_never_fails_when_short() {
        let mut pool = small_pool(3);
        assert_eq!(pool.draw(2).len(), 2);
        assert_eq!(pool.draw(5).len(), 1);
        assert!(pool.draw(1).is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_draw_to_fill_tops_up_to_capacity() {
        let mut pool = small_pool(20);
        assert_eq!(pool.draw_to_fill(3, 7).len(), 4);
        assert!(pool.draw_to_fill(9, 7).is_empty());
    }

    #[test]
    fn test_exchange_refuses_more_than_remaining() {
        let mut pool = small_pool(2);
        let returned = vec![Tile::new(10, "か", 1), Tile::new(11, "き", 2), Tile::new(12, "く", 2)];
        let err = pool.exchange(returned).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientPool {
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(pool.remaining(), 2);
    }

    #[test]
    fn test_exchange_conserves_tiles_and_resets_blanks() {
        let mut pool = small_pool(5);
        let mut blank = Tile::blank(99);
        blank.assigned = Some("ね".to_string());

        let fresh = pool
            .exchange_with_rng(vec![blank], &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(fresh.len(), 1);
        assert_ne!(fresh[0].id, 99);
        assert_eq!(pool.remaining(), 5);
        let back = pool.tiles.iter().find(|t| t.id == 99).unwrap();
        assert_eq!(back.assigned, None);
    }
}
