use serde::Serialize;

use super::tile::Tile;
use super::BOARD_SIZE;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn step(self) -> (usize, usize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
        }
    }
}

/// Append-only grid; a placed tile is never lifted again.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    cells: Vec<Vec<Option<Tile>>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: vec![vec![None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Tile> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    pub fn place(&mut self, row: usize, col: usize, tile: Tile) {
        self.cells[row][col] = Some(tile);
    }

    /// True when any of the four orthogonal neighbours holds a tile.
    pub fn has_neighbour(&self, row: usize, col: usize) -> bool {
        let up = row.checked_sub(1).map(|r| (r, col));
        let left = col.checked_sub(1).map(|c| (row, c));
        [up, left, Some((row + 1, col)), Some((row, col + 1))]
            .into_iter()
            .flatten()
            .any(|(r, c)| self.is_occupied(r, c))
    }

    /// The cell one step back along `axis`, if it is on the board.
    pub fn previous(row: usize, col: usize, axis: Axis) -> Option<(usize, usize)> {
        let (dr, dc) = axis.step();
        Some((row.checked_sub(dr)?, col.checked_sub(dc)?))
    }

    pub fn next(row: usize, col: usize, axis: Axis) -> Option<(usize, usize)> {
        let (dr, dc) = axis.step();
        let (r, c) = (row + dr, col + dc);
        Self::in_bounds(r, c).then_some((r, c))
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbour_detection_at_edges() {
        let mut board = Board::new();
        board.place(0, 1, Tile::new(1, "あ", 1));
        assert!(board.has_neighbour(0, 0));
        assert!(board.has_neighbour(1, 1));
        assert!(!board.has_neighbour(2, 2));
        assert!(!board.has_neighbour(BOARD_SIZE - 1, BOARD_SIZE - 1));
    }

    #[test]
    fn test_walk_stops_at_edges() {
        assert_eq!(Board::previous(0, 5, Axis::Vertical), None);
        assert_eq!(Board::previous(3, 5, Axis::Horizontal), Some((3, 4)));
        assert_eq!(Board::next(3, BOARD_SIZE - 1, Axis::Horizontal), None);
        assert_eq!(Board::next(3, 4, Axis::Vertical), Some((4, 4)));
    }

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let board = Board::new();
        assert!(board.get(BOARD_SIZE, 0).is_none());
        assert!(board.is_empty());
    }
}
