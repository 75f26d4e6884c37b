use serde::Serialize;
use std::collections::HashSet;

use super::board::{Axis, Board};
use super::player::Rack;
use super::tile::{is_letter, is_variant, Placement, Tile, TileId};
use super::CENTER;
use crate::dictionary::WordOracle;
use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCell {
    pub row: usize,
    pub col: usize,
    pub tile: Tile,
    /// Placed this turn, as opposed to already on the board.
    pub new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormedWord {
    pub axis: Axis,
    pub start: (usize, usize),
    pub cells: Vec<WordCell>,
}

impl FormedWord {
    pub fn text(&self) -> String {
        self.cells.iter().map(|cell| cell.tile.face()).collect()
    }
}

/// Decides whether a set of placements is a legal move and which words it forms.
/// Read-only on the caller's board: all provisional writes go to a scratch copy.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator<'a> {
    oracle: &'a dyn WordOracle,
}

impl<'a> PlacementValidator<'a> {
    pub fn new(oracle: &'a dyn WordOracle) -> Self {
        Self { oracle }
    }

    pub fn validate(
        &self,
        board: &Board,
        placements: &[Placement],
        rack: &Rack,
        is_first_move: bool,
    ) -> Result<Vec<FormedWord>> {
        if placements.is_empty() {
            return Err(GameError::EmptyPlacement);
        }

        let tiles = Self::resolve_tiles(placements, rack)?;
        Self::check_cells(board, placements)?;
        let tiles = Self::assign_faces(placements, tiles)?;
        let axis = Self::play_axis(placements)?;

        let mut scratch = board.clone();
        for (placement, tile) in placements.iter().zip(tiles) {
            scratch.place(placement.row, placement.col, tile);
        }

        Self::check_gaps(&scratch, placements, axis)?;
        Self::check_anchor(board, placements, is_first_move)?;

        let words = Self::extract_words(&scratch, placements);
        if words.is_empty() {
            return Err(GameError::LoneTile);
        }

        if let Some(word) = words.iter().find(|w| !self.oracle.contains(&w.text())) {
            return Err(GameError::UnknownWord(word.text()));
        }

        Ok(words)
    }

    fn resolve_tiles(placements: &[Placement], rack: &Rack) -> Result<Vec<Tile>> {
        let mut seen: HashSet<TileId> = HashSet::new();
        placements
            .iter()
            .map(|p| {
                if !seen.insert(p.tile_id) {
                    return Err(GameError::DuplicateTile(p.tile_id));
                }
                rack.get(&p.tile_id)
                    .cloned()
                    .ok_or(GameError::TileNotInRack(p.tile_id))
            })
            .collect()
    }

    fn check_cells(board: &Board, placements: &[Placement]) -> Result<()> {
        if let Some(p) = placements.iter().find(|p| !Board::in_bounds(p.row, p.col)) {
            return Err(GameError::OutOfBounds {
                row: p.row,
                col: p.col,
            });
        }

        let mut targets = HashSet::new();
        for p in placements {
            if board.is_occupied(p.row, p.col) || !targets.insert((p.row, p.col)) {
                return Err(GameError::CellOccupied {
                    row: p.row,
                    col: p.col,
                });
            }
        }
        Ok(())
    }

    // Blanks must name a letter; ordinary tiles may only name one of their variants.
    fn assign_faces(placements: &[Placement], tiles: Vec<Tile>) -> Result<Vec<Tile>> {
        placements
            .iter()
            .zip(tiles)
            .map(|(p, mut tile)| {
                let assigned = p.assigned.as_deref().filter(|a| !a.is_empty());
                match (tile.blank, assigned) {
                    (true, None) => return Err(GameError::BlankUnassigned(tile.id)),
                    (true, Some(letter)) if !is_letter(letter) => {
                        return Err(GameError::UnknownLetter(letter.to_string()))
                    }
                    (false, Some(letter)) if letter == tile.letter => return Ok(tile),
                    (false, Some(letter)) if !is_variant(&tile.letter, letter) => {
                        return Err(GameError::InvalidVariant {
                            base: tile.letter.clone(),
                            assigned: letter.to_string(),
                        })
                    }
                    _ => {}
                }
                tile.assigned = assigned.map(str::to_string);
                Ok(tile)
            })
            .collect()
    }

    fn play_axis(placements: &[Placement]) -> Result<Axis> {
        let first = &placements[0];
        if placements.iter().all(|p| p.row == first.row) {
            Ok(Axis::Horizontal)
        } else if placements.iter().all(|p| p.col == first.col) {
            Ok(Axis::Vertical)
        } else {
            Err(GameError::NotCollinear)
        }
    }

    fn check_gaps(scratch: &Board, placements: &[Placement], axis: Axis) -> Result<()> {
        let line: Vec<usize> = placements
            .iter()
            .map(|p| match axis {
                Axis::Horizontal => p.col,
                Axis::Vertical => p.row,
            })
            .collect();
        let (Some(&min), Some(&max)) = (line.iter().min(), line.iter().max()) else {
            return Ok(());
        };

        let fixed = match axis {
            Axis::Horizontal => placements[0].row,
            Axis::Vertical => placements[0].col,
        };
        let gap = (min..=max).any(|i| match axis {
            Axis::Horizontal => !scratch.is_occupied(fixed, i),
            Axis::Vertical => !scratch.is_occupied(i, fixed),
        });

        if gap {
            Err(GameError::Gap)
        } else {
            Ok(())
        }
    }

    fn check_anchor(board: &Board, placements: &[Placement], is_first_move: bool) -> Result<()> {
        if is_first_move {
            if !placements.iter().any(|p| p.row == CENTER && p.col == CENTER) {
                return Err(GameError::FirstMoveOffCenter);
            }
            if placements.len() < 2 {
                return Err(GameError::FirstMoveTooShort);
            }
            return Ok(());
        }

        if placements.iter().any(|p| board.has_neighbour(p.row, p.col)) {
            Ok(())
        } else {
            Err(GameError::NotAdjacent)
        }
    }

    /// Every run of two or more tiles through a newly placed tile, once each.
    pub fn extract_words(scratch: &Board, placements: &[Placement]) -> Vec<FormedWord> {
        let new_cells: HashSet<(usize, usize)> =
            placements.iter().map(|p| (p.row, p.col)).collect();
        let mut seen: HashSet<(Axis, (usize, usize))> = HashSet::new();
        let mut words = Vec::new();

        for p in placements {
            for axis in [Axis::Horizontal, Axis::Vertical] {
                let mut start = (p.row, p.col);
                while let Some(prev) = Board::previous(start.0, start.1, axis) {
                    if !scratch.is_occupied(prev.0, prev.1) {
                        break;
                    }
                    start = prev;
                }

                if !seen.insert((axis, start)) {
                    continue;
                }

                let mut cells = Vec::new();
                let mut cursor = Some(start);
                while let Some((row, col)) = cursor {
                    let Some(tile) = scratch.get(row, col) else {
                        break;
                    };
                    cells.push(WordCell {
                        row,
                        col,
                        tile: tile.clone(),
                        new: new_cells.contains(&(row, col)),
                    });
                    cursor = Board::next(row, col, axis);
                }

                if cells.len() >= 2 {
                    words.push(FormedWord { axis, start, cells });
                }
            }
        }
        words
    }
}
