use serde::Serialize;
use std::sync::LazyLock;

use super::BOARD_SIZE;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bonus {
    None,
    DoubleLetter,
    TripleLetter,
    DoubleWord,
    TripleWord,
    Start,
}

impl Bonus {
    pub fn letter_multiplier(self) -> u32 {
        match self {
            Bonus::DoubleLetter => 2,
            Bonus::TripleLetter => 3,
            _ => 1,
        }
    }

    /// The start cell doubles the word like any other double-word cell.
    pub fn word_multiplier(self) -> u32 {
        match self {
            Bonus::DoubleWord | Bonus::Start => 2,
            Bonus::TripleWord => 3,
            _ => 1,
        }
    }
}

// One eighth of the board; everything else is reflection.
const SEEDS: [(usize, usize, Bonus); 13] = [
    (0, 0, Bonus::TripleWord),
    (0, 7, Bonus::TripleWord),
    (1, 1, Bonus::DoubleWord),
    (2, 2, Bonus::DoubleWord),
    (3, 3, Bonus::DoubleWord),
    (4, 4, Bonus::DoubleWord),
    (1, 5, Bonus::TripleLetter),
    (5, 5, Bonus::TripleLetter),
    (0, 3, Bonus::DoubleLetter),
    (2, 6, Bonus::DoubleLetter),
    (3, 7, Bonus::DoubleLetter),
    (6, 6, Bonus::DoubleLetter),
    (7, 7, Bonus::Start),
];

pub static BONUS_LAYOUT: LazyLock<BonusLayout> = LazyLock::new(|| BonusLayout::generate(&SEEDS));

#[derive(Debug, Clone, Serialize)]
pub struct BonusLayout {
    cells: Vec<Vec<Bonus>>,
}

impl BonusLayout {
    pub fn generate(seeds: &[(usize, usize, Bonus)]) -> Self {
        let mut cells = vec![vec![Bonus::None; BOARD_SIZE]; BOARD_SIZE];

        for &(row, col, kind) in seeds {
            for (r, c) in Self::reflections(row, col) {
                let cell = &mut cells[r][c];
                if *cell == Bonus::None || kind == Bonus::Start {
                    *cell = kind;
                }
            }
        }

        Self { cells }
    }

    fn reflections(row: usize, col: usize) -> Vec<(usize, usize)> {
        let last = BOARD_SIZE - 1;
        let mut images = vec![
            (row, col),
            (col, row),
            (row, last - col),
            (last - row, col),
            (last - row, last - col),
            (col, last - row),
            (last - col, row),
            (last - col, last - row),
        ];
        images.sort_unstable();
        images.dedup();
        images
    }

    pub fn get(&self, row: usize, col: usize) -> Bonus {
        self.cells[row][col]
    }
}
