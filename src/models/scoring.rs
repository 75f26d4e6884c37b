use serde::Serialize;

use super::bonus::BonusLayout;
use super::validator::FormedWord;
use super::{ALL_TILES_BONUS, RACK_CAPACITY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordScore {
    pub word: String,
    pub score: u32,
}

/// Bonus cells only count under tiles placed this turn. A tile scores its base
/// value whatever letter it was played as.
pub fn score_word(word: &FormedWord, layout: &BonusLayout) -> u32 {
    let mut sum = 0;
    let mut word_multiplier = 1;

    for cell in &word.cells {
        let mut points = cell.tile.points;
        if cell.new {
            let bonus = layout.get(cell.row, cell.col);
            points *= bonus.letter_multiplier();
            word_multiplier *= bonus.word_multiplier();
        }
        sum += points;
    }

    sum * word_multiplier
}

pub fn score_turn(words: &[FormedWord], tiles_placed: usize, layout: &BonusLayout) -> (Vec<WordScore>, u32) {
    let scores: Vec<WordScore> = words
        .iter()
        .map(|word| WordScore {
            word: word.text(),
            score: score_word(word, layout),
        })
        .collect();

    let mut total = scores.iter().map(|s| s.score).sum();
    if tiles_placed == RACK_CAPACITY {
        total += ALL_TILES_BONUS;
    }
    (scores, total)
}
