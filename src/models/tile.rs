use serde::{Deserialize, Serialize};

pub type TileId = u32;

pub const BLANK_COUNT: usize = 2;

// (letter, count, points). Frequent kana are cheap, rare ones expensive.
pub const LETTERS: [(&str, usize, u32); 47] = [
    ("あ", 5, 1), ("い", 6, 1), ("う", 5, 1), ("え", 2, 3), ("お", 4, 1),
    ("か", 5, 1), ("き", 3, 2), ("く", 4, 2), ("け", 2, 3), ("こ", 3, 2),
    ("さ", 2, 3), ("し", 4, 1), ("す", 2, 3), ("せ", 2, 3), ("そ", 2, 3),
    ("た", 3, 2), ("ち", 2, 3), ("つ", 3, 2), ("て", 3, 2), ("と", 4, 1),
    ("な", 2, 3), ("に", 2, 3), ("ぬ", 1, 8), ("ね", 1, 5), ("の", 3, 2),
    ("は", 2, 3), ("ひ", 1, 5), ("ふ", 1, 5), ("へ", 1, 8), ("ほ", 1, 5),
    ("ま", 2, 3), ("み", 1, 5), ("む", 1, 8), ("め", 1, 5), ("も", 2, 3),
    ("や", 1, 5), ("ゆ", 1, 8), ("よ", 2, 3),
    ("ら", 1, 5), ("り", 2, 3), ("る", 2, 3), ("れ", 1, 5), ("ろ", 1, 8),
    ("わ", 1, 5), ("を", 1, 10), ("ん", 4, 1), ("ー", 2, 3),
];

// Voiced, semi-voiced and small forms a base tile may be played as.
const VARIANTS: [(&str, &[&str]); 29] = [
    ("あ", &["ぁ"]), ("い", &["ぃ"]), ("う", &["ぅ", "ゔ"]), ("え", &["ぇ"]), ("お", &["ぉ"]),
    ("か", &["が"]), ("き", &["ぎ"]), ("く", &["ぐ"]), ("け", &["げ"]), ("こ", &["ご"]),
    ("さ", &["ざ"]), ("し", &["じ"]), ("す", &["ず"]), ("せ", &["ぜ"]), ("そ", &["ぞ"]),
    ("た", &["だ"]), ("ち", &["ぢ"]), ("つ", &["づ", "っ"]), ("て", &["で"]), ("と", &["ど"]),
    ("は", &["ば", "ぱ"]), ("ひ", &["び", "ぴ"]), ("ふ", &["ぶ", "ぷ"]), ("へ", &["べ", "ぺ"]),
    ("ほ", &["ぼ", "ぽ"]),
    ("や", &["ゃ"]), ("ゆ", &["ゅ"]), ("よ", &["ょ"]), ("わ", &["ゎ"]),
];

pub fn total_tile_count() -> usize {
    LETTERS.iter().map(|(_, count, _)| count).sum::<usize>() + BLANK_COUNT
}

pub fn is_variant(base: &str, assigned: &str) -> bool {
    VARIANTS
        .iter()
        .find(|(b, _)| *b == base)
        .is_some_and(|(_, forms)| forms.contains(&assigned))
}

/// Anything a blank may stand for: a base letter or one of its variants.
pub fn is_letter(candidate: &str) -> bool {
    LETTERS.iter().any(|(letter, _, _)| *letter == candidate)
        || VARIANTS
            .iter()
            .any(|(_, forms)| forms.contains(&candidate))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub id: TileId,
    /// Empty for a blank.
    pub letter: String,
    pub points: u32,
    pub blank: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned: Option<String>,
}

impl Tile {
    pub fn new(id: TileId, letter: &str, points: u32) -> Self {
        Self {
            id,
            letter: letter.to_string(),
            points,
            blank: false,
            assigned: None,
        }
    }

    pub fn blank(id: TileId) -> Self {
        Self {
            id,
            letter: String::new(),
            points: 0,
            blank: true,
            assigned: None,
        }
    }

    /// The character the tile reads as on the board.
    pub fn face(&self) -> &str {
        self.assigned.as_deref().unwrap_or(&self.letter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub tile_id: TileId,
    pub row: usize,
    pub col: usize,
    #[serde(default)]
    pub assigned: Option<String>,
}

impl Placement {
    pub fn new(tile_id: TileId, row: usize, col: usize) -> Self {
        Self {
            tile_id,
            row,
            col,
            assigned: None,
        }
    }

    pub fn assigned(mut self, letter: &str) -> Self {
        self.assigned = Some(letter.to_string());
        self
    }
}
