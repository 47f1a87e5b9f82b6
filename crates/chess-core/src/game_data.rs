use serde::{Deserialize, Serialize};

/// Board orientation (the side shown at the bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    White,
    Black,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHeader {
    pub white: String,
    pub black: String,
    pub white_elo: String,
    pub black_elo: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub event: String,
    pub site: String,
    pub date: String,
}

impl GameHeader {
    /// Header for a bare position loaded from FEN.
    pub fn analysis(date: String) -> Self {
        Self {
            event: "Analysis".to_string(),
            date,
            ..Self::imported()
        }
    }

    /// Defaults used for any tag a PGN leaves out.
    pub fn imported() -> Self {
        Self {
            white: "White".to_string(),
            black: "Black".to_string(),
            white_elo: String::new(),
            black_elo: String::new(),
            result: "*".to_string(),
            event: "Imported Game".to_string(),
            site: String::new(),
            date: String::new(),
        }
    }
}

/// A successfully imported game or position, ready to be browsed or analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedGame {
    pub start_fen: String,
    /// Position currently shown; imports always start at `start_fen`.
    pub fen: String,
    pub history: Vec<String>, // SAN notation
    /// Index of the last played move, `None` before the first move
    pub move_index: Option<usize>,
    pub orientation: Orientation,
    pub header: GameHeader,
}
