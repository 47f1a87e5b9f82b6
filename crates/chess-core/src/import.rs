//! Smart import: a pasted string is tried as FEN first, then as PGN.

use crate::error::ImportError;
use crate::fen;
use crate::game_data::LoadedGame;
use crate::pgn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    /// A bare position; there is nothing to replay.
    Position(LoadedGame),
    /// A full game whose moves should be analyzed.
    Game(LoadedGame),
}

impl Imported {
    pub fn game(&self) -> &LoadedGame {
        match self {
            Imported::Position(game) | Imported::Game(game) => game,
        }
    }

    pub fn into_game(self) -> LoadedGame {
        match self {
            Imported::Position(game) | Imported::Game(game) => game,
        }
    }
}

/// Import FEN or PGN text. Nothing is returned unless parsing succeeds.
pub fn import_game(input: &str) -> Result<Imported, ImportError> {
    let clean = input.trim();
    if clean.is_empty() {
        return Err(ImportError::Empty);
    }

    if fen::is_fen_like(clean) {
        let today = chrono::Local::now().format("%Y.%m.%d").to_string();
        // Not a valid position: fall through and try PGN
        if let Ok(game) = fen::load_fen(clean, today) {
            return Ok(Imported::Position(game));
        }
    }

    pgn::load_pgn(clean).map(Imported::Game)
}
