//! Position replay and game import shared by the review tools.

pub mod error;
pub mod fen;
pub mod game_data;
pub mod import;
pub mod pgn;
pub mod replay;

pub use error::{ImportError, ReplayError};
pub use game_data::{GameHeader, LoadedGame, Orientation};
pub use import::{import_game, Imported};
pub use replay::{PlayedMove, Replay, STANDARD_START_FEN};
