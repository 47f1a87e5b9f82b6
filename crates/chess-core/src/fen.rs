//! Loading a bare position from FEN.

use shakmaty::Color;

use crate::error::ImportError;
use crate::game_data::{GameHeader, LoadedGame, Orientation};
use crate::replay::Replay;

/// Cheap shape check: at least four fields and a rank separator.
pub fn is_fen_like(input: &str) -> bool {
    input.split_whitespace().count() >= 4 && input.contains('/')
}

/// Load a position, orienting the board towards the side to move.
pub fn load_fen(input: &str, date: String) -> Result<LoadedGame, ImportError> {
    let replay =
        Replay::from_fen(input).map_err(|e| ImportError::InvalidFen(e.to_string()))?;
    let fen = replay.fen();
    let orientation = match replay.turn() {
        Color::White => Orientation::White,
        Color::Black => Orientation::Black,
    };

    Ok(LoadedGame {
        start_fen: fen.clone(),
        fen,
        history: Vec::new(),
        move_index: None,
        orientation,
        header: GameHeader::analysis(date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fen_like() {
        assert!(is_fen_like(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        ));
        assert!(is_fen_like("8/8/8/8/8/8/8/K6k w - -"));
        assert!(!is_fen_like("1. e4 e5 2. Nf3"));
        assert!(!is_fen_like("a/b c"));
    }

    #[test]
    fn test_load_fen_black_to_move() {
        let game = load_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "2026.10.18".to_string(),
        )
        .unwrap();

        assert_eq!(game.orientation, Orientation::Black);
        assert_eq!(game.start_fen, game.fen);
        // No black pawn can capture on e3, so the square is dropped
        assert_eq!(
            game.fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert!(game.history.is_empty());
        assert_eq!(game.move_index, None);
        assert_eq!(game.header.event, "Analysis");
        assert_eq!(game.header.date, "2026.10.18");
        assert_eq!(game.header.result, "*");
    }

    #[test]
    fn test_load_fen_rejects_garbage() {
        assert!(matches!(
            load_fen("xx/yy w - - 0 1", String::new()),
            Err(ImportError::InvalidFen(_))
        ));
    }
}
