//! Move-by-move replay of a game on top of shakmaty.

use shakmaty::{
    fen::Fen, san::SanPlus, CastlingMode, Chess, Color, EnPassantMode, Move, Position,
};

use crate::error::ReplayError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A ply that was successfully applied to a [`Replay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    /// SAN as supplied by the caller
    pub san: String,
    /// Origin + destination square (e.g. `e2e4`, castling as `e1g1`)
    pub coordinate: String,
    pub mover: Color,
    pub fen_after: String,
}

/// Running position that SAN moves are applied to, one at a time.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    position: Chess,
}

impl Replay {
    /// Replay from the standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, ReplayError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ReplayError::InvalidFen(format!("{fen} ({e})")))?;
        let position = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| ReplayError::InvalidFen(format!("{fen} ({e})")))?;
        Ok(Self { position })
    }

    /// Canonical FEN of the current position.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn is_black_to_move(&self) -> bool {
        self.position.turn() == Color::Black
    }

    /// Apply a SAN move. On failure the position is left untouched.
    pub fn play_san(&mut self, san: &str) -> Result<PlayedMove, ReplayError> {
        let token = san.trim().trim_end_matches(['!', '?']);
        let parsed: SanPlus = token
            .parse()
            .map_err(|_| ReplayError::InvalidSan(san.to_string()))?;
        let mv = parsed
            .san
            .to_move(&self.position)
            .map_err(|_| ReplayError::IllegalMove {
                san: san.to_string(),
                fen: self.fen(),
            })?;

        let coordinate = coordinate_notation(&mv);
        let mover = self.position.turn();
        self.position.play_unchecked(mv);

        Ok(PlayedMove {
            san: san.to_string(),
            coordinate,
            mover,
            fen_after: self.fen(),
        })
    }
}

/// Origin and destination squares of a move, without promotion suffix.
pub fn coordinate_notation(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard)
        .to_string()
        .chars()
        .take(4)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_start_fen() {
        assert_eq!(Replay::new().fen(), STANDARD_START_FEN);
    }

    #[test]
    fn test_play_san_sequence() {
        let mut replay = Replay::new();
        let e4 = replay.play_san("e4").unwrap();
        assert_eq!(e4.coordinate, "e2e4");
        assert_eq!(e4.mover, Color::White);
        assert!(replay.is_black_to_move());

        let e5 = replay.play_san("e5").unwrap();
        assert_eq!(e5.coordinate, "e7e5");
        assert_eq!(e5.mover, Color::Black);
        assert_eq!(
            e5.fen_after,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let mut replay =
            Replay::from_fen("r3k2r/pppqbppp/2np1n2/4p3/2B1P1b1/2NP1N2/PPPBQPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let castle = replay.play_san("O-O").unwrap();
        assert_eq!(castle.coordinate, "e1g1");

        let long = replay.play_san("O-O-O").unwrap();
        assert_eq!(long.coordinate, "e8c8");
    }

    #[test]
    fn test_promotion_suffix_dropped() {
        let mut replay = Replay::from_fen("8/P7/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let promo = replay.play_san("a8=Q+").unwrap();
        assert_eq!(promo.coordinate, "a7a8");
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut replay = Replay::new();
        let before = replay.fen();
        let err = replay.play_san("e5").unwrap_err();
        assert!(matches!(err, ReplayError::IllegalMove { .. }));
        assert_eq!(replay.fen(), before);

        assert!(matches!(
            replay.play_san("zz9"),
            Err(ReplayError::InvalidSan(_))
        ));
    }

    #[test]
    fn test_annotations_ignored() {
        let mut replay = Replay::new();
        assert_eq!(replay.play_san("e4!?").unwrap().coordinate, "e2e4");
        assert_eq!(replay.play_san("Nf6?").unwrap().coordinate, "g8f6");
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            Replay::from_fen("not a fen"),
            Err(ReplayError::InvalidFen(_))
        ));
    }
}
