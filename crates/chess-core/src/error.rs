use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid SAN: {0}")]
    InvalidSan(String),

    #[error("Illegal move {san} in position {fen}")]
    IllegalMove { san: String, fen: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Nothing to import")]
    Empty,

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Could not load game: {reason}")]
    UnparseableGame { reason: String },
}

impl From<ReplayError> for ImportError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::InvalidFen(fen) => ImportError::InvalidFen(fen),
            other => ImportError::UnparseableGame {
                reason: other.to_string(),
            },
        }
    }
}
