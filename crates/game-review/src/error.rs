//! Review error types

use thiserror::Error;

use crate::analyzer::AnnotatedMove;

/// Failure of a single evaluator request.
#[derive(Error, Debug)]
pub enum EvaluatorError {
    /// Superseded by a newer request from the same client. Not a real failure.
    #[error("Evaluation request cancelled")]
    Cancelled,

    #[error("Evaluation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Evaluation service returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

impl EvaluatorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EvaluatorError::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Archive request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Archive returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    /// Game analysis aborted at `index`; moves annotated before it are kept.
    #[error("Evaluation of move {index} failed: {source}")]
    Evaluator {
        index: usize,
        #[source]
        source: EvaluatorError,
        partial: Vec<AnnotatedMove>,
    },

    #[error(transparent)]
    Import(#[from] chess_core::ImportError),
}
