//! Game review: evaluator client, move classification, full-game analysis
//! and interactive live analysis.

pub mod analysis;
pub mod analyzer;
pub mod clients;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod live;

#[cfg(test)]
mod mock;

pub use analysis::{GameSummary, MoveClassification, SideSummary};
pub use analyzer::{
    analyze_game_moves, AnalysisStatus, AnnotatedMove, FailurePolicy, GameReview,
    PipelineOptions, Progress,
};
pub use config::ReviewConfig;
pub use error::{ArchiveError, EvaluatorError, ReviewError};
pub use evaluator::{ChessApiClient, EvalOptions, EvalResponse, Evaluator};
pub use live::{AnalysisState, LiveAnalysis};
