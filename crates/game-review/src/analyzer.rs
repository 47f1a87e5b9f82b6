//! Full-game analysis pipeline
//!
//! Replays a move list one ply at a time, evaluates every resulting position
//! through an [`Evaluator`] and folds the results into annotated moves.
//! Requests are strictly sequential: ply i+1 is never sent before ply i
//! resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chess_core::{ImportError, Replay};
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::{debug, info, warn};

use crate::analysis::{
    self, calculate_cp_loss, classify_move, normalize_eval, GameSummary, MoveClassification,
    MoveContext, NormalizedEval, INITIAL_EVAL,
};
use crate::config::ReviewConfig;
use crate::error::{EvaluatorError, ReviewError};
use crate::evaluator::{EvalOptions, EvalResponse, Evaluator, BULK_DEPTH};

/// One analyzed ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedMove {
    /// Position after the move
    pub fen: String,
    pub move_san: String,
    pub move_index: usize,
    /// White-positive evaluation; mates saturate at ±2000
    pub eval: f64,
    /// Mate distance from White's point of view
    pub mate: Option<i32>,
    pub classification: MoveClassification,
    /// Engine suggestion for the position the move was played from
    pub best_move: Option<String>,
    pub cp_loss: f64,
}

impl AnnotatedMove {
    /// White moved if the resulting position has Black to move.
    pub fn is_white_move(&self) -> bool {
        self.fen.split_whitespace().nth(1) == Some("b")
    }
}

/// What to do when an evaluation fails in the middle of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop and return the moves annotated so far inside the error
    Abort,
    /// Drop the ply like an illegal move and carry on
    Skip,
    /// Retry with linear backoff, then abort
    Retry { attempts: u32, backoff: Duration },
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Retry {
            attempts: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl FailurePolicy {
    pub fn from_name(name: &str, attempts: u32, backoff: Duration) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(FailurePolicy::Abort),
            "skip" => Some(FailurePolicy::Skip),
            "retry" => Some(FailurePolicy::Retry { attempts, backoff }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub depth: u32,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            depth: BULK_DEPTH,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self {
            depth: config.bulk_depth,
            failure_policy: config.failure_policy.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Share of the move list processed, rounded, 0-100
    pub percent: u32,
    /// Annotated moves so far
    pub analyzed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Completed,
    Cancelled,
    /// Stopped by an evaluator failure; see [`GameReview::aborted`].
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReview {
    pub moves: Vec<AnnotatedMove>,
    pub status: AnalysisStatus,
}

impl GameReview {
    /// Wrap the moves annotated before a [`ReviewError::Evaluator`] abort.
    pub fn aborted(moves: Vec<AnnotatedMove>) -> Self {
        Self {
            moves,
            status: AnalysisStatus::Aborted,
        }
    }

    pub fn summary(&self) -> GameSummary {
        analysis::summarize(
            self.moves
                .iter()
                .map(|m| (m.is_white_move(), m.classification, m.cp_loss)),
        )
    }
}

/// Analyze every move of a game.
///
/// `cancel` is checked before each ply; once set, the moves annotated so far
/// are returned with [`AnalysisStatus::Cancelled`]. Illegal moves are skipped
/// without advancing any state.
pub async fn analyze_game_moves<E, F>(
    evaluator: &E,
    start_fen: &str,
    moves: &[String],
    options: &PipelineOptions,
    cancel: &AtomicBool,
    mut on_progress: F,
) -> Result<GameReview, ReviewError>
where
    E: Evaluator,
    F: FnMut(Progress),
{
    let mut replay = Replay::from_fen(start_fen).map_err(ImportError::from)?;
    let eval_options = EvalOptions::with_depth(options.depth);
    let total = moves.len();

    info!(move_count = total, depth = options.depth, "Starting game analysis");

    let mut previous_eval = INITIAL_EVAL;
    let mut previous_best_move: Option<String> = None;

    // Seed from the start position. Failure keeps the defaults.
    match evaluator.evaluate(start_fen, eval_options).await {
        Ok(resp) if resp.is_final() => {
            previous_eval = normalize_eval(resp.eval, resp.mate, replay.is_black_to_move()).eval;
            if resp.best_move.is_some() {
                previous_best_move = resp.best_move;
            }
        }
        Ok(_) => debug!("Seed evaluation had no result"),
        Err(e) => warn!(error = %e, "Seed evaluation failed, using defaults"),
    }

    let mut annotated: Vec<AnnotatedMove> = Vec::with_capacity(total);
    let mut status = AnalysisStatus::Completed;

    for (i, san) in moves.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(index = i, "Analysis cancelled");
            status = AnalysisStatus::Cancelled;
            break;
        }

        let played = match replay.play_san(san) {
            Ok(played) => played,
            Err(e) => {
                warn!(index = i, san = %san, error = %e, "Skipping unplayable move");
                continue;
            }
        };

        let resp = match evaluate_with_policy(
            evaluator,
            &played.fen_after,
            eval_options,
            &options.failure_policy,
            cancel,
        )
        .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_cancelled() => {
                info!(index = i, "Evaluation superseded, stopping analysis");
                status = AnalysisStatus::Cancelled;
                break;
            }
            Err(e) if options.failure_policy == FailurePolicy::Skip => {
                warn!(index = i, error = %e, "Evaluation failed, skipping move");
                continue;
            }
            Err(e) => {
                return Err(ReviewError::Evaluator {
                    index: i,
                    source: e,
                    partial: annotated,
                });
            }
        };

        let is_white = played.mover == Color::White;
        let is_final = resp.is_final();
        let current = if is_final {
            normalize_eval(resp.eval, resp.mate, replay.is_black_to_move())
        } else {
            // Intermediate or empty answer: annotate against the previous
            // evaluation and keep all state as it was.
            debug!(index = i, kind = ?resp.kind, "No final evaluation, holding previous");
            NormalizedEval {
                eval: previous_eval,
                mate: None,
            }
        };
        let cp_loss = calculate_cp_loss(previous_eval, current.eval, is_white);
        let matches_best = previous_best_move.as_deref() == Some(played.coordinate.as_str());
        let classification = classify_move(&MoveContext {
            move_index: i,
            is_white,
            matches_best,
            prev_eval: previous_eval,
            current_eval: current.eval,
            cp_loss,
        });

        debug!(
            index = i,
            san = %played.san,
            eval = current.eval,
            cp_loss,
            %classification,
            "Move classified"
        );

        annotated.push(AnnotatedMove {
            fen: played.fen_after,
            move_san: played.san,
            move_index: i,
            eval: current.eval,
            mate: current.mate,
            classification,
            best_move: previous_best_move.clone(),
            cp_loss,
        });

        if is_final {
            previous_eval = current.eval;
            if resp.best_move.is_some() {
                previous_best_move = resp.best_move;
            }
        }

        on_progress(Progress {
            percent: progress_percent(i + 1, total),
            analyzed: annotated.len(),
        });
    }

    info!(
        analyzed = annotated.len(),
        move_count = total,
        ?status,
        "Game analysis finished"
    );

    Ok(GameReview {
        moves: annotated,
        status,
    })
}

async fn evaluate_with_policy<E: Evaluator>(
    evaluator: &E,
    fen: &str,
    options: EvalOptions,
    policy: &FailurePolicy,
    cancel: &AtomicBool,
) -> Result<EvalResponse, EvaluatorError> {
    let (attempts, backoff) = match policy {
        FailurePolicy::Retry { attempts, backoff } => (*attempts, *backoff),
        FailurePolicy::Abort | FailurePolicy::Skip => (0, Duration::ZERO),
    };

    let mut attempt = 0;
    loop {
        match evaluator.evaluate(fen, options).await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_cancelled() || attempt >= attempts => return Err(e),
            Err(e) => {
                attempt += 1;
                warn!(attempt, error = %e, "Evaluation failed, retrying");
                tokio::time::sleep(backoff * attempt).await;
                if cancel.load(Ordering::Relaxed) {
                    return Err(EvaluatorError::Cancelled);
                }
            }
        }
    }
}

fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (100.0 * done as f64 / total as f64).round() as u32
}
