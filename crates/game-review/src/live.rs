//! Interactive single-position analysis
//!
//! Every position change restarts a debounce timer; only the position still
//! current when it fires is sent to the evaluator. State is published on a
//! `watch` channel so any number of views can follow it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::analyzer::AnnotatedMove;
use crate::config::ReviewConfig;
use crate::error::EvaluatorError;
use crate::evaluator::{EvalOptions, EvalResponse, Evaluator, LIVE_DEPTH};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);
const DEFAULT_WIN_CHANCE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    pub is_analyzing: bool,
    pub best_move: Option<String>,
    pub best_move_san: Option<String>,
    /// Score from the service; `None` when a mate was found
    pub evaluation: Option<f64>,
    pub mate: Option<i32>,
    pub continuation: Vec<String>,
    pub depth: u32,
    pub win_chance: f64,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            is_analyzing: false,
            best_move: None,
            best_move_san: None,
            evaluation: None,
            mate: None,
            continuation: Vec::new(),
            depth: 0,
            win_chance: DEFAULT_WIN_CHANCE,
        }
    }
}

impl AnalysisState {
    /// State for a final response. Callers filter with [`EvalResponse::is_final`].
    pub fn from_response(resp: EvalResponse) -> Self {
        let (evaluation, mate) = match resp.mate {
            Some(m) => (None, Some(m)),
            None => (resp.eval, None),
        };
        Self {
            is_analyzing: false,
            best_move: resp.best_move,
            best_move_san: resp.san,
            evaluation,
            mate,
            continuation: resp.continuation_arr.unwrap_or_default(),
            depth: resp.depth.unwrap_or(0),
            win_chance: resp.win_chance.unwrap_or(DEFAULT_WIN_CHANCE),
        }
    }

    fn prefill(&mut self, cached: &AnnotatedMove) {
        self.evaluation = Some(cached.eval);
        self.mate = cached.mate;
        self.best_move = cached.best_move.clone();
        self.best_move_san = None;
        self.depth = LIVE_DEPTH;
        self.win_chance = DEFAULT_WIN_CHANCE;
    }
}

/// Debounced "most recent position wins" analysis.
pub struct LiveAnalysis<E> {
    evaluator: Arc<E>,
    state: Arc<watch::Sender<AnalysisState>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Bumped whenever the pending request is superseded; a task only
    /// publishes while its ticket is still current.
    generation: Arc<AtomicU64>,
    debounce: Duration,
    options: EvalOptions,
    suspended: AtomicBool,
}

impl<E: Evaluator + 'static> LiveAnalysis<E> {
    pub fn new(evaluator: Arc<E>, debounce: Duration, options: EvalOptions) -> Self {
        let (state, _) = watch::channel(AnalysisState::default());
        Self {
            evaluator,
            state: Arc::new(state),
            pending: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            debounce,
            options,
            suspended: AtomicBool::new(false),
        }
    }

    pub fn from_config(evaluator: Arc<E>, config: &ReviewConfig) -> Self {
        Self::new(
            evaluator,
            config.debounce(),
            EvalOptions {
                depth: config.live_depth,
                variants: config.variants,
            },
        )
    }

    /// React to the displayed position changing. Must be called from within
    /// a Tokio runtime.
    ///
    /// `cached` is the annotated move that produced `fen`, if a full-game
    /// analysis already covered it; its numbers are shown until the fresh
    /// evaluation arrives.
    pub fn position_changed(&self, fen: &str, cached: Option<&AnnotatedMove>) {
        if self.suspended.load(Ordering::Acquire) {
            debug!("Live analysis suspended, ignoring position change");
            return;
        }

        let ticket = self.cancel_pending();

        self.state.send_modify(|state| {
            if let Some(cached) = cached {
                state.prefill(cached);
            }
            state.is_analyzing = true;
        });

        let evaluator = Arc::clone(&self.evaluator);
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        let debounce = self.debounce;
        let options = self.options;
        let fen = fen.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = evaluator.evaluate(&fen, options).await;
            apply_result(&state, &generation, ticket, result);
        });

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Gate interactive requests while a full-game analysis owns the evaluator.
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
        self.cancel_pending();
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Drop any pending request and restore the initial state.
    pub fn reset(&self) {
        self.cancel_pending();
        self.state.send_replace(AnalysisState::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AnalysisState {
        self.state.borrow().clone()
    }
}

impl<E> LiveAnalysis<E> {
    /// Abort the pending task and invalidate its ticket. Returns the new
    /// current generation.
    fn cancel_pending(&self) -> u64 {
        // Abort only lands at an await point, so a task past its last
        // await is stopped by the generation check instead.
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = previous {
            handle.abort();
        }
        generation
    }
}

impl<E> Drop for LiveAnalysis<E> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn apply_result(
    state: &watch::Sender<AnalysisState>,
    generation: &AtomicU64,
    ticket: u64,
    result: Result<EvalResponse, EvaluatorError>,
) {
    // Checked under the channel's write lock so a concurrent position change
    // either lands first and makes this ticket stale, or overrides it after.
    state.send_if_modified(|current| {
        if generation.load(Ordering::Acquire) != ticket {
            debug!(ticket, "Dropping stale live evaluation");
            return false;
        }
        match result {
            Ok(resp) if resp.is_final() => {
                debug!(eval = ?resp.eval, mate = ?resp.mate, "Live analysis updated");
                *current = AnalysisState::from_response(resp);
                true
            }
            Ok(_) => {
                debug!("Ignoring non-final evaluation");
                false
            }
            // A newer request owns the indicator now
            Err(e) if e.is_cancelled() => {
                debug!("Live evaluation superseded");
                false
            }
            Err(e) => {
                warn!(error = %e, "Live evaluation failed");
                current.is_analyzing = false;
                true
            }
        }
    });
}
