//! Client for the external position-evaluation service

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReviewConfig;
use crate::error::EvaluatorError;

/// Depth used for interactive single-position analysis
pub const LIVE_DEPTH: u32 = 16;
/// Depth used for full-game analysis
pub const BULK_DEPTH: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    pub depth: u32,
    pub variants: u32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            depth: LIVE_DEPTH,
            variants: 1,
        }
    }
}

impl EvalOptions {
    pub fn with_depth(depth: u32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct EvalRequest<'a> {
    fen: &'a str,
    variants: u32,
    depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Move,
    Bestmove,
    /// Intermediate search update
    Info,
    #[serde(other)]
    Unknown,
}

/// Evaluation of a position. Scores are from the side to move's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalResponse {
    pub eval: Option<f64>,
    /// Mate in N (positive = side to move mates)
    pub mate: Option<i32>,
    /// Best move in coordinate notation, e.g. `e2e4`
    #[serde(rename = "move")]
    pub best_move: Option<String>,
    pub san: Option<String>,
    pub lan: Option<String>,
    pub depth: Option<u32>,
    pub win_chance: Option<f64>,
    pub continuation_arr: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: Option<ResponseKind>,
    pub text: Option<String>,
    pub fen: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub task_id: Option<String>,
    /// Number or numeric string, depending on the service version
    pub centipawns: Option<serde_json::Value>,
}

impl EvalResponse {
    /// Whether this response may be folded into analysis state.
    ///
    /// `info` updates are intermediate, and a response carrying none of
    /// eval, mate or best move has nothing to contribute.
    pub fn is_final(&self) -> bool {
        if self.kind == Some(ResponseKind::Info) {
            return false;
        }
        self.eval.is_some() || self.mate.is_some() || self.best_move.is_some()
    }
}

/// Something that can evaluate a FEN position.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        fen: &str,
        options: EvalOptions,
    ) -> impl Future<Output = Result<EvalResponse, EvaluatorError>> + Send;
}

/// HTTP client for the evaluation service.
///
/// Single-flight: starting a request aborts the one still outstanding from
/// this instance, which then resolves to [`EvaluatorError::Cancelled`].
pub struct ChessApiClient {
    client: reqwest::Client,
    endpoint: String,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl ChessApiClient {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, EvaluatorError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            in_flight: Mutex::new(None),
        })
    }

    pub fn from_config(config: &ReviewConfig) -> Result<Self, EvaluatorError> {
        Self::new(
            &config.chess_api_url,
            &config.user_agent,
            config.request_timeout(),
        )
    }

    /// Evaluate a position, superseding any request still in flight.
    pub async fn analyze(
        &self,
        fen: &str,
        options: EvalOptions,
    ) -> Result<EvalResponse, EvaluatorError> {
        let (handle, registration) = AbortHandle::new_pair();
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            debug!("Superseding in-flight evaluation");
            previous.abort();
        }

        match Abortable::new(self.send(fen, options), registration).await {
            Ok(result) => result,
            Err(_aborted) => Err(EvaluatorError::Cancelled),
        }
    }

    async fn send(&self, fen: &str, options: EvalOptions) -> Result<EvalResponse, EvaluatorError> {
        debug!(fen, depth = options.depth, "Eval <");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EvalRequest {
                fen,
                variants: options.variants,
                depth: options.depth,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(EvaluatorError::Status(resp.status()));
        }

        let data: EvalResponse = resp.json().await?;
        debug!(
            eval = ?data.eval,
            mate = ?data.mate,
            best_move = ?data.best_move,
            "Eval >"
        );
        Ok(data)
    }
}

impl Evaluator for ChessApiClient {
    fn evaluate(
        &self,
        fen: &str,
        options: EvalOptions,
    ) -> impl Future<Output = Result<EvalResponse, EvaluatorError>> + Send {
        self.analyze(fen, options)
    }
}
