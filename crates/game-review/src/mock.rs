use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use crate::error::EvaluatorError;
use crate::evaluator::{EvalOptions, EvalResponse, Evaluator};

/// Answers from a queue; an empty queue yields a bare response.
#[derive(Default)]
pub struct QueueEvaluator {
    responses: Mutex<VecDeque<Result<EvalResponse, EvaluatorError>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl QueueEvaluator {
    pub fn new(responses: Vec<Result<EvalResponse, EvaluatorError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// FENs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(fen, _)| fen.clone())
            .collect()
    }

    pub fn depths(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

impl Evaluator for QueueEvaluator {
    fn evaluate(
        &self,
        fen: &str,
        options: EvalOptions,
    ) -> impl Future<Output = Result<EvalResponse, EvaluatorError>> + Send {
        self.calls
            .lock()
            .unwrap()
            .push((fen.to_string(), options.depth));
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EvalResponse::default()));
        std::future::ready(next)
    }
}
