#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chess_core::Replay;
use game_review::{EvalOptions, EvalResponse, Evaluator, EvaluatorError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Evaluator answering per FEN, with optional scripted failures.
///
/// Unknown positions get a bare response (no eval, no mate, no move).
#[derive(Default)]
pub struct ScriptedEvaluator {
    by_fen: HashMap<String, EvalResponse>,
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, fen: &str, resp: EvalResponse) -> Self {
        self.by_fen.insert(fen.to_string(), resp);
        self
    }

    /// Fail the next `times` requests for `fen` with HTTP 503.
    pub fn fail(self, fen: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(fen.to_string(), times);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, fen: &str) -> Result<EvalResponse, EvaluatorError> {
        self.calls.lock().unwrap().push(fen.to_string());
        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(fen) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EvaluatorError::Status(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                ));
            }
        }
        Ok(self.by_fen.get(fen).cloned().unwrap_or_default())
    }
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(
        &self,
        fen: &str,
        _options: EvalOptions,
    ) -> impl Future<Output = Result<EvalResponse, EvaluatorError>> + Send {
        let fen = fen.to_string();
        async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let result = self.answer(&fen);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

pub fn cp(eval: f64, best: &str) -> EvalResponse {
    EvalResponse {
        eval: Some(eval),
        best_move: Some(best.to_string()),
        ..Default::default()
    }
}

pub fn mate(n: i32) -> EvalResponse {
    EvalResponse {
        mate: Some(n),
        ..Default::default()
    }
}

pub fn sans(moves: &str) -> Vec<String> {
    moves.split_whitespace().map(str::to_string).collect()
}

/// FEN after each move, replayed from the standard start.
pub fn fens_after(moves: &[String]) -> Vec<String> {
    let mut replay = Replay::new();
    moves
        .iter()
        .map(|san| replay.play_san(san).expect("legal move").fen_after)
        .collect()
}

/// Serve one canned JSON body to every request. Returns the base URL and a
/// handle yielding the request bodies received.
pub async fn json_server(status: u16, body: &str) -> (String, tokio::sync::mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let body = body.to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);
            let reply = format!(
                "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (base, rx)
}

/// Read one HTTP request and return its body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text[..split]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= split + 4 + length {
                return String::from_utf8_lossy(&buf[split + 4..split + 4 + length]).to_string();
            }
        }
    }
    String::new()
}
