//! Review configuration from environment variables

use std::env;
use std::time::Duration;

use tracing::info;

use crate::analyzer::FailurePolicy;
use crate::error::ReviewError;

pub const DEFAULT_CHESS_API_URL: &str = "https://chess-api.com/v1";
pub const DEFAULT_CHESS_COM_API_URL: &str = "https://api.chess.com/pub";

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Evaluation service endpoint (POST)
    pub chess_api_url: String,

    /// Chess.com public API base URL
    pub chess_com_api_url: String,

    /// Search depth for interactive single-position analysis
    pub live_depth: u32,

    /// Search depth for full-game analysis
    pub bulk_depth: u32,

    /// Number of candidate lines requested
    pub variants: u32,

    /// Quiet period before an interactive request is sent
    pub debounce_ms: u64,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// What to do when an evaluation fails mid-game
    pub failure_policy: FailurePolicy,

    pub user_agent: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            chess_api_url: DEFAULT_CHESS_API_URL.to_string(),
            chess_com_api_url: DEFAULT_CHESS_COM_API_URL.to_string(),
            live_depth: 16,
            bulk_depth: 14,
            variants: 1,
            debounce_ms: 600,
            request_timeout_secs: 30,
            failure_policy: FailurePolicy::default(),
            user_agent: "ChessReview/1.0".to_string(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self, ReviewError> {
        let defaults = Self::default();

        let chess_api_url = env::var("CHESS_API_URL").unwrap_or(defaults.chess_api_url);
        let chess_com_api_url =
            env::var("CHESS_COM_API_URL").unwrap_or(defaults.chess_com_api_url);

        let live_depth = parse_var("LIVE_DEPTH").unwrap_or(defaults.live_depth);
        let bulk_depth = parse_var("BULK_DEPTH").unwrap_or(defaults.bulk_depth);
        let variants = parse_var("VARIANTS").unwrap_or(defaults.variants);
        if live_depth == 0 || bulk_depth == 0 || variants == 0 {
            return Err(ReviewError::Config("depths and variants must be positive"));
        }

        let debounce_ms = parse_var("DEBOUNCE_MS").unwrap_or(defaults.debounce_ms);
        let request_timeout_secs =
            parse_var("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout_secs);

        let retry_attempts = parse_var("RETRY_ATTEMPTS").unwrap_or(2);
        let retry_backoff_ms = parse_var("RETRY_BACKOFF_MS").unwrap_or(500);
        let failure_policy = match env::var("FAILURE_POLICY") {
            Ok(name) => FailurePolicy::from_name(
                &name,
                retry_attempts,
                Duration::from_millis(retry_backoff_ms),
            )
            .ok_or(ReviewError::Config(
                "FAILURE_POLICY must be one of abort, skip, retry",
            ))?,
            Err(_) => FailurePolicy::Retry {
                attempts: retry_attempts,
                backoff: Duration::from_millis(retry_backoff_ms),
            },
        };

        let user_agent = env::var("USER_AGENT").unwrap_or(defaults.user_agent);

        info!(
            chess_api_url = %chess_api_url,
            live_depth,
            bulk_depth,
            ?failure_policy,
            "Review config loaded"
        );

        Ok(Self {
            chess_api_url,
            chess_com_api_url,
            live_depth,
            bulk_depth,
            variants,
            debounce_ms,
            request_timeout_secs,
            failure_policy,
            user_agent,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
