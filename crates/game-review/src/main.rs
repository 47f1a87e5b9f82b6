//! Game review CLI
//!
//! Imports a game (file, stdin or Chess.com), runs the full-game analysis
//! against the evaluation service and prints the result as JSON on stdout.
//! Logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chess_core::{import_game, GameHeader, LoadedGame};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use game_review::analysis::GameSummary;
use game_review::clients::ChessComClient;
use game_review::{
    analyze_game_moves, AnalysisStatus, AnnotatedMove, ChessApiClient, EvalOptions,
    FailurePolicy, GameReview, LiveAnalysis, PipelineOptions, ReviewConfig, ReviewError,
};

#[derive(Parser)]
#[command(name = "game-review")]
#[command(about = "Move-by-move chess game review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a PGN or FEN read from a file ("-" for stdin)
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Evaluate a single position
    Eval {
        /// Position in FEN
        fen: String,
    },
    /// List a Chess.com user's recent games
    Games { username: String },
    /// Analyze one of a Chess.com user's recent games
    Review {
        username: String,
        /// Index in the recent games list, 0 = newest
        #[arg(short, long, default_value = "0")]
        game: usize,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Search depth per position
    #[arg(short, long)]
    depth: Option<u32>,
    /// What to do when an evaluation fails mid-game
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Abort,
    Skip,
    Retry,
}

impl RunArgs {
    fn apply(&self, config: &mut ReviewConfig) {
        if let Some(depth) = self.depth {
            config.bulk_depth = depth.max(1);
        }
        if let Some(policy) = self.policy {
            config.failure_policy = match policy {
                PolicyArg::Abort => FailurePolicy::Abort,
                PolicyArg::Skip => FailurePolicy::Skip,
                PolicyArg::Retry => match &config.failure_policy {
                    retry @ FailurePolicy::Retry { .. } => retry.clone(),
                    _ => FailurePolicy::default(),
                },
            };
        }
    }
}

#[derive(Serialize)]
struct ReviewReport<'a> {
    header: &'a GameHeader,
    moves: &'a [AnnotatedMove],
    summary: GameSummary,
    status: AnalysisStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = ReviewConfig::load()?;

    match cli.command {
        Commands::Analyze { input, run } => {
            run.apply(&mut config);
            let text = read_input(&input)?;
            let game = import_game(&text)?.into_game();
            review_game(&config, &game).await
        }
        Commands::Eval { fen } => evaluate_position(&config, &fen).await,
        Commands::Games { username } => list_games(&config, &username).await,
        Commands::Review {
            username,
            game,
            run,
        } => {
            run.apply(&mut config);
            let client = ChessComClient::from_config(&config)?;
            let games = client.fetch_recent_games(&username).await?;
            let Some(chosen) = games.get(game) else {
                bail!("{username} has {} recent games, no game {game}", games.len());
            };
            info!(url = %chosen.url, "Reviewing game");
            let loaded = import_game(&chosen.pgn)?.into_game();
            review_game(&config, &loaded).await
        }
    }
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

async fn review_game(config: &ReviewConfig, game: &LoadedGame) -> anyhow::Result<()> {
    let evaluator = ChessApiClient::from_config(config)?;
    let options = PipelineOptions::from_config(config);

    let cancel = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let cancel = Arc::clone(&cancel);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing current move");
                cancel.store(true, Ordering::Relaxed);
            }
        }
    });

    info!(
        white = %game.header.white,
        black = %game.header.black,
        moves = game.history.len(),
        "Analyzing game"
    );

    let result = analyze_game_moves(
        &evaluator,
        &game.start_fen,
        &game.history,
        &options,
        &cancel,
        |p| info!(percent = p.percent, analyzed = p.analyzed, "Progress"),
    )
    .await;

    let review = match result {
        Ok(review) => review,
        Err(ReviewError::Evaluator {
            index,
            source,
            partial,
        }) => {
            warn!(index, analyzed = partial.len(), "Analysis aborted");
            print_report(&game.header, &GameReview::aborted(partial))?;
            return Err(source).with_context(|| format!("Evaluation of move {index} failed"));
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&game.header, &review)
}

fn print_report(header: &GameHeader, review: &GameReview) -> anyhow::Result<()> {
    let report = ReviewReport {
        header,
        moves: &review.moves,
        summary: review.summary(),
        status: review.status,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn evaluate_position(config: &ReviewConfig, fen: &str) -> anyhow::Result<()> {
    chess_core::Replay::from_fen(fen)?;

    let evaluator = Arc::new(ChessApiClient::from_config(config)?);
    let live = LiveAnalysis::new(
        evaluator,
        Duration::ZERO,
        EvalOptions {
            depth: config.live_depth,
            variants: config.variants,
        },
    );
    live.position_changed(fen, None);
    let mut rx = live.subscribe();

    let wait = config.request_timeout() + Duration::from_secs(1);
    tokio::time::timeout(wait, rx.wait_for(|state| !state.is_analyzing))
        .await
        .context("No final evaluation received")??;

    println!("{}", serde_json::to_string_pretty(&live.snapshot())?);
    Ok(())
}

async fn list_games(config: &ReviewConfig, username: &str) -> anyhow::Result<()> {
    let client = ChessComClient::from_config(config)?;
    let games = client.fetch_recent_games(username).await?;

    if games.is_empty() {
        println!("No recent games for {username}");
        return Ok(());
    }

    for (idx, game) in games.iter().enumerate() {
        let date = game
            .ended_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let outcome = if game.won_by(username) { "won" } else { "lost/draw" };
        println!(
            "{idx:>3}  {} ({}) vs {} ({})  {outcome:<9}  {date}  {}",
            game.white.username,
            game.white.rating,
            game.black.username,
            game.black.rating,
            game.time_control,
        );
    }
    Ok(())
}
