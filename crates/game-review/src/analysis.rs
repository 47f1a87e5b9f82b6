//! Move analysis and classification, pure functions only
//! (No network, no board state)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification thresholds (centipawn loss)
const THRESHOLD_EXCELLENT: f64 = 20.0;
const THRESHOLD_GOOD: f64 = 50.0;
const THRESHOLD_INACCURACY: f64 = 100.0;
const THRESHOLD_MISTAKE: f64 = 200.0;

/// Moves before this index with small loss count as book
const BOOK_PLY_LIMIT: usize = 8;
const BOOK_MAX_LOSS: f64 = 30.0;

/// "Excellent" moves below this loss are upgraded to best
const UPGRADE_TO_BEST_LOSS: f64 = 10.0;

/// A move throws away an advantage above `MISS_FROM` and ends below `MISS_TO`
const MISS_FROM: f64 = 200.0;
const MISS_TO: f64 = 100.0;

/// Evaluation substituted for a forced mate when computing loss
pub const MATE_EVAL: f64 = 2000.0;

/// Seed evaluation for the starting position (first-move advantage)
pub const INITIAL_EVAL: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Miss,
    Book,
    Forced,
}

impl MoveClassification {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            MoveClassification::Brilliant => "Brilliant",
            MoveClassification::Great => "Great",
            MoveClassification::Best => "Best",
            MoveClassification::Excellent => "Excellent",
            MoveClassification::Good => "Good",
            MoveClassification::Inaccuracy => "Inaccuracy",
            MoveClassification::Mistake => "Mistake",
            MoveClassification::Blunder => "Blunder",
            MoveClassification::Miss => "Miss",
            MoveClassification::Book => "Book",
            MoveClassification::Forced => "Forced",
        }
    }
}

impl fmt::Display for MoveClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluation converted to White's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedEval {
    /// Positive = good for White. Mates saturate at ±[`MATE_EVAL`].
    pub eval: f64,
    pub mate: Option<i32>,
}

/// Convert a side-to-move score to White's perspective.
///
/// A mate count takes precedence over a centipawn score; with neither the
/// position counts as level. `mate = 0` means the side to move is already
/// mated, so the sign comes from whoever is to move.
pub fn normalize_eval(eval: Option<f64>, mate: Option<i32>, black_to_move: bool) -> NormalizedEval {
    if let Some(m) = mate {
        let white_mate = if black_to_move { -m } else { m };
        let white_wins = match white_mate {
            0 => black_to_move,
            n => n > 0,
        };
        NormalizedEval {
            eval: if white_wins { MATE_EVAL } else { -MATE_EVAL },
            mate: Some(white_mate),
        }
    } else if let Some(e) = eval {
        NormalizedEval {
            eval: if black_to_move { -e } else { e },
            mate: None,
        }
    } else {
        NormalizedEval {
            eval: 0.0,
            mate: None,
        }
    }
}

/// Evaluation lost by the mover, never negative.
pub fn calculate_cp_loss(prev_eval: f64, current_eval: f64, is_white: bool) -> f64 {
    let cp_loss = if is_white {
        prev_eval - current_eval
    } else {
        current_eval - prev_eval
    };
    cp_loss.max(0.0)
}

/// Everything the classification of one move depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveContext {
    pub move_index: usize,
    pub is_white: bool,
    /// Played move equals the engine's suggestion from before the move
    pub matches_best: bool,
    pub prev_eval: f64,
    pub current_eval: f64,
    pub cp_loss: f64,
}

/// Classify a move. Overrides run in a fixed order after the threshold
/// table, so an opening move matching the engine still reads as book and a
/// thrown-away advantage reads as a miss whatever came before.
pub fn classify_move(ctx: &MoveContext) -> MoveClassification {
    let cp_loss = ctx.cp_loss;

    let mut classification = if ctx.matches_best {
        MoveClassification::Best
    } else if cp_loss < THRESHOLD_EXCELLENT {
        MoveClassification::Excellent
    } else if cp_loss < THRESHOLD_GOOD {
        MoveClassification::Good
    } else if cp_loss < THRESHOLD_INACCURACY {
        MoveClassification::Inaccuracy
    } else if cp_loss < THRESHOLD_MISTAKE {
        MoveClassification::Mistake
    } else {
        MoveClassification::Blunder
    };

    if ctx.move_index < BOOK_PLY_LIMIT && cp_loss < BOOK_MAX_LOSS {
        classification = MoveClassification::Book;
    }
    if classification == MoveClassification::Excellent && cp_loss < UPGRADE_TO_BEST_LOSS {
        classification = MoveClassification::Best;
    }

    let missed = if ctx.is_white {
        ctx.prev_eval > MISS_FROM && ctx.current_eval < MISS_TO
    } else {
        ctx.prev_eval < -MISS_FROM && ctx.current_eval > -MISS_TO
    };
    if missed {
        classification = MoveClassification::Miss;
    }

    classification
}

/// Per-side totals over an annotated game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub moves: u32,
    pub total_cp_loss: f64,
    pub avg_cp_loss: f64,
    pub accuracy: f64,
    pub classifications: Classifications,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifications {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub miss: u32,
    pub book: u32,
    pub forced: u32,
}

impl Classifications {
    pub fn record(&mut self, classification: MoveClassification) {
        let slot = match classification {
            MoveClassification::Brilliant => &mut self.brilliant,
            MoveClassification::Great => &mut self.great,
            MoveClassification::Best => &mut self.best,
            MoveClassification::Excellent => &mut self.excellent,
            MoveClassification::Good => &mut self.good,
            MoveClassification::Inaccuracy => &mut self.inaccuracy,
            MoveClassification::Mistake => &mut self.mistake,
            MoveClassification::Blunder => &mut self.blunder,
            MoveClassification::Miss => &mut self.miss,
            MoveClassification::Book => &mut self.book,
            MoveClassification::Forced => &mut self.forced,
        };
        *slot += 1;
    }

    pub fn count(&self, classification: MoveClassification) -> u32 {
        match classification {
            MoveClassification::Brilliant => self.brilliant,
            MoveClassification::Great => self.great,
            MoveClassification::Best => self.best,
            MoveClassification::Excellent => self.excellent,
            MoveClassification::Good => self.good,
            MoveClassification::Inaccuracy => self.inaccuracy,
            MoveClassification::Mistake => self.mistake,
            MoveClassification::Blunder => self.blunder,
            MoveClassification::Miss => self.miss,
            MoveClassification::Book => self.book,
            MoveClassification::Forced => self.forced,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub white: SideSummary,
    pub black: SideSummary,
}

impl SideSummary {
    fn add(&mut self, classification: MoveClassification, cp_loss: f64) {
        self.moves += 1;
        self.total_cp_loss += cp_loss;
        self.classifications.record(classification);
    }

    fn finish(&mut self) {
        self.avg_cp_loss = if self.moves > 0 {
            self.total_cp_loss / self.moves as f64
        } else {
            0.0
        };
        self.accuracy = calculate_accuracy(self.total_cp_loss, self.moves);
    }
}

/// Summarize `(is_white, classification, cp_loss)` triples.
pub fn summarize<I>(moves: I) -> GameSummary
where
    I: IntoIterator<Item = (bool, MoveClassification, f64)>,
{
    let mut summary = GameSummary::default();
    for (is_white, classification, cp_loss) in moves {
        let side = if is_white {
            &mut summary.white
        } else {
            &mut summary.black
        };
        side.add(classification, cp_loss);
    }
    summary.white.finish();
    summary.black.finish();
    summary
}

pub fn calculate_accuracy(total_cp_loss: f64, move_count: u32) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    let acpl = total_cp_loss / move_count as f64;
    let accuracy = 100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}
