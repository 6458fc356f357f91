//! Position evaluation seam and score normalization.
//!
//! Engines report scores relative to the side to move. Everything downstream
//! compares scores from White's point of view in centipawns, with forced
//! mates saturated to a configurable magnitude.

use chess_core::replay::fen_of;
use shakmaty::{Chess, Color, Position};

use crate::error::TrainerError;

/// Default centipawn value of a forced mate.
pub const DEFAULT_MATE_SCORE: i32 = 100_000;

/// Engine score, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; positive = side to move mates, 0 = side to move is mated
    Mate(i32),
}

impl Score {
    /// Signed centipawns from White's point of view.
    pub fn white_cp(self, side_to_move: Color, mate_score: i32) -> i32 {
        let relative = match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(n) if n > 0 => mate_score,
            Score::Mate(_) => -mate_score,
        };
        match side_to_move {
            Color::White => relative,
            Color::Black => -relative,
        }
    }
}

/// Result of one engine search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Best move in UCI notation, `None` when the side to move has no moves
    pub best_move: Option<String>,
    pub score: Score,
}

/// Anything that can search a position given as FEN.
#[allow(async_fn_in_trait)]
pub trait Evaluator {
    async fn analyse(&mut self, fen: &str) -> Result<Analysis, TrainerError>;
}

/// Analysis with the score already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub best_move: Option<String>,
    pub white_cp: i32,
}

pub async fn evaluate<E: Evaluator>(
    engine: &mut E,
    pos: &Chess,
    mate_score: i32,
) -> Result<Evaluation, TrainerError> {
    let analysis = engine.analyse(&fen_of(pos)).await?;
    Ok(Evaluation {
        white_cp: analysis.score.white_cp(pos.turn(), mate_score),
        best_move: analysis.best_move,
    })
}

/// Evaluation drop that separates mistakes from ordinary moves, in pawns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MistakeThreshold {
    pawns: f64,
}

impl MistakeThreshold {
    pub fn from_pawns(pawns: f64) -> Self {
        Self { pawns }
    }

    pub fn pawns(self) -> f64 {
        self.pawns
    }

    /// Drop (in centipawns) a move must exceed to count as a mistake.
    pub fn cutoff_cp(self) -> f64 {
        snap(100.0 * self.pawns)
    }

    /// Largest |delta| (in centipawns) a non-best move may cost and still pass.
    pub fn tolerance_cp(self) -> f64 {
        snap(100.0 * 1.5 * self.pawns / 2.0)
    }

    pub fn is_mistake(self, delta_cp: i32) -> bool {
        f64::from(delta_cp) < -self.cutoff_cp()
    }

    pub fn is_acceptable(self, delta_cp: i32) -> bool {
        f64::from(delta_cp).abs() < self.tolerance_cp()
    }
}

/// Drop float noise so 0.2 pawns compares as exactly 20 cp.
fn snap(cp: f64) -> f64 {
    (cp * 1e6).round() / 1e6
}
