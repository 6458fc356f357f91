#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use chess_core::replay::fen_of;
use mistake_trainer::error::TrainerError;
use mistake_trainer::evaluator::{Analysis, Evaluator, Score};
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position};

/// Evaluator answering from a table keyed by FEN.
///
/// Unknown positions score 0 with no best move.
#[derive(Default)]
pub struct ScriptedEvaluator {
    analyses: HashMap<String, Analysis>,
    failing: HashSet<String>,
    pub calls: Vec<String>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a position using a White-relative centipawn score.
    pub fn set_white_cp(&mut self, pos: &Chess, white_cp: i32, best_move: Option<&str>) {
        let relative = match pos.turn() {
            Color::White => white_cp,
            Color::Black => -white_cp,
        };
        self.set_score(pos, Score::Centipawns(relative), best_move);
    }

    /// Script a position with a raw (side-to-move relative) score.
    pub fn set_score(&mut self, pos: &Chess, score: Score, best_move: Option<&str>) {
        self.analyses.insert(
            fen_of(pos),
            Analysis {
                best_move: best_move.map(String::from),
                score,
            },
        );
    }

    pub fn fail_at(&mut self, pos: &Chess) {
        self.failing.insert(fen_of(pos));
    }
}

impl Evaluator for ScriptedEvaluator {
    async fn analyse(&mut self, fen: &str) -> Result<Analysis, TrainerError> {
        self.calls.push(fen.to_string());
        if self.failing.contains(fen) {
            return Err(TrainerError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(self.analyses.get(fen).cloned().unwrap_or(Analysis {
            best_move: None,
            score: Score::Centipawns(0),
        }))
    }
}

/// Split a space-separated SAN line.
pub fn moves(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// Play a UCI move on a copy of `pos`.
pub fn play(pos: &Chess, uci: &str) -> Chess {
    let uci_move: UciMove = uci.parse().expect("valid UCI");
    let mv = uci_move.to_move(pos).expect("legal move");
    let mut next = pos.clone();
    next.play_unchecked(mv);
    next
}
