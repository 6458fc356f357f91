//! Click-driven verification of one flagged position.
//!
//! The session owns its board and reacts to square clicks only; rendering and
//! pixel mapping live in `board_view`. A rejected move stays on the board
//! until the next click, which undoes it instead of being read as input.

use chess_core::replay::{fen_of, position_from_fen};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Position, Role, Square};
use tracing::{info, warn};

use crate::error::TrainerError;
use crate::evaluator::{evaluate, Evaluator, MistakeThreshold};

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub threshold: MistakeThreshold,
    pub mate_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Selecting,
    AwaitingTarget(Square),
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Empty square clicked with nothing selected
    Ignored,
    Selected(Square),
    /// The previously rejected move was taken back
    Undone,
    Illegal { from: Square, to: Square },
    /// Matches the engine's first choice
    BestMove { uci: String },
    /// Not the best move, but close enough in evaluation
    Accepted { uci: String, delta_cp: i32 },
    /// Shown on the board, undone by the next click
    Rejected {
        uci: String,
        best_move: Option<String>,
        delta_cp: i32,
    },
}

impl ClickOutcome {
    pub fn changes_board(&self) -> bool {
        matches!(
            self,
            ClickOutcome::Undone
                | ClickOutcome::BestMove { .. }
                | ClickOutcome::Accepted { .. }
                | ClickOutcome::Rejected { .. }
        )
    }
}

pub struct VerificationSession {
    position: Chess,
    history: Vec<Chess>,
    state: SelectionState,
    undo_pending: bool,
    settings: SessionSettings,
}

impl VerificationSession {
    pub fn new(fen: &str, settings: SessionSettings) -> Result<Self, TrainerError> {
        Ok(Self::from_position(position_from_fen(fen)?, settings))
    }

    pub fn from_position(position: Chess, settings: SessionSettings) -> Self {
        Self {
            position,
            history: Vec::new(),
            state: SelectionState::Selecting,
            undo_pending: false,
            settings,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn fen(&self) -> String {
        fen_of(&self.position)
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> Option<Square> {
        match self.state {
            SelectionState::AwaitingTarget(sq) => Some(sq),
            SelectionState::Selecting => None,
        }
    }

    pub fn undo_pending(&self) -> bool {
        self.undo_pending
    }

    /// Moves currently applied on top of the starting position.
    pub fn moves_played(&self) -> usize {
        self.history.len()
    }

    /// Feed one click on `square` through the state machine.
    pub async fn click<E: Evaluator>(
        &mut self,
        engine: &mut E,
        square: Square,
    ) -> Result<ClickOutcome, TrainerError> {
        if self.undo_pending {
            self.undo();
            self.undo_pending = false;
            self.state = SelectionState::Selecting;
            info!(fen = %self.fen(), "Move taken back");
            return Ok(ClickOutcome::Undone);
        }

        match self.state {
            SelectionState::Selecting => {
                if self.position.board().piece_at(square).is_some() {
                    self.state = SelectionState::AwaitingTarget(square);
                    Ok(ClickOutcome::Selected(square))
                } else {
                    Ok(ClickOutcome::Ignored)
                }
            }
            SelectionState::AwaitingTarget(from) => {
                self.state = SelectionState::Selecting;
                self.attempt(engine, from, square).await
            }
        }
    }

    async fn attempt<E: Evaluator>(
        &mut self,
        engine: &mut E,
        from: Square,
        to: Square,
    ) -> Result<ClickOutcome, TrainerError> {
        let Some(candidate) = legal_candidate(&self.position, from, to) else {
            info!(%from, %to, "Tried move is not legal");
            return Ok(ClickOutcome::Illegal { from, to });
        };
        let uci = candidate.to_uci(CastlingMode::Standard).to_string();

        let mate_score = self.settings.mate_score;
        let before = evaluate(engine, &self.position, mate_score).await?;
        let best = before
            .best_move
            .as_deref()
            .and_then(|b| parse_legal_uci(&self.position, b));

        if best.as_ref() == Some(&candidate) {
            self.push(candidate);
            info!(%uci, "Correct move");
            return Ok(ClickOutcome::BestMove { uci });
        }

        self.push(candidate);
        let after = evaluate(engine, &self.position, mate_score).await?;
        let delta_cp = after.white_cp.saturating_sub(before.white_cp);

        if self.settings.threshold.is_acceptable(delta_cp) {
            info!(
                %uci,
                best_move = before.best_move.as_deref().unwrap_or("-"),
                delta_cp,
                cp_before = before.white_cp,
                cp_after = after.white_cp,
                "Good enough"
            );
            Ok(ClickOutcome::Accepted { uci, delta_cp })
        } else {
            self.undo_pending = true;
            warn!(
                %uci,
                best_move = before.best_move.as_deref().unwrap_or("-"),
                delta_cp,
                cp_before = before.white_cp,
                cp_after = after.white_cp,
                "Wrong move"
            );
            Ok(ClickOutcome::Rejected {
                uci,
                best_move: before.best_move,
                delta_cp,
            })
        }
    }

    fn push(&mut self, mv: Move) {
        self.history.push(self.position.clone());
        self.position.play_unchecked(mv);
    }

    fn undo(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.position = previous;
        }
    }
}

/// Legal move for an origin/target pair; a pawn reaching the last rank
/// promotes to a queen.
fn legal_candidate(pos: &Chess, from: Square, to: Square) -> Option<Move> {
    let plain = UciMove::Normal {
        from,
        to,
        promotion: None,
    };
    plain.to_move(pos).ok().or_else(|| {
        UciMove::Normal {
            from,
            to,
            promotion: Some(Role::Queen),
        }
        .to_move(pos)
        .ok()
    })
}

fn parse_legal_uci(pos: &Chess, uci: &str) -> Option<Move> {
    let uci_move: UciMove = uci.parse().ok()?;
    uci_move.to_move(pos).ok()
}
