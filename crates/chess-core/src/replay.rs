//! Move replay over shakmaty positions.
//!
//! The scanner and the verification session both derive positions through
//! these helpers so a given move prefix always yields the same FEN.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Invalid FEN '{fen}': {reason}")]
    Fen { fen: String, reason: String },

    #[error("Invalid SAN '{san}' at ply {ply}")]
    Syntax { ply: usize, san: String },

    #[error("Illegal move '{san}' at ply {ply}")]
    Illegal { ply: usize, san: String },
}

/// FEN of a position, en passant square only when the capture is legal.
pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn position_from_fen(fen: &str) -> Result<Chess, ReplayError> {
    let parsed: Fen = fen.parse().map_err(|e| ReplayError::Fen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| ReplayError::Fen {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })
}

/// One replayed half-move.
#[derive(Debug, Clone)]
pub struct ReplayedPly {
    /// 1-based ply index.
    pub ply: usize,
    pub san: String,
    pub fen_before: String,
    pub before: Chess,
    pub after: Chess,
}

/// Iterator replaying SAN moves from the standard starting position.
///
/// Yields an error item for the first move that cannot be parsed or played
/// and stops afterwards.
pub struct Replay<'a> {
    moves: std::slice::Iter<'a, String>,
    pos: Chess,
    ply: usize,
    done: bool,
}

impl<'a> Replay<'a> {
    pub fn new(moves: &'a [String]) -> Self {
        Self {
            moves: moves.iter(),
            pos: Chess::default(),
            ply: 0,
            done: false,
        }
    }

    fn step(&mut self, san_str: &str) -> Result<ReplayedPly, ReplayError> {
        let ply = self.ply + 1;
        let san: San = san_str
            .parse::<SanPlus>()
            .map(|s| s.san)
            .map_err(|_| ReplayError::Syntax {
                ply,
                san: san_str.to_string(),
            })?;
        let mv: Move = san.to_move(&self.pos).map_err(|_| ReplayError::Illegal {
            ply,
            san: san_str.to_string(),
        })?;

        let before = self.pos.clone();
        let fen_before = fen_of(&before);
        let san = SanPlus::from_move_and_play_unchecked(&mut self.pos, mv).to_string();
        self.ply = ply;

        Ok(ReplayedPly {
            ply,
            san,
            fen_before,
            before,
            after: self.pos.clone(),
        })
    }
}

impl Iterator for Replay<'_> {
    type Item = Result<ReplayedPly, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let san_str = self.moves.next()?;
        let result = self.step(san_str.trim());
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Position after the first `plies` moves of `moves`.
pub fn position_after(moves: &[String], plies: usize) -> Result<Chess, ReplayError> {
    let mut pos = Chess::default();
    for replayed in Replay::new(moves).take(plies) {
        pos = replayed?.after;
    }
    Ok(pos)
}
