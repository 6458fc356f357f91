//! Trainer error types

use chess_core::pgn::PgnError;
use chess_core::replay::ReplayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lichess error: {0}")]
    Lichess(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("PGN error: {0}")]
    Pgn(#[from] PgnError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
