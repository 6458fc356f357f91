pub mod board_view;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lichess;
pub mod scanner;
pub mod session;
pub mod stockfish;
