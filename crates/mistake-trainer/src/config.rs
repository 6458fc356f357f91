//! Trainer configuration from environment variables.
//!
//! Every setting has a default, so a bare run needs no environment at all.
//! `main` loads an optional `.env` file before calling [`TrainerConfig::load`].

use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::TrainerError;
use crate::evaluator::{MistakeThreshold, DEFAULT_MATE_SCORE};
use crate::scanner::ScanSettings;
use crate::session::SessionSettings;

#[derive(Clone, Debug)]
pub struct TrainerConfig {
    /// Lichess account whose games are fetched
    pub username: String,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Maximum number of games to fetch
    pub game_count: usize,

    /// Plies replayed per game
    pub ply_limit: usize,

    /// Evaluation drop that marks a mistake
    pub threshold: MistakeThreshold,

    /// Engine search depth
    pub search_depth: u32,

    /// Centipawn value a forced mate saturates to
    pub mate_score: i32,

    /// Board window size in pixels
    pub board_size: u32,

    /// Stockfish `Threads` option
    pub engine_threads: u32,

    /// Stockfish `Hash` option in MB
    pub engine_hash_mb: u32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            username: "monksc".to_string(),
            stockfish_path: "/usr/games/stockfish".to_string(),
            game_count: 4,
            ply_limit: 14,
            threshold: MistakeThreshold::from_pawns(0.2),
            search_depth: 20,
            mate_score: DEFAULT_MATE_SCORE,
            board_size: 480,
            engine_threads: 1,
            engine_hash_mb: 256,
        }
    }
}

impl TrainerConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, TrainerError> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            username = %config.username,
            stockfish_path = %config.stockfish_path,
            games = config.game_count,
            plies = config.ply_limit,
            threshold = config.threshold.pawns(),
            depth = config.search_depth,
            "Trainer config loaded"
        );
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrainerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let threshold_pawns: f64 = parse_or(&lookup, "MISTAKE_THRESHOLD", defaults.threshold.pawns())?;
        if !threshold_pawns.is_finite() || threshold_pawns < 0.0 {
            return Err(TrainerError::Config(format!(
                "MISTAKE_THRESHOLD must be a non-negative number, got {threshold_pawns}"
            )));
        }

        let board_size: u32 = parse_or(&lookup, "BOARD_SIZE", defaults.board_size)?;
        if board_size < 8 {
            return Err(TrainerError::Config(format!(
                "BOARD_SIZE must be at least 8 pixels, got {board_size}"
            )));
        }

        let mate_score: i32 = parse_or(&lookup, "MATE_SCORE", defaults.mate_score)?;
        if mate_score <= 0 {
            return Err(TrainerError::Config(format!(
                "MATE_SCORE must be positive, got {mate_score}"
            )));
        }

        Ok(Self {
            username: lookup("LICHESS_USERNAME").unwrap_or(defaults.username),
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            game_count: parse_or(&lookup, "GAME_COUNT", defaults.game_count)?,
            ply_limit: parse_or(&lookup, "PLY_LIMIT", defaults.ply_limit)?,
            threshold: MistakeThreshold::from_pawns(threshold_pawns),
            search_depth: parse_or(&lookup, "SEARCH_DEPTH", defaults.search_depth)?,
            mate_score,
            board_size,
            engine_threads: parse_or(&lookup, "ENGINE_THREADS", defaults.engine_threads)?,
            engine_hash_mb: parse_or(&lookup, "ENGINE_HASH_MB", defaults.engine_hash_mb)?,
        })
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            ply_limit: self.ply_limit,
            threshold: self.threshold,
            mate_score: self.mate_score,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            threshold: self.threshold,
            mate_score: self.mate_score,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, TrainerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TrainerError::Config(format!("{key} has an invalid value: {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = TrainerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.username, "monksc");
        assert_eq!(config.game_count, 4);
        assert_eq!(config.ply_limit, 14);
        assert_eq!(config.search_depth, 20);
        assert_eq!(config.mate_score, 100_000);
        assert_eq!(config.board_size, 480);
        assert_eq!(config.threshold.pawns(), 0.2);
    }

    #[test]
    fn test_overrides() {
        let config = TrainerConfig::from_lookup(lookup_from(&[
            ("LICHESS_USERNAME", "someone"),
            ("PLY_LIMIT", " 20 "),
            ("MISTAKE_THRESHOLD", "0.5"),
            ("MATE_SCORE", "30000"),
        ]))
        .unwrap();

        assert_eq!(config.username, "someone");
        assert_eq!(config.ply_limit, 20);
        assert_eq!(config.threshold.pawns(), 0.5);
        assert_eq!(config.scan_settings().mate_score, 30_000);
        assert_eq!(config.session_settings().threshold.pawns(), 0.5);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = TrainerConfig::from_lookup(lookup_from(&[("GAME_COUNT", "four")])).unwrap_err();
        assert!(matches!(err, TrainerError::Config(msg) if msg.contains("GAME_COUNT")));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err =
            TrainerConfig::from_lookup(lookup_from(&[("MISTAKE_THRESHOLD", "-1")])).unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }

    #[test]
    fn test_non_positive_mate_score_rejected() {
        for raw in ["0", "-5"] {
            let err = TrainerConfig::from_lookup(lookup_from(&[("MATE_SCORE", raw)])).unwrap_err();
            assert!(matches!(err, TrainerError::Config(msg) if msg.contains("MATE_SCORE")));
        }
        let config = TrainerConfig::from_lookup(lookup_from(&[("MATE_SCORE", "1")])).unwrap();
        assert_eq!(config.mate_score, 1);
    }

    #[test]
    fn test_tiny_board_rejected() {
        assert!(TrainerConfig::from_lookup(lookup_from(&[("BOARD_SIZE", "4")])).is_err());
    }
}
