//! Mistake detection over the opening plies of fetched games.

use std::fmt;

use chess_core::game_data::GameRecord;
use chess_core::replay::Replay;
use tracing::{debug, info, warn};

use crate::error::TrainerError;
use crate::evaluator::{evaluate, Evaluator, MistakeThreshold};

#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Plies replayed per game
    pub ply_limit: usize,
    pub threshold: MistakeThreshold,
    pub mate_score: i32,
}

/// A move whose evaluation drop crossed the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistakeRecord {
    pub game_id: String,
    /// 1-based ply index
    pub ply: usize,
    pub san: String,
    pub fen_before: String,
    /// eval(after) - eval(before), White's point of view, centipawns
    pub delta_cp: i32,
}

impl MistakeRecord {
    pub fn delta_pawns(&self) -> f64 {
        f64::from(self.delta_cp) / 100.0
    }
}

impl fmt::Display for MistakeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game {} | Ply {} | Move {} | Eval drop {:+.2}",
            self.game_id,
            self.ply,
            self.san,
            self.delta_pawns()
        )
    }
}

pub struct MistakeScanner {
    settings: ScanSettings,
}

impl MistakeScanner {
    pub fn new(settings: ScanSettings) -> Self {
        Self { settings }
    }

    /// Scan every game; a game that fails part-way keeps the mistakes found so far.
    pub async fn scan<E: Evaluator>(
        &self,
        engine: &mut E,
        games: &[GameRecord],
    ) -> Vec<MistakeRecord> {
        let mut mistakes = Vec::new();

        for game in games {
            let found_before = mistakes.len();
            match self.scan_game(engine, game, &mut mistakes).await {
                Ok(()) => info!(
                    game_id = %game.id,
                    white = %game.players.white,
                    black = %game.players.black,
                    plies = game.ply_count().min(self.settings.ply_limit),
                    mistakes = mistakes.len() - found_before,
                    "Game scanned"
                ),
                Err(e) => warn!(game_id = %game.id, error = %e, "Stopped scanning game"),
            }
        }

        mistakes
    }

    async fn scan_game<E: Evaluator>(
        &self,
        engine: &mut E,
        game: &GameRecord,
        mistakes: &mut Vec<MistakeRecord>,
    ) -> Result<(), TrainerError> {
        let mate_score = self.settings.mate_score;
        // Eval after ply n doubles as the eval before ply n+1, so each
        // position is searched once and consecutive deltas share an endpoint.
        let mut carried: Option<i32> = None;

        for replayed in Replay::new(&game.moves).take(self.settings.ply_limit) {
            let ply = replayed?;

            let cp_before = match carried {
                Some(cp) => cp,
                None => evaluate(engine, &ply.before, mate_score).await?.white_cp,
            };
            let cp_after = evaluate(engine, &ply.after, mate_score).await?.white_cp;
            carried = Some(cp_after);

            let delta = cp_after.saturating_sub(cp_before);
            debug!(game_id = %game.id, ply = ply.ply, san = %ply.san, cp_before, cp_after, delta, "Ply evaluated");

            if self.settings.threshold.is_mistake(delta) {
                let record = MistakeRecord {
                    game_id: game.id.clone(),
                    ply: ply.ply,
                    san: ply.san,
                    fen_before: ply.fen_before,
                    delta_cp: delta,
                };
                info!("Mistake found: {record}");
                mistakes.push(record);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let record = MistakeRecord {
            game_id: "abcd1234".into(),
            ply: 7,
            san: "Qh5".into(),
            fen_before: String::new(),
            delta_cp: -135,
        };
        assert_eq!(
            record.to_string(),
            "Game abcd1234 | Ply 7 | Move Qh5 | Eval drop -1.35"
        );
    }
}
