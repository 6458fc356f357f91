use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub white: String,
    pub black: String,
}

/// A finished game as delivered by the game source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub players: Players,
    pub moves: Vec<String>, // SAN notation, mainline only
}

impl GameRecord {
    pub fn new(id: impl Into<String>, moves: Vec<String>) -> Self {
        Self {
            id: id.into(),
            players: Players::default(),
            moves,
        }
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }
}
