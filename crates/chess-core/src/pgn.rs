//! PGN parsing: mainline SAN moves and player tags via `pgn-reader`.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use thiserror::Error;

use crate::game_data::{GameRecord, Players};

#[derive(Debug, Error)]
pub enum PgnError {
    #[error("PGN read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PGN contains no game")]
    Empty,
}

/// Movetext state: tags seen so far plus the mainline.
struct Mainline {
    players: Players,
    moves: Vec<String>,
}

/// Visitor that keeps the mainline and drops variations.
struct MainlineCollector;

impl Visitor for MainlineCollector {
    type Tags = Players;
    type Movetext = Mainline;
    type Output = Mainline;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Players::default())
    }

    fn tag(&mut self, tags: &mut Players, name: &[u8], value: RawTag<'_>) -> ControlFlow<Self::Output> {
        match name {
            b"White" => tags.white = value.decode_utf8_lossy().into_owned(),
            b"Black" => tags.black = value.decode_utf8_lossy().into_owned(),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, players: Players) -> ControlFlow<Self::Output, Mainline> {
        ControlFlow::Continue(Mainline {
            players,
            moves: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _: &mut Mainline) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, mainline: &mut Mainline, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        mainline.moves.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, mainline: Mainline) -> Self::Output {
        mainline
    }
}

/// Parse the first game of a PGN string into a `GameRecord`.
pub fn parse_pgn(id: &str, pgn: &str) -> Result<GameRecord, PgnError> {
    if pgn.trim().is_empty() {
        return Err(PgnError::Empty);
    }

    let mut reader = Reader::new(pgn.as_bytes());
    let mainline = reader
        .read_game(&mut MainlineCollector)?
        .ok_or(PgnError::Empty)?;

    Ok(GameRecord {
        id: id.to_string(),
        players: mainline.players,
        moves: mainline.moves,
    })
}
