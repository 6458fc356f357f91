//! macroquad board for verification sessions.
//!
//! One window is shared by all sessions. Closing the window ends the current
//! session and shows the next mistake; Escape ends the whole run.

use macroquad::prelude::*;
use shakmaty::{File, Position, Rank, Square};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use crate::error::TrainerError;
use crate::evaluator::Evaluator;
use crate::scanner::MistakeRecord;
use crate::session::{ClickOutcome, SessionSettings, VerificationSession};

const LIGHT_SQUARE: u32 = 0xEEEEEE;
const DARK_SQUARE: u32 = 0x999999;
const SELECTED_OUTLINE: u32 = 0x2F7BD6;
const REJECTED_TINT: Color = Color::new(0.85, 0.15, 0.15, 0.25);

/// Board square under a pixel, rank 8 on the top row.
pub fn square_at(x: f32, y: f32, board_size: u32) -> Option<Square> {
    let cell = board_size / 8;
    if cell == 0 || x < 0.0 || y < 0.0 {
        return None;
    }
    let col = x as u32 / cell;
    let row = y as u32 / cell;
    if col > 7 || row > 7 {
        return None;
    }
    Some(Square::from_coords(File::new(col), Rank::new(7 - row)))
}

/// Top-left pixel of a square's cell.
pub fn cell_origin(square: Square, board_size: u32) -> (f32, f32) {
    let cell = (board_size / 8) as f32;
    let col = square.file() as u32;
    let row = 7 - square.rank() as u32;
    (col as f32 * cell, row as f32 * cell)
}

/// Fraction of sessions done, `None` when there is nothing to review.
pub fn session_progress(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(count as f64 / total as f64)
}

pub fn window_conf(board_size: u32) -> Conf {
    let side = (board_size / 8 * 8) as i32;
    Conf {
        window_title: "Mistake Trainer".to_string(),
        window_width: side,
        window_height: side,
        window_resizable: false,
        ..Default::default()
    }
}

enum SessionEnd {
    Closed,
    Exit,
}

/// Present every mistake in turn, one session at a time.
pub async fn run_sessions<E: Evaluator>(
    runtime: &Runtime,
    engine: &mut E,
    mistakes: &[MistakeRecord],
    settings: SessionSettings,
    board_size: u32,
) {
    prevent_quit();
    let total = mistakes.len();

    for (index, mistake) in mistakes.iter().enumerate() {
        info!("{mistake}");

        let mut session = match VerificationSession::new(&mistake.fen_before, settings) {
            Ok(s) => s,
            Err(e) => {
                warn!(game_id = %mistake.game_id, error = %e, "Skipping mistake with bad position");
                continue;
            }
        };

        match run_session(runtime, engine, &mut session, board_size).await {
            Ok(SessionEnd::Closed) => {}
            Ok(SessionEnd::Exit) => {
                info!("Run ended by user");
                return;
            }
            Err(e) => {
                error!(error = %e, "Session failed");
                return;
            }
        }

        let count = index + 1;
        if let Some(progress) = session_progress(count, total) {
            info!(count, total, progress, "Session finished");
        }

        // Let the close request clear before the next session starts
        next_frame().await;
    }
}

async fn run_session<E: Evaluator>(
    runtime: &Runtime,
    engine: &mut E,
    session: &mut VerificationSession,
    board_size: u32,
) -> Result<SessionEnd, TrainerError> {
    loop {
        if is_quit_requested() {
            return Ok(SessionEnd::Closed);
        }
        if is_key_pressed(KeyCode::Escape) {
            return Ok(SessionEnd::Exit);
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            if let Some(square) = square_at(x, y, board_size) {
                let outcome = runtime.block_on(session.click(engine, square))?;
                if let ClickOutcome::Illegal { from, to } = outcome {
                    info!(%from, %to, "Move discarded");
                }
            }
        }

        draw_session(session, board_size);
        next_frame().await;
    }
}

fn draw_session(session: &VerificationSession, board_size: u32) {
    let cell = (board_size / 8) as f32;
    clear_background(Color::from_hex(DARK_SQUARE));

    for row in 0..8u32 {
        for col in 0..8u32 {
            let fill = if (row + col) % 2 == 0 { LIGHT_SQUARE } else { DARK_SQUARE };
            draw_rectangle(col as f32 * cell, row as f32 * cell, cell, cell, Color::from_hex(fill));
        }
    }

    if session.undo_pending() {
        draw_rectangle(0.0, 0.0, cell * 8.0, cell * 8.0, REJECTED_TINT);
    }

    if let Some(square) = session.selected() {
        let (x, y) = cell_origin(square, board_size);
        draw_rectangle_lines(x, y, cell, cell, 4.0, Color::from_hex(SELECTED_OUTLINE));
    }

    let board = session.position().board();
    let font_size = (cell * 0.55) as u16;
    for square in Square::ALL {
        let Some(piece) = board.piece_at(square) else {
            continue;
        };
        let (x, y) = cell_origin(square, board_size);
        let (cx, cy) = (x + cell / 2.0, y + cell / 2.0);
        let (body, ink) = if piece.color.is_white() {
            (WHITE, BLACK)
        } else {
            (BLACK, WHITE)
        };

        draw_circle(cx, cy, cell * 0.38, body);
        draw_circle_lines(cx, cy, cell * 0.38, 2.0, BLACK);

        let label = piece.role.upper_char().to_string();
        let dims = measure_text(&label, None, font_size, 1.0);
        draw_text(
            &label,
            cx - dims.width / 2.0,
            cy + dims.offset_y / 2.0,
            font_size as f32,
            ink,
        );
    }
}
