//! Mistake Trainer
//!
//! Fetches a player's recent Lichess games, flags opening moves that lost
//! evaluation, and replays each flagged position on a clickable board.

use mistake_trainer::board_view;
use mistake_trainer::config::TrainerConfig;
use mistake_trainer::lichess::LichessClient;
use mistake_trainer::scanner::{MistakeRecord, MistakeScanner};
use mistake_trainer::stockfish::{EngineOptions, StockfishEngine};
use rand::seq::SliceRandom;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local overrides
    let _ = dotenvy::dotenv();

    let config = TrainerConfig::load()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (mut engine, mut mistakes) = runtime.block_on(find_mistakes(&config))?;

    if mistakes.is_empty() {
        info!("No mistakes found");
        runtime.block_on(engine.quit());
        return Ok(());
    }

    mistakes.shuffle(&mut rand::rng());
    info!(count = mistakes.len(), "Mistakes to review");

    let settings = config.session_settings();
    let board_size = config.board_size;

    macroquad::Window::from_config(board_view::window_conf(board_size), async move {
        board_view::run_sessions(&runtime, &mut engine, &mistakes, settings, board_size).await;
        runtime.block_on(engine.quit());
    });

    Ok(())
}

/// Spawn the engine, fetch games and scan them.
async fn find_mistakes(
    config: &TrainerConfig,
) -> anyhow::Result<(StockfishEngine, Vec<MistakeRecord>)> {
    let options = EngineOptions {
        depth: config.search_depth,
        threads: config.engine_threads,
        hash_mb: config.engine_hash_mb,
    };
    let mut engine = StockfishEngine::new(&config.stockfish_path, &options).await?;
    info!(stockfish_path = %config.stockfish_path, depth = options.depth, "Stockfish engine ready");

    let client = LichessClient::new()?;
    let games = client
        .fetch_user_games(&config.username, config.game_count)
        .await?;

    let scanner = MistakeScanner::new(config.scan_settings());
    let mistakes = scanner.scan(&mut engine, &games).await;
    info!(games = games.len(), mistakes = mistakes.len(), "Scan complete");

    Ok((engine, mistakes))
}
