mod board_file;
mod config;
mod input;
mod recorder;
mod render;
mod session;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use twenty48_core::engine::GameEngine;

use board_file::FileBoardSource;
use config::Config;
use recorder::{HighScoreStore, SharedStore};
use session::Session;

#[derive(Debug, Parser)]
#[command(author, version, about = "Play 2048 in the terminal")]
struct Cli {
    /// TOML configuration file ([engine], [frontend], [store])
    #[arg(long, value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    config: Option<PathBuf>,

    /// SQLite database for the high score and finished games
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Premade starting board (TOML rows/tiles) used for every new game
    #[arg(long, value_name = "FILE")]
    board: Option<PathBuf>,

    /// Seed for tile spawns (random if omitted)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = match &cli.config {
        Some(path) => Config::from_toml(path)?,
        None => Config::default(),
    };

    let db_path = cli
        .db
        .or_else(|| config.store.db_path.clone())
        .unwrap_or_else(|| PathBuf::from("twenty48.db"));
    let store = HighScoreStore::open(&db_path)
        .with_context(|| format!("failed to open score database {}", db_path.display()))?;
    let store = SharedStore::new(store);
    info!("using score database {}", db_path.display());

    let mut builder = GameEngine::builder(config.engine.clone()).persistence(store.clone());
    if let Some(path) = &cli.board {
        builder = builder.board_source(FileBoardSource::load(path)?);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    let game = builder.build().context("invalid engine configuration")?;

    let mut session = Session::new(game, store, config.frontend);
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    session.run(stdin.lock(), &mut stdout)?;

    let game = session.game();
    info!(
        "leaving with score {} (high score {}, {} moves)",
        game.score(),
        game.high_score(),
        game.moves()
    );
    Ok(())
}
