//! Actor - self-play game producer
//!
//! A batch process that:
//! 1. Loads its configuration (CLI, `SELFPLAY_*` env vars, config.toml)
//! 2. Plays Connect-K games against itself with batched MCTS
//! 3. Appends finished games to `<data_dir>/selfplay.jsonl`
//! 4. Keeps `<data_dir>/actor_stats.json` up to date

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod actor;
mod config;
mod replay;
mod stats;

use crate::actor::Actor;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    eprintln!("Actor starting...");

    let config = Config::parse().resolve_seed();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        actor_id = %config.actor_id,
        seed = ?config.seed,
        "Starting actor for connect-{}x{}-{}",
        config.rows,
        config.cols,
        config.k
    );

    let mut actor = Actor::new(config)?;

    match actor.run() {
        Ok(written) => {
            info!(games = written, "Actor completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
