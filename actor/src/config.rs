//! Configuration for the Actor service
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use games_connectk::ConnectK;
use mcts::SearchConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_actor_id() -> String {
    CENTRAL_CONFIG.actor.actor_id.clone()
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_log_interval() -> usize {
    CENTRAL_CONFIG.actor.log_interval
}

fn default_flush_interval() -> usize {
    CENTRAL_CONFIG.actor.flush_interval
}

fn default_mode() -> String {
    CENTRAL_CONFIG.self_play.mode.clone()
}

fn default_total_games() -> usize {
    CENTRAL_CONFIG.self_play.total_games
}

fn default_concurrency() -> usize {
    CENTRAL_CONFIG.self_play.concurrency
}

fn default_rows() -> usize {
    CENTRAL_CONFIG.self_play.rows
}

fn default_cols() -> usize {
    CENTRAL_CONFIG.self_play.cols
}

fn default_k() -> usize {
    CENTRAL_CONFIG.self_play.k
}

fn default_c_init() -> f64 {
    CENTRAL_CONFIG.mcts.c_init
}

fn default_c_base() -> f64 {
    CENTRAL_CONFIG.mcts.c_base
}

fn default_noise_alpha() -> f64 {
    CENTRAL_CONFIG.mcts.noise_alpha
}

fn default_noise_fraction() -> f64 {
    CENTRAL_CONFIG.mcts.noise_fraction
}

fn default_evaluations_per_move() -> u32 {
    CENTRAL_CONFIG.mcts.evaluations_per_move
}

fn default_max_turns() -> usize {
    CENTRAL_CONFIG.mcts.max_turns
}

/// How games are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Continuous round-robin: a move every `evaluations_per_move` searches.
    Worker,
    /// Fixed search rounds per batch, then the games are played out.
    Batched,
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "worker" => Ok(Mode::Worker),
            "batched" => Ok(Mode::Batched),
            other => Err(anyhow!(
                "invalid mode '{}', expected 'worker' or 'batched'",
                other
            )),
        }
    }
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "actor")]
#[command(about = "Self-play runner for the batched MCTS engine")]
#[command(
    long_about = "Actor that plays Connect-K games against itself with batched MCTS and
appends every finished game (score and per-move search probabilities) to a
JSON lines file for training.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Unique actor identifier
    #[arg(long, default_value_t = default_actor_id())]
    pub actor_id: String,

    /// Data directory for replay and stats files
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Log progress every N games (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: usize,

    /// Flush the replay file every N games
    #[arg(long, default_value_t = default_flush_interval())]
    pub flush_interval: usize,

    /// Scheduling mode: worker or batched
    #[arg(long, default_value_t = default_mode())]
    pub mode: String,

    /// Number of games to produce
    #[arg(long, default_value_t = default_total_games())]
    pub total_games: usize,

    /// Games searched in lock-step (one evaluator batch per round)
    #[arg(long, default_value_t = default_concurrency())]
    pub concurrency: usize,

    /// Board rows
    #[arg(long, default_value_t = default_rows())]
    pub rows: usize,

    /// Board columns
    #[arg(long, default_value_t = default_cols())]
    pub cols: usize,

    /// Pieces in a row needed to win
    #[arg(long, default_value_t = default_k())]
    pub k: usize,

    /// PUCT c_init
    #[arg(long, default_value_t = default_c_init())]
    pub c_init: f64,

    /// PUCT c_base
    #[arg(long, default_value_t = default_c_base())]
    pub c_base: f64,

    /// Dirichlet noise alpha (0 to disable)
    #[arg(long, default_value_t = default_noise_alpha())]
    pub noise_alpha: f64,

    /// Fraction of each root prior replaced by noise
    #[arg(long, default_value_t = default_noise_fraction())]
    pub noise_fraction: f64,

    /// Searches per move (worker) or search rounds per batch (batched)
    #[arg(long, default_value_t = default_evaluations_per_move())]
    pub evaluations_per_move: u32,

    /// Turn cap; longer games are scored as a draw
    #[arg(long, default_value_t = default_max_turns())]
    pub max_turns: usize,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    /// Seed from the central config when none was given on the command line.
    pub fn resolve_seed(mut self) -> Self {
        if self.seed.is_none() {
            self.seed = CENTRAL_CONFIG.actor.seed;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.actor_id.is_empty() {
            return Err(anyhow!("actor_id cannot be empty"));
        }

        if self.total_games == 0 {
            return Err(anyhow!("total_games must be greater than 0"));
        }

        if self.concurrency == 0 {
            return Err(anyhow!("concurrency must be greater than 0"));
        }

        if self.flush_interval == 0 {
            return Err(anyhow!("flush_interval must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.mode()?;
        self.game()?;
        self.search_config().validate()?;

        Ok(())
    }

    pub fn mode(&self) -> Result<Mode> {
        self.mode.parse()
    }

    pub fn game(&self) -> Result<ConnectK> {
        Ok(ConnectK::new(self.rows, self.cols, self.k)?)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_puct(self.c_init, self.c_base)
            .with_noise(self.noise_alpha, self.noise_fraction)
            .with_evaluations_per_move(self.evaluations_per_move)
            .with_max_turns(self.max_turns)
    }

    /// Path to the JSON lines replay file
    pub fn replay_path(&self) -> String {
        format!("{}/selfplay.jsonl", self.data_dir)
    }
}
