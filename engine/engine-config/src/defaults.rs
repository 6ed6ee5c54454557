//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so every binary agrees on
//! the same values without shipping the file alongside it.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: MctsDefaults,
    self_play: SelfPlayDefaults,
    actor: ActorDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    c_init: f64,
    c_base: f64,
    noise_alpha: f64,
    noise_fraction: f64,
    evaluations_per_move: u32,
    max_turns: usize,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    mode: String,
    total_games: usize,
    concurrency: usize,
    rows: usize,
    cols: usize,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct ActorDefaults {
    actor_id: String,
    log_interval: usize,
    flush_interval: usize,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// MCTS
pub fn c_init() -> f64 {
    DEFAULTS.mcts.c_init
}
pub fn c_base() -> f64 {
    DEFAULTS.mcts.c_base
}
pub fn noise_alpha() -> f64 {
    DEFAULTS.mcts.noise_alpha
}
pub fn noise_fraction() -> f64 {
    DEFAULTS.mcts.noise_fraction
}
pub fn evaluations_per_move() -> u32 {
    DEFAULTS.mcts.evaluations_per_move
}
pub fn max_turns() -> usize {
    DEFAULTS.mcts.max_turns
}

// Self-play
pub fn mode() -> &'static str {
    &DEFAULTS.self_play.mode
}
pub fn total_games() -> usize {
    DEFAULTS.self_play.total_games
}
pub fn concurrency() -> usize {
    DEFAULTS.self_play.concurrency
}
pub fn rows() -> usize {
    DEFAULTS.self_play.rows
}
pub fn cols() -> usize {
    DEFAULTS.self_play.cols
}
pub fn k() -> usize {
    DEFAULTS.self_play.k
}

// Actor
pub fn actor_id() -> &'static str {
    &DEFAULTS.actor.actor_id
}
pub fn log_interval() -> usize {
    DEFAULTS.actor.log_interval
}
pub fn flush_interval() -> usize {
    DEFAULTS.actor.flush_interval
}
