//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_c_init() -> f64 {
    defaults::c_init()
}
fn d_c_base() -> f64 {
    defaults::c_base()
}
fn d_noise_alpha() -> f64 {
    defaults::noise_alpha()
}
fn d_noise_fraction() -> f64 {
    defaults::noise_fraction()
}
fn d_evaluations_per_move() -> u32 {
    defaults::evaluations_per_move()
}
fn d_max_turns() -> usize {
    defaults::max_turns()
}
fn d_mode() -> String {
    defaults::mode().into()
}
fn d_total_games() -> usize {
    defaults::total_games()
}
fn d_concurrency() -> usize {
    defaults::concurrency()
}
fn d_rows() -> usize {
    defaults::rows()
}
fn d_cols() -> usize {
    defaults::cols()
}
fn d_k() -> usize {
    defaults::k()
}
fn d_actor_id() -> String {
    defaults::actor_id().into()
}
fn d_log_interval() -> usize {
    defaults::log_interval()
}
fn d_flush_interval() -> usize {
    defaults::flush_interval()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub self_play: SelfPlayConfig,
    #[serde(default)]
    pub actor: ActorConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search parameters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_c_init")]
    pub c_init: f64,
    #[serde(default = "d_c_base")]
    pub c_base: f64,
    #[serde(default = "d_noise_alpha")]
    pub noise_alpha: f64,
    #[serde(default = "d_noise_fraction")]
    pub noise_fraction: f64,
    #[serde(default = "d_evaluations_per_move")]
    pub evaluations_per_move: u32,
    #[serde(default = "d_max_turns")]
    pub max_turns: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            c_init: defaults::c_init(),
            c_base: defaults::c_base(),
            noise_alpha: defaults::noise_alpha(),
            noise_fraction: defaults::noise_fraction(),
            evaluations_per_move: defaults::evaluations_per_move(),
            max_turns: defaults::max_turns(),
        }
    }
}

/// Self-play scheduling and the game being played
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// "worker" or "batched"
    #[serde(default = "d_mode")]
    pub mode: String,
    #[serde(default = "d_total_games")]
    pub total_games: usize,
    /// Games searched in lock-step
    #[serde(default = "d_concurrency")]
    pub concurrency: usize,
    #[serde(default = "d_rows")]
    pub rows: usize,
    #[serde(default = "d_cols")]
    pub cols: usize,
    #[serde(default = "d_k")]
    pub k: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            mode: defaults::mode().into(),
            total_games: defaults::total_games(),
            concurrency: defaults::concurrency(),
            rows: defaults::rows(),
            cols: defaults::cols(),
            k: defaults::k(),
        }
    }
}

/// Actor (self-play runner) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActorConfig {
    #[serde(default = "d_actor_id")]
    pub actor_id: String,
    #[serde(default = "d_log_interval")]
    pub log_interval: usize,
    #[serde(default = "d_flush_interval")]
    pub flush_interval: usize,
    /// Fixed RNG seed; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            actor_id: defaults::actor_id().into(),
            log_interval: defaults::log_interval(),
            flush_interval: defaults::flush_interval(),
            seed: None,
        }
    }
}
