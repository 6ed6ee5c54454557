//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared
//! by the self-play binaries.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`SELFPLAY_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! SELFPLAY_<SECTION>_<KEY>=value
//!
//! Examples:
//!     SELFPLAY_COMMON_DATA_DIR=/data
//!     SELFPLAY_MCTS_EVALUATIONS_PER_MOVE=800
//!     SELFPLAY_SELF_PLAY_CONCURRENCY=64
//!     SELFPLAY_ACTOR_SEED=42
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_PATH_ENV, CONFIG_SEARCH_PATHS,
};
pub use structs::*;

#[cfg(test)]
mod tests;
