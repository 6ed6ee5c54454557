//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SELFPLAY_CONFIG";

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by SELFPLAY_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_PATH_ENV, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (usize, u32, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
    // Optional parseable field (Option<u64>, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, optional_parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = Some(v);
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: SELFPLAY_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "SELFPLAY_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "SELFPLAY_COMMON_LOG_LEVEL");

    // MCTS
    env_override!(config, mcts.c_init, "SELFPLAY_MCTS_C_INIT", parse);
    env_override!(config, mcts.c_base, "SELFPLAY_MCTS_C_BASE", parse);
    env_override!(
        config,
        mcts.noise_alpha,
        "SELFPLAY_MCTS_NOISE_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.noise_fraction,
        "SELFPLAY_MCTS_NOISE_FRACTION",
        parse
    );
    env_override!(
        config,
        mcts.evaluations_per_move,
        "SELFPLAY_MCTS_EVALUATIONS_PER_MOVE",
        parse
    );
    env_override!(config, mcts.max_turns, "SELFPLAY_MCTS_MAX_TURNS", parse);

    // Self-play
    env_override!(config, self_play.mode, "SELFPLAY_SELF_PLAY_MODE");
    env_override!(
        config,
        self_play.total_games,
        "SELFPLAY_SELF_PLAY_TOTAL_GAMES",
        parse
    );
    env_override!(
        config,
        self_play.concurrency,
        "SELFPLAY_SELF_PLAY_CONCURRENCY",
        parse
    );
    env_override!(config, self_play.rows, "SELFPLAY_SELF_PLAY_ROWS", parse);
    env_override!(config, self_play.cols, "SELFPLAY_SELF_PLAY_COLS", parse);
    env_override!(config, self_play.k, "SELFPLAY_SELF_PLAY_K", parse);

    // Actor
    env_override!(config, actor.actor_id, "SELFPLAY_ACTOR_ACTOR_ID");
    env_override!(
        config,
        actor.log_interval,
        "SELFPLAY_ACTOR_LOG_INTERVAL",
        parse
    );
    env_override!(
        config,
        actor.flush_interval,
        "SELFPLAY_ACTOR_FLUSH_INTERVAL",
        parse
    );
    env_override!(config, actor.seed, "SELFPLAY_ACTOR_SEED", optional_parse);

    config
}
