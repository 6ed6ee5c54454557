//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.actor.actor_id, "actor-1");
    assert_eq!(config.actor.log_interval, 16);
    assert_eq!(config.actor.flush_interval, 8);
    assert!(config.actor.seed.is_none());
    assert_eq!(config.self_play.mode, "worker");
    assert_eq!(config.self_play.concurrency, 32);
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert!((config.mcts.c_init - 1.25).abs() < f64::EPSILON);
    assert!((config.mcts.c_base - 19652.0).abs() < f64::EPSILON);
    assert!((config.mcts.noise_alpha - 0.5).abs() < f64::EPSILON);
    assert!((config.mcts.noise_fraction - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.mcts.evaluations_per_move, 200);
    assert_eq!(config.mcts.max_turns, 1_000_000);
}

#[test]
fn test_self_play_env_overrides() {
    std::env::set_var("SELFPLAY_SELF_PLAY_TOTAL_GAMES", "7");
    std::env::set_var("SELFPLAY_MCTS_NOISE_FRACTION", "0.5");
    std::env::set_var("SELFPLAY_ACTOR_SEED", "42");

    let config = load_config();
    assert_eq!(config.self_play.total_games, 7);
    assert!((config.mcts.noise_fraction - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.actor.seed, Some(42));

    std::env::remove_var("SELFPLAY_SELF_PLAY_TOTAL_GAMES");
    std::env::remove_var("SELFPLAY_MCTS_NOISE_FRACTION");
    std::env::remove_var("SELFPLAY_ACTOR_SEED");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("SELFPLAY_SELF_PLAY_ROWS", "many");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.self_play.rows, 6);

    std::env::remove_var("SELFPLAY_SELF_PLAY_ROWS");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
data_dir = "/custom/data"

[mcts]
c_init = 2.0
evaluations_per_move = 800

[self_play]
mode = "batched"
rows = 3
cols = 3
k = 3

[actor]
actor_id = "my-actor"
seed = 9
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.data_dir, "/custom/data");
    assert!((config.mcts.c_init - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.mcts.evaluations_per_move, 800);
    assert_eq!(config.self_play.mode, "batched");
    assert_eq!(
        (config.self_play.rows, config.self_play.cols, config.self_play.k),
        (3, 3, 3)
    );
    assert_eq!(config.actor.actor_id, "my-actor");
    assert_eq!(config.actor.seed, Some(9));
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[mcts]
max_turns = 42
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.mcts.max_turns, 42);
    assert!((config.mcts.c_base - 19652.0).abs() < f64::EPSILON); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.self_play.k, 4); // Default
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[self_play]\nconcurrency = 3").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.self_play.concurrency, 3);
    assert_eq!(config.self_play.k, 4);
}

#[test]
fn test_load_from_invalid_path_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.common.log_level, "info");

    let missing = load_from_path(std::path::Path::new("/nonexistent/selfplay.toml"));
    assert_eq!(missing.mcts.evaluations_per_move, 200);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.data_dir, cloned.common.data_dir);
    assert_eq!(config.self_play.mode, cloned.self_play.mode);
}
