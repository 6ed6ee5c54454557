//! Actor statistics tracking and persistence.
//!
//! Tracks finished games, their outcomes and lengths, and the search work
//! spent producing them. Stats are written to a JSON file next to the
//! replay data.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, warn};

/// Aggregated actor statistics.
#[derive(Debug)]
pub struct ActorStats {
    /// Games finished and written
    games_completed: u32,
    /// Recorded positions across all games
    total_turns: u64,
    /// Games with a positive score (first player won)
    player1_wins: u32,
    /// Games with a negative score (second player won)
    player2_wins: u32,
    /// Draws and games cut off at the turn cap
    draws: u32,
    /// Searches that reached the evaluator
    searches_evaluated: u64,
    /// Searches absorbed by a terminal node
    searches_absorbed: u64,
    /// Evaluator batch calls
    evaluator_batches: u64,
    start_time: Instant,
    stats_path: String,
    /// Game label, e.g. connect-6x7-4
    game: String,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub game: String,
    pub games_completed: u32,
    pub total_turns: u64,
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub draws: u32,
    pub avg_game_length: f64,
    pub games_per_second: f64,
    pub searches_evaluated: u64,
    pub searches_absorbed: u64,
    pub avg_batch_size: f64,
    pub runtime_seconds: f64,
    pub timestamp: u64,
}

impl ActorStats {
    pub fn new(data_dir: &str, game: &str) -> Self {
        let stats_path = format!("{}/actor_stats.json", data_dir);

        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!("Failed to create data directory: {}", e);
        }

        Self {
            games_completed: 0,
            total_turns: 0,
            player1_wins: 0,
            player2_wins: 0,
            draws: 0,
            searches_evaluated: 0,
            searches_absorbed: 0,
            evaluator_batches: 0,
            start_time: Instant::now(),
            stats_path,
            game: game.to_string(),
        }
    }

    /// Record a finished game by its first-player score.
    pub fn record_game(&mut self, turns: usize, score: f64) {
        self.games_completed += 1;
        self.total_turns += turns as u64;

        if score > 0.0 {
            self.player1_wins += 1;
        } else if score < 0.0 {
            self.player2_wins += 1;
        } else {
            self.draws += 1;
        }
    }

    /// Record search work: searches split by outcome, and evaluator calls.
    pub fn record_searches(&mut self, evaluated: usize, absorbed: usize, batches: u64) {
        self.searches_evaluated += evaluated as u64;
        self.searches_absorbed += absorbed as u64;
        self.evaluator_batches += batches;
    }

    pub fn games_completed(&self) -> u32 {
        self.games_completed
    }

    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let runtime = self.start_time.elapsed().as_secs_f64();

        let avg_game_length = if self.games_completed > 0 {
            self.total_turns as f64 / self.games_completed as f64
        } else {
            0.0
        };

        let games_per_second = if runtime > 0.0 {
            self.games_completed as f64 / runtime
        } else {
            0.0
        };

        let avg_batch_size = if self.evaluator_batches > 0 {
            self.searches_evaluated as f64 / self.evaluator_batches as f64
        } else {
            0.0
        };

        ActorStatsSnapshot {
            game: self.game.clone(),
            games_completed: self.games_completed,
            total_turns: self.total_turns,
            player1_wins: self.player1_wins,
            player2_wins: self.player2_wins,
            draws: self.draws,
            avg_game_length,
            games_per_second,
            searches_evaluated: self.searches_evaluated,
            searches_absorbed: self.searches_absorbed,
            avg_batch_size,
            runtime_seconds: runtime,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize actor stats: {}", e);
                return;
            }
        };

        let temp_path = format!("{}.tmp", self.stats_path);
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write actor stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote actor stats to {}", self.stats_path);
    }

    pub fn stats_path(&self) -> &str {
        &self.stats_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn new_stats(dir: &tempfile::TempDir) -> ActorStats {
        ActorStats::new(dir.path().to_str().unwrap(), "connect-6x7-4")
    }

    #[test]
    fn test_record_game() {
        let dir = tempdir().unwrap();
        let mut stats = new_stats(&dir);

        stats.record_game(9, 1.0);
        stats.record_game(8, -1.0);
        stats.record_game(42, 0.0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 3);
        assert_eq!(snapshot.player1_wins, 1);
        assert_eq!(snapshot.player2_wins, 1);
        assert_eq!(snapshot.draws, 1);
        assert_eq!(snapshot.total_turns, 59);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempdir().unwrap();
        let mut stats = new_stats(&dir);

        stats.record_game(9, 1.0);
        stats.write_stats();

        let path = Path::new(stats.stats_path());
        assert!(path.exists());

        let content = fs::read_to_string(path).unwrap();
        let parsed: ActorStatsSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.games_completed, 1);
        assert_eq!(parsed.game, "connect-6x7-4");
    }

    #[test]
    fn test_averages_with_nothing_recorded() {
        let dir = tempdir().unwrap();
        let stats = new_stats(&dir);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.avg_game_length, 0.0);
        assert_eq!(snapshot.avg_batch_size, 0.0);
        assert!(!snapshot.avg_game_length.is_nan());
    }

    #[test]
    fn test_search_accumulation() {
        let dir = tempdir().unwrap();
        let mut stats = new_stats(&dir);

        stats.record_searches(40, 2, 10);
        stats.record_searches(20, 0, 5);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.searches_evaluated, 60);
        assert_eq!(snapshot.searches_absorbed, 2);
        assert!((snapshot.avg_batch_size - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_avg_game_length_calculation() {
        let dir = tempdir().unwrap();
        let mut stats = new_stats(&dir);

        stats.record_game(6, 1.0);
        stats.record_game(10, -1.0);
        stats.record_game(8, 0.0);

        let snapshot = stats.snapshot();
        assert!((snapshot.avg_game_length - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_stats_path_format() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        let stats = ActorStats::new(dir_path, "connect-3x3-3");

        assert_eq!(stats.stats_path(), format!("{}/actor_stats.json", dir_path));
    }
}
