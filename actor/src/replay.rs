//! JSON lines replay file for finished self-play games.
//!
//! Each line is one [`GameRecord`]: the game's score from the first
//! player's perspective plus, for every position, the search
//! probabilities the trainer uses as policy targets.

use anyhow::Result;
use games_connectk::{Move, State};
use mcts::{GameResult, HistoryEntry};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One finished game as written to the replay file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub episode_id: String,
    pub actor_id: String,
    /// +1 first player won, -1 second player won, 0 draw or cut off
    pub score: f64,
    /// Number of recorded positions
    pub turns: usize,
    pub history: Vec<HistoryEntry<State, Move>>,
}

impl GameRecord {
    pub fn new(episode_id: String, actor_id: &str, result: GameResult<State, Move>) -> Self {
        Self {
            episode_id,
            actor_id: actor_id.to_string(),
            score: result.score,
            turns: result.history.len(),
            history: result.history,
        }
    }
}

/// Append-only writer for the replay file.
pub struct ReplayWriter {
    writer: BufWriter<File>,
    written: usize,
}

impl ReplayWriter {
    /// Open (or create) the replay file for appending, creating parent
    /// directories if they don't exist.
    pub fn new(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record as a single JSON line.
    pub fn append(&mut self, record: &GameRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Records appended by this writer.
    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
pub(crate) fn read_records(path: &str) -> Result<Vec<GameRecord>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_connectk::ConnectK;
    use tempfile::tempdir;

    fn sample_result() -> GameResult<State, Move> {
        let game = ConnectK::new(3, 3, 3).unwrap();
        let start = game.initial_state();
        let next = start.play(1).unwrap();

        GameResult {
            score: -1.0,
            history: vec![
                HistoryEntry {
                    state: start,
                    search_probabilities: vec![(0, 0.25), (1, 0.5), (2, 0.25)],
                },
                HistoryEntry {
                    state: next,
                    search_probabilities: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/selfplay.jsonl");
        let path = path.to_str().unwrap();

        let record = GameRecord::new("actor-000001".into(), "actor", sample_result());
        assert_eq!(record.turns, 2);

        let mut writer = ReplayWriter::new(path).unwrap();
        writer.append(&record).unwrap();
        writer.append(&record).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.written(), 2);

        let records = read_records(path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selfplay.jsonl");
        let path = path.to_str().unwrap();

        for i in 0..2 {
            let mut writer = ReplayWriter::new(path).unwrap();
            let record = GameRecord::new(format!("game-{}", i), "actor", sample_result());
            writer.append(&record).unwrap();
            writer.flush().unwrap();
        }

        let ids: Vec<String> = read_records(path)
            .unwrap()
            .into_iter()
            .map(|r| r.episode_id)
            .collect();
        assert_eq!(ids, vec!["game-0", "game-1"]);
    }
}
