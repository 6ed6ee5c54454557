//! Self-play driver: runs the search engine, writes finished games to the
//! replay file and keeps the stats file current.

use anyhow::Result;
use games_connectk::{ConnectK, Move, State, UniformEvaluator};
use mcts::{
    BatchedSelfPlay, Evaluation, Evaluator, EvaluatorError, GameResult, RoundStats,
    SelfPlayWorker,
};
use std::cell::Cell;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{Config, Mode};
use crate::replay::{GameRecord, ReplayWriter};
use crate::stats::ActorStats;

/// Wraps an evaluator and counts the batches sent through it.
struct MeteredEvaluator<E> {
    inner: E,
    batches: Cell<u64>,
    inference_us: Cell<u64>,
}

impl<E> MeteredEvaluator<E> {
    fn new(inner: E) -> Self {
        Self {
            inner,
            batches: Cell::new(0),
            inference_us: Cell::new(0),
        }
    }

    /// Batches and inference time since the last call.
    fn take(&self) -> (u64, u64) {
        (self.batches.replace(0), self.inference_us.replace(0))
    }
}

impl<E: Evaluator<State, Move>> Evaluator<State, Move> for MeteredEvaluator<E> {
    fn evaluate_batch(
        &self,
        states: &[State],
    ) -> Result<Vec<Evaluation<State, Move>>, EvaluatorError> {
        let start = Instant::now();
        let result = self.inner.evaluate_batch(states);
        self.batches.set(self.batches.get() + 1);
        self.inference_us
            .set(self.inference_us.get() + start.elapsed().as_micros() as u64);
        result
    }
}

pub struct Actor {
    config: Config,
    game: ConnectK,
    evaluator: MeteredEvaluator<UniformEvaluator>,
    replay: ReplayWriter,
    stats: ActorStats,
}

impl Actor {
    pub fn new(config: Config) -> Result<Self> {
        let game = config.game()?;
        let label = format!("connect-{}x{}-{}", game.rows(), game.cols(), game.k());

        let replay = ReplayWriter::new(&config.replay_path())?;
        let stats = ActorStats::new(&config.data_dir, &label);

        info!(
            actor_id = %config.actor_id,
            game = %label,
            replay = %config.replay_path(),
            "Actor initialized"
        );

        Ok(Self {
            evaluator: MeteredEvaluator::new(UniformEvaluator::new(game)),
            config,
            game,
            replay,
            stats,
        })
    }

    /// Produce `total_games` games and return how many were written.
    pub fn run(&mut self) -> Result<usize> {
        let mode = self.config.mode()?;
        info!(
            ?mode,
            total_games = self.config.total_games,
            concurrency = self.config.concurrency,
            evaluations_per_move = self.config.evaluations_per_move,
            "Starting self-play"
        );

        match mode {
            Mode::Worker => self.run_worker()?,
            Mode::Batched => self.run_batched()?,
        }

        self.replay.flush()?;
        self.stats.write_stats();

        let snapshot = self.stats.snapshot();
        info!(
            games = snapshot.games_completed,
            player1_wins = snapshot.player1_wins,
            player2_wins = snapshot.player2_wins,
            draws = snapshot.draws,
            avg_length = format!("{:.1}", snapshot.avg_game_length),
            runtime_secs = format!("{:.1}", snapshot.runtime_seconds),
            "Self-play finished"
        );

        Ok(self.replay.written())
    }

    fn run_worker(&mut self) -> Result<()> {
        let search = self.config.search_config();
        let initial = self.game.initial_state();
        let (concurrency, total) = (self.config.concurrency, self.config.total_games);

        let mut worker: SelfPlayWorker<State, Move> = match self.config.seed {
            Some(seed) => SelfPlayWorker::with_seed(search, initial, concurrency, total, seed)?,
            None => SelfPlayWorker::new(search, initial, concurrency, total)?,
        };

        let mut seen = RoundStats::default();
        while !worker.is_finished() {
            let results = worker.run_round(&self.evaluator)?;

            if results.is_empty() {
                continue;
            }
            let totals = worker.totals();
            self.record_searches(totals.evaluated - seen.evaluated, totals.absorbed - seen.absorbed);
            seen = totals;

            for result in results {
                self.write_game(result)?;
            }
        }

        let totals = worker.totals();
        self.record_searches(totals.evaluated - seen.evaluated, totals.absorbed - seen.absorbed);
        Ok(())
    }

    fn run_batched(&mut self) -> Result<()> {
        let rounds = self.config.evaluations_per_move as usize;
        let mut started = 0;

        while started < self.config.total_games {
            let n_games = self.config.concurrency.min(self.config.total_games - started);
            let initial = self.game.initial_state();

            let mut coordinator: BatchedSelfPlay<State, Move> = match self.config.seed {
                Some(seed) => BatchedSelfPlay::with_seed(
                    n_games,
                    self.config.c_init,
                    self.config.c_base,
                    initial,
                    seed.wrapping_add(started as u64),
                ),
                None => BatchedSelfPlay::new(
                    n_games,
                    self.config.c_init,
                    self.config.c_base,
                    initial,
                ),
            };
            started += n_games;

            let (mut evaluated, mut absorbed) = (0, 0);
            for _ in 0..rounds {
                let round = coordinator.run_round(&self.evaluator)?;
                evaluated += round.evaluated;
                absorbed += round.absorbed;
            }
            self.record_searches(evaluated, absorbed);
            debug!(n_games, rounds, evaluated, absorbed, "batch searched");

            for result in coordinator.finish()? {
                self.write_game(result)?;
            }
        }

        Ok(())
    }

    fn record_searches(&mut self, evaluated: usize, absorbed: usize) {
        let (batches, inference_us) = self.evaluator.take();
        self.stats.record_searches(evaluated, absorbed, batches);
        debug!(evaluated, absorbed, batches, inference_us, "search work");
    }

    fn write_game(&mut self, result: GameResult<State, Move>) -> Result<()> {
        let completed = self.stats.games_completed() as usize + 1;
        let episode_id = format!("{}-{:06}", self.config.actor_id, completed);

        self.stats.record_game(result.history.len(), result.score);
        self.replay
            .append(&GameRecord::new(episode_id, &self.config.actor_id, result))?;

        if completed % self.config.flush_interval == 0 {
            self.replay.flush()?;
            self.stats.write_stats();
        }

        if self.config.log_interval > 0 && completed % self.config.log_interval == 0 {
            let snapshot = self.stats.snapshot();
            info!(
                "Completed {} games (p1 {} / p2 {} / draw {}, avg length {:.1}, {:.2} games/sec)",
                completed,
                snapshot.player1_wins,
                snapshot.player2_wins,
                snapshot.draws,
                snapshot.avg_game_length,
                snapshot.games_per_second,
            );
        }

        Ok(())
    }
}
