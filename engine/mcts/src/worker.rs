//! Continuous round-robin self-play.
//!
//! Unlike [`BatchedSelfPlay`](crate::batch::BatchedSelfPlay), which runs a
//! fixed number of searches and then plays its games out, the worker keeps
//! a pool of trees in flight and commits a move on each tree as soon as it
//! has done `evaluations_per_move` searches for the current turn. Finished
//! games are collected and their trees reset until the requested number of
//! games has been produced.

use rand::Rng;
use tracing::{debug, info, trace};

use crate::batch::{evaluate_pending, select_into, RoundStats, SelfPlayError};
use crate::config::{ConfigError, SearchConfig};
use crate::evaluator::Evaluator;
use crate::tree::{GameResult, Leaf, Tree};

/// Round-robin scheduler over a pool of self-play trees.
#[derive(Debug)]
pub struct SelfPlayWorker<S, M> {
    config: SearchConfig,
    initial_state: S,

    trees: Vec<Tree<S, M>>,
    pending: Vec<Option<Leaf>>,

    total_games: usize,
    games_started: usize,
    games_finished: usize,

    rounds: u64,
    totals: RoundStats,
}

impl<S: Clone, M: Clone> SelfPlayWorker<S, M> {
    /// Create a worker producing `total_games` games with at most
    /// `concurrency` of them in flight.
    pub fn new(
        config: SearchConfig,
        initial_state: S,
        concurrency: usize,
        total_games: usize,
    ) -> Result<Self, ConfigError> {
        let seed = rand::thread_rng().gen();
        Self::with_seed(config, initial_state, concurrency, total_games, seed)
    }

    /// Like [`SelfPlayWorker::new`], seeding tree `i` with `seed + i`.
    pub fn with_seed(
        config: SearchConfig,
        initial_state: S,
        concurrency: usize,
        total_games: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }

        let in_flight = concurrency.min(total_games);
        let trees: Vec<Tree<S, M>> = (0..in_flight as u64)
            .map(|i| {
                Tree::with_seed(
                    config.c_init,
                    config.c_base,
                    initial_state.clone(),
                    seed.wrapping_add(i),
                )
            })
            .collect();

        Ok(Self {
            config,
            initial_state,
            pending: vec![None; trees.len()],
            trees,
            total_games,
            games_started: in_flight,
            games_finished: 0,
            rounds: 0,
            totals: RoundStats::default(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Whether every requested game has been collected.
    pub fn is_finished(&self) -> bool {
        self.games_finished >= self.total_games
    }

    pub fn games_finished(&self) -> usize {
        self.games_finished
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Searches performed so far, split into evaluated and absorbed.
    pub fn totals(&self) -> RoundStats {
        self.totals
    }

    /// Advance every in-flight tree by one search.
    ///
    /// Before searching, a tree that has used up its budget for the turn
    /// commits a visit-proportional move; games that end (terminal root or
    /// turn cap) are collected and returned, and their tree starts a new
    /// game while more are wanted. Leaves from all trees go to the
    /// evaluator in one batch.
    pub fn run_round<E>(&mut self, evaluator: &E) -> Result<Vec<GameResult<S, M>>, SelfPlayError>
    where
        E: Evaluator<S, M> + ?Sized,
    {
        let mut finished = Vec::new();
        let mut stats = RoundStats::default();

        for (game, (tree, slot)) in self.trees.iter_mut().zip(self.pending.iter_mut()).enumerate() {
            if tree.collected() {
                continue;
            }
            let to_tree_error = |source| SelfPlayError::Tree { game, source };

            let mut game_over = tree.complete();
            if !game_over && tree.searches_this_turn() >= self.config.evaluations_per_move {
                tree.move_proportional().map_err(to_tree_error)?;
                game_over = tree.complete() || tree.turns() >= self.config.max_turns;
            }

            if game_over {
                let result = tree.collect_result().map_err(to_tree_error)?;
                debug!(
                    game,
                    score = result.score,
                    turns = result.history.len(),
                    "game finished"
                );
                finished.push(result);
                self.games_finished += 1;

                if self.games_started >= self.total_games {
                    continue;
                }
                tree.reset(self.initial_state.clone());
                self.games_started += 1;
            }

            if tree.searches_this_turn() == 1 && self.config.noise_enabled() {
                tree.add_dirichlet_noise(self.config.noise_alpha, self.config.noise_fraction)
                    .map_err(to_tree_error)?;
            }

            select_into(game, tree, slot, &mut stats)?;
        }

        evaluate_pending(&mut self.trees, &mut self.pending, evaluator)?;

        self.rounds += 1;
        self.totals.evaluated += stats.evaluated;
        self.totals.absorbed += stats.absorbed;

        trace!(
            round = self.rounds,
            evaluated = stats.evaluated,
            absorbed = stats.absorbed,
            finished = finished.len(),
            "worker round"
        );

        Ok(finished)
    }

    /// Run rounds until all games are finished and return every result.
    pub fn run<E>(&mut self, evaluator: &E) -> Result<Vec<GameResult<S, M>>, SelfPlayError>
    where
        E: Evaluator<S, M> + ?Sized,
    {
        let mut results = Vec::with_capacity(self.total_games);

        while !self.is_finished() {
            results.extend(self.run_round(evaluator)?);
        }

        info!(
            games = results.len(),
            rounds = self.rounds,
            evaluated = self.totals.evaluated,
            absorbed = self.totals.absorbed,
            "self-play worker finished"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Evaluation, EvaluatorError, Expansion};
    use std::cell::RefCell;

    type Batch = Vec<Evaluation<u32, u32>>;

    /// Subtraction game over piles: take 1, 2 or 3; facing an empty pile
    /// loses.
    fn subtraction(states: &[u32]) -> Result<Batch, EvaluatorError> {
        Ok(states
            .iter()
            .map(|&pile| {
                if pile == 0 {
                    return Evaluation::terminal(-1.0);
                }
                let n = 3u32.min(pile);
                let children: Vec<_> = (1..=n)
                    .map(|take| Expansion::new(take, pile - take, 1.0 / n as f64))
                    .collect();
                Evaluation::new(0.0, children)
            })
            .collect())
    }

    fn config() -> SearchConfig {
        SearchConfig::for_testing()
            .with_evaluations_per_move(24)
            .with_max_turns(100)
    }

    #[test]
    fn test_produces_exactly_total_games() {
        let mut worker = SelfPlayWorker::with_seed(config(), 7u32, 3, 10, 1).unwrap();
        let results = worker.run(&subtraction).unwrap();

        assert_eq!(results.len(), 10);
        assert_eq!(worker.games_finished(), 10);
        assert!(worker.is_finished());

        for result in &results {
            assert_eq!(result.history[0].state, 7);
            assert!(result.score.abs() <= 1.0);
        }

        // Further rounds are no-ops.
        assert!(worker.run_round(&subtraction).unwrap().is_empty());
    }

    #[test]
    fn test_concurrency_larger_than_total_games() {
        let mut worker = SelfPlayWorker::with_seed(config(), 5u32, 32, 2, 1).unwrap();
        let results = worker.run(&subtraction).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_moves_are_spaced_by_search_budget() {
        let mut worker = SelfPlayWorker::with_seed(
            config().with_evaluations_per_move(5),
            40u32,
            1,
            1,
            3,
        )
        .unwrap();

        for _ in 0..5 {
            worker.run_round(&subtraction).unwrap();
        }
        assert_eq!(worker.trees[0].turns(), 1);
        assert_eq!(worker.trees[0].searches_this_turn(), 5);

        worker.run_round(&subtraction).unwrap();
        assert_eq!(worker.trees[0].turns(), 2);
        assert_eq!(worker.trees[0].searches_this_turn(), 1);
    }

    #[test]
    fn test_max_turns_cuts_game_off() {
        let mut worker = SelfPlayWorker::with_seed(
            config().with_evaluations_per_move(2).with_max_turns(3),
            1000u32,
            2,
            4,
            5,
        )
        .unwrap();
        let results = worker.run(&subtraction).unwrap();

        assert_eq!(results.len(), 4);
        for result in results {
            // Two committed moves plus the unfinished final position.
            assert_eq!(result.history.len(), 3);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_noise_applied_after_first_search() {
        let config = config().with_noise(0.3, 1.0);
        let mut worker = SelfPlayWorker::with_seed(config, 9u32, 1, 1, 11).unwrap();

        // Round one expands the root; round two perturbs it before searching.
        worker.run_round(&subtraction).unwrap();
        let before: Vec<f64> = worker.trees[0].root_children().map(|c| c.prior()).collect();
        worker.run_round(&subtraction).unwrap();
        let after: Vec<f64> = worker.trees[0].root_children().map(|c| c.prior()).collect();

        assert!(before.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));
        assert_ne!(before, after);
        let sum: f64 = after.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_evaluator_call_per_round() {
        let calls = RefCell::new(Vec::new());
        let recording = |states: &[u32]| -> Result<Batch, EvaluatorError> {
            calls.borrow_mut().push(states.len());
            subtraction(states)
        };

        let mut worker = SelfPlayWorker::with_seed(config(), 12u32, 4, 4, 2).unwrap();
        worker.run_round(&recording).unwrap();

        assert_eq!(*calls.borrow(), vec![4]);
        assert_eq!(worker.totals(), RoundStats { evaluated: 4, absorbed: 0 });
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = SelfPlayWorker::<u32, u32>::with_seed(config(), 3, 0, 1, 0).unwrap_err();
        assert_eq!(err, ConfigError::Zero("concurrency"));

        let bad = config().with_evaluations_per_move(0);
        assert!(SelfPlayWorker::<u32, u32>::new(bad, 3, 1, 1).is_err());
    }

    #[test]
    fn test_no_games_requested() {
        let mut worker = SelfPlayWorker::with_seed(config(), 3u32, 4, 0, 0).unwrap();
        assert!(worker.is_finished());
        assert!(worker.run(&subtraction).unwrap().is_empty());
    }
}
