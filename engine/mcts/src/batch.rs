//! Batched self-play coordinator.
//!
//! Drives many independent trees in lock-step so that each round sends a
//! single batch of leaf states to the evaluator. Leaves are submitted in
//! game-index order and results are matched back positionally.

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::evaluator::{Evaluation, Evaluator, EvaluatorError};
use crate::tree::{GameResult, Leaf, Tree, TreeError};

/// Errors that can occur while running self-play.
#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("evaluator returned {actual} results for a batch of {expected}")]
    MalformedResponse { expected: usize, actual: usize },

    #[error("game {game}: {source}")]
    Tree { game: usize, source: TreeError },
}

/// What happened to the trees during one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    /// Leaves sent to the evaluator.
    pub evaluated: usize,
    /// Searches that ended on a terminal node and needed no evaluation.
    pub absorbed: usize,
}

impl RoundStats {
    pub fn searches(&self) -> usize {
        self.evaluated + self.absorbed
    }
}

/// Select a leaf in `tree`, parking it in `slot` unless the search was
/// absorbed by a terminal node.
pub(crate) fn select_into<S, M: Clone>(
    game: usize,
    tree: &mut Tree<S, M>,
    slot: &mut Option<Leaf>,
    stats: &mut RoundStats,
) -> Result<(), SelfPlayError> {
    match tree
        .select_leaf()
        .map_err(|source| SelfPlayError::Tree { game, source })?
    {
        Some((leaf, _)) => {
            *slot = Some(leaf);
            stats.evaluated += 1;
        }
        None => stats.absorbed += 1,
    }
    Ok(())
}

/// Evaluate every parked leaf in one evaluator call and expand them.
///
/// Returns the batch size. No call is made when nothing is parked.
pub(crate) fn evaluate_pending<S, M, E>(
    trees: &mut [Tree<S, M>],
    pending: &mut [Option<Leaf>],
    evaluator: &E,
) -> Result<usize, SelfPlayError>
where
    S: Clone,
    M: Clone,
    E: Evaluator<S, M> + ?Sized,
{
    let mut states = Vec::with_capacity(pending.len());
    for (game, (tree, slot)) in trees.iter().zip(pending.iter()).enumerate() {
        if let Some(leaf) = slot {
            let state = tree
                .leaf_state(*leaf)
                .map_err(|source| SelfPlayError::Tree { game, source })?;
            states.push(state.clone());
        }
    }

    if states.is_empty() {
        return Ok(0);
    }

    let evaluations = evaluator.evaluate_batch(&states)?;
    if evaluations.len() != states.len() {
        pending.iter_mut().for_each(|slot| *slot = None);
        return Err(SelfPlayError::MalformedResponse {
            expected: states.len(),
            actual: evaluations.len(),
        });
    }

    let mut evaluations = evaluations.into_iter();
    for (game, (tree, slot)) in trees.iter_mut().zip(pending.iter_mut()).enumerate() {
        let Some(leaf) = slot.take() else {
            continue;
        };
        let Some(Evaluation { value, children }) = evaluations.next() else {
            break;
        };
        tree.expand_leaf(leaf, value, children)
            .map_err(|source| SelfPlayError::Tree { game, source })?;
    }

    Ok(states.len())
}

/// A fixed set of games searched in lock-step.
#[derive(Debug)]
pub struct BatchedSelfPlay<S, M> {
    trees: Vec<Tree<S, M>>,
    pending: Vec<Option<Leaf>>,
}

impl<S: Clone, M: Clone> BatchedSelfPlay<S, M> {
    /// `n_games` fresh trees rooted at `initial_state`.
    pub fn new(n_games: usize, c_init: f64, c_base: f64, initial_state: S) -> Self {
        let trees = (0..n_games)
            .map(|_| Tree::new(c_init, c_base, initial_state.clone()))
            .collect();
        Self::from_trees(trees)
    }

    /// Like [`BatchedSelfPlay::new`], seeding game `i` with `seed + i`.
    pub fn with_seed(n_games: usize, c_init: f64, c_base: f64, initial_state: S, seed: u64) -> Self {
        let trees = (0..n_games as u64)
            .map(|i| Tree::with_seed(c_init, c_base, initial_state.clone(), seed.wrapping_add(i)))
            .collect();
        Self::from_trees(trees)
    }

    pub fn from_trees(trees: Vec<Tree<S, M>>) -> Self {
        let pending = vec![None; trees.len()];
        Self { trees, pending }
    }

    pub fn trees(&self) -> &[Tree<S, M>] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Run one search on every tree, evaluating all new leaves in a single
    /// batch.
    pub fn run_round<E>(&mut self, evaluator: &E) -> Result<RoundStats, SelfPlayError>
    where
        E: Evaluator<S, M> + ?Sized,
    {
        let mut stats = RoundStats::default();

        for (game, (tree, slot)) in self.trees.iter_mut().zip(self.pending.iter_mut()).enumerate() {
            select_into(game, tree, slot, &mut stats)?;
        }

        evaluate_pending(&mut self.trees, &mut self.pending, evaluator)?;

        trace!(
            evaluated = stats.evaluated,
            absorbed = stats.absorbed,
            "self-play round"
        );
        Ok(stats)
    }

    /// Play every game out by visit-proportional sampling over the existing
    /// trees and collect the results in game order.
    ///
    /// A game stops early when its new root has never been expanded; it is
    /// then scored as 0.
    pub fn finish(mut self) -> Result<Vec<GameResult<S, M>>, SelfPlayError> {
        let mut results = Vec::with_capacity(self.trees.len());

        for (game, tree) in self.trees.iter_mut().enumerate() {
            let to_tree_error = |source| SelfPlayError::Tree { game, source };

            while tree.expanded() && !tree.complete() {
                tree.move_proportional().map_err(to_tree_error)?;
            }

            let result = tree.collect_result().map_err(to_tree_error)?;
            debug!(
                game,
                score = result.score,
                turns = result.history.len(),
                "game finished"
            );
            results.push(result);
        }

        Ok(results)
    }
}

/// Run `n_games` games for `n_evaluations` rounds each and collect their
/// results.
///
/// Every round performs one search per game with a single batched evaluator
/// call. Afterwards each game is played out on its tree by
/// [`Tree::move_proportional`] and collected.
pub fn run_self_play<S, M, E>(
    n_games: usize,
    n_evaluations: usize,
    c_init: f64,
    c_base: f64,
    initial_state: S,
    evaluator: &E,
) -> Result<Vec<GameResult<S, M>>, SelfPlayError>
where
    S: Clone,
    M: Clone,
    E: Evaluator<S, M> + ?Sized,
{
    let mut coordinator = BatchedSelfPlay::new(n_games, c_init, c_base, initial_state);
    run_coordinator(&mut coordinator, n_evaluations, evaluator)?;

    let results = coordinator.finish()?;
    info!(games = results.len(), n_evaluations, "self-play batch finished");
    Ok(results)
}

fn run_coordinator<S, M, E>(
    coordinator: &mut BatchedSelfPlay<S, M>,
    n_evaluations: usize,
    evaluator: &E,
) -> Result<RoundStats, SelfPlayError>
where
    S: Clone,
    M: Clone,
    E: Evaluator<S, M> + ?Sized,
{
    let mut total = RoundStats::default();

    for _ in 0..n_evaluations {
        let stats = coordinator.run_round(evaluator)?;
        total.evaluated += stats.evaluated;
        total.absorbed += stats.absorbed;
    }

    debug!(
        games = coordinator.len(),
        evaluated = total.evaluated,
        absorbed = total.absorbed,
        "search rounds complete"
    );
    Ok(total)
}
