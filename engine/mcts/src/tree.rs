//! Search tree for a single self-play game.
//!
//! The tree owns its nodes through a [`NodeArena`] and is driven from the
//! outside one step at a time: [`Tree::select_leaf`] walks down with PUCT,
//! the caller evaluates the leaf state, and [`Tree::expand_leaf`] attaches
//! the evaluator's continuations and backpropagates its value. Once enough
//! searches have run, a move is committed with [`Tree::move_greedy`] or
//! [`Tree::move_proportional`], which records a training example, prunes
//! every sibling subtree and reuses the chosen subtree as the new root.
//!
//! Values are stored from the perspective of the player to move at each
//! node and flip sign on every level during backpropagation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::arena::NodeArena;
use crate::evaluator::Expansion;
use crate::node::{exploration_factor, Node, NodeId};

/// Errors returned when a tree operation is called in the wrong state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("leaf is already expanded")]
    AlreadyExpanded,

    #[error("root has not been expanded yet")]
    NotExpanded,

    #[error("game is over")]
    GameOver,

    #[error("results were already collected")]
    Collected,

    #[error("leaf no longer belongs to the tree")]
    StaleLeaf,

    #[error("invalid noise parameters: {0}")]
    InvalidNoise(String),
}

/// Handle to an unexpanded node returned by [`Tree::select_leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf(NodeId);

impl Leaf {
    #[inline]
    pub fn id(self) -> NodeId {
        self.0
    }
}

/// Training record for one committed move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<S, M> {
    /// Root state before the move was played.
    pub state: S,
    /// Visit fraction of every root child, in child order.
    pub search_probabilities: Vec<(M, f64)>,
}

/// Final outcome of a game plus its training history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult<S, M> {
    /// Outcome from the first player's perspective.
    pub score: f64,
    pub history: Vec<HistoryEntry<S, M>>,
}

/// Statistics about a tree for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub live_nodes: usize,
    pub free_slots: usize,
    pub root_visits: u32,
    pub root_value: f64,
    pub max_depth: u32,
}

/// MCTS tree over one game.
#[derive(Debug)]
pub struct Tree<S, M> {
    c_init: f64,
    c_base: f64,

    arena: NodeArena<S, M>,

    /// `None` once the result has been collected.
    root: Option<NodeId>,

    history: Vec<HistoryEntry<S, M>>,

    searches_this_turn: u32,

    rng: ChaCha20Rng,
}

impl<S, M: Clone> Tree<S, M> {
    /// Create a tree rooted at `initial_state`, seeding its RNG from entropy.
    pub fn new(c_init: f64, c_base: f64, initial_state: S) -> Self {
        Self::with_rng(c_init, c_base, initial_state, ChaCha20Rng::from_entropy())
    }

    /// Create a tree with a deterministic RNG.
    pub fn with_seed(c_init: f64, c_base: f64, initial_state: S, seed: u64) -> Self {
        Self::with_rng(
            c_init,
            c_base,
            initial_state,
            ChaCha20Rng::seed_from_u64(seed),
        )
    }

    pub fn with_rng(c_init: f64, c_base: f64, initial_state: S, rng: ChaCha20Rng) -> Self {
        let mut arena = NodeArena::with_capacity(1024);
        let root = arena.allocate(Node::new_root(initial_state));

        Self {
            c_init,
            c_base,
            arena,
            root: Some(root),
            history: Vec::new(),
            searches_this_turn: 0,
            rng,
        }
    }

    #[inline]
    pub fn c_init(&self) -> f64 {
        self.c_init
    }

    #[inline]
    pub fn c_base(&self) -> f64 {
        self.c_base
    }

    #[inline]
    fn root_id(&self) -> Result<NodeId, TreeError> {
        self.root.ok_or(TreeError::Collected)
    }

    /// State at the current root.
    pub fn game_state(&self) -> Result<&S, TreeError> {
        Ok(self.arena.get(self.root_id()?).state())
    }

    /// Whether the root has been evaluated.
    pub fn expanded(&self) -> bool {
        self.root_node().is_some_and(Node::is_expanded)
    }

    /// Whether the root is a terminal state.
    pub fn complete(&self) -> bool {
        self.root_node().is_some_and(Node::is_terminal)
    }

    /// Whether [`Tree::collect_result`] has been called since the last reset.
    pub fn collected(&self) -> bool {
        self.root.is_none()
    }

    /// Number of committed moves plus one.
    pub fn turns(&self) -> usize {
        self.history.len() + 1
    }

    /// Expansions and terminal absorptions since the last committed move.
    pub fn searches_this_turn(&self) -> u32 {
        self.searches_this_turn
    }

    pub fn root_node(&self) -> Option<&Node<S, M>> {
        self.root.map(|id| self.arena.get(id))
    }

    /// Children of the current root in insertion order.
    pub fn root_children(&self) -> impl Iterator<Item = &Node<S, M>> + '_ {
        self.root
            .into_iter()
            .flat_map(move |root| self.arena.children(root))
            .map(|(_, node)| node)
    }

    /// State of a pending leaf.
    pub fn leaf_state(&self, leaf: Leaf) -> Result<&S, TreeError> {
        self.root_id()?;
        if !self.arena.contains(leaf.0) {
            return Err(TreeError::StaleLeaf);
        }
        Ok(self.arena.get(leaf.0).state())
    }

    /// Walk from the root to an unexpanded node using PUCT.
    ///
    /// If the walk ends on a terminal node, its stored value is
    /// backpropagated again without consulting the evaluator and `None` is
    /// returned.
    pub fn select_leaf(&mut self) -> Result<Option<(Leaf, &S)>, TreeError> {
        let mut current = self.root_id()?;

        loop {
            let node = self.arena.get(current);

            if !node.is_expanded() {
                break;
            }

            if node.is_terminal() {
                let parent = node.parent;
                let value = node.total_value;

                self.arena.get_mut(current).visit_count += 1;
                self.ascend(parent, -value);
                self.searches_this_turn += 1;

                trace!(node = current.index, value, "absorbed terminal node");
                return Ok(None);
            }

            // Expanded non-terminal nodes always have at least one child.
            let Some(child) = self.select_child(current) else {
                break;
            };
            current = child;
        }

        Ok(Some((Leaf(current), self.arena.get(current).state())))
    }

    /// Pick the child with the highest PUCT score. Earlier children win ties.
    fn select_child(&self, node_id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(node_id);
        let exploration = exploration_factor(node.visit_count, self.c_init, self.c_base);
        let parent_visits_sqrt = (node.visit_count as f64).sqrt();

        let mut best: Option<(NodeId, f64)> = None;
        for (child_id, child) in self.arena.children(node_id) {
            let score = child.puct_score(exploration, parent_visits_sqrt);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child_id, score));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Expand a leaf with the evaluator's value and continuations.
    ///
    /// An empty `children` list marks the leaf as terminal with outcome
    /// `value`.
    pub fn expand_leaf(
        &mut self,
        leaf: Leaf,
        value: f64,
        children: Vec<Expansion<S, M>>,
    ) -> Result<(), TreeError> {
        self.root_id()?;
        if !self.arena.contains(leaf.0) {
            return Err(TreeError::StaleLeaf);
        }
        if self.arena.get(leaf.0).is_expanded() {
            return Err(TreeError::AlreadyExpanded);
        }

        let num_children = children.len();
        let mut prev: Option<NodeId> = None;

        for Expansion { mv, state, prior } in children {
            let child = self
                .arena
                .allocate(Node::new_child(leaf.0, mv, state, prior));

            match prev {
                None => self.arena.get_mut(leaf.0).child = Some(child),
                Some(prev_id) => self.arena.get_mut(prev_id).sibling = Some(child),
            }
            prev = Some(child);
        }

        self.ascend(Some(leaf.0), value);
        self.searches_this_turn += 1;

        trace!(
            leaf = leaf.0.index,
            children = num_children,
            value,
            "expanded leaf"
        );

        Ok(())
    }

    /// Add a value to every node from `start` up to the root, negating it
    /// at each level.
    fn ascend(&mut self, start: Option<NodeId>, mut value: f64) {
        let mut current = start;

        while let Some(id) = current {
            let node = self.arena.get_mut(id);
            node.visit_count += 1;
            node.total_value += value;
            value = -value;
            current = node.parent;
        }
    }

    /// Blend Dirichlet noise into the root priors:
    /// `prior = fraction * noise + (1 - fraction) * prior`.
    pub fn add_dirichlet_noise(&mut self, alpha: f64, fraction: f64) -> Result<(), TreeError> {
        let root = self.committable_root()?;

        let gamma =
            Gamma::new(alpha, 1.0).map_err(|e| TreeError::InvalidNoise(e.to_string()))?;

        let child_ids: Vec<NodeId> = self.arena.children(root).map(|(id, _)| id).collect();
        let mut noise: Vec<f64> = child_ids
            .iter()
            .map(|_| gamma.sample(&mut self.rng))
            .collect();

        let sum: f64 = noise.iter().sum();
        if sum > 0.0 {
            for n in &mut noise {
                *n /= sum;
            }
        }

        for (child_id, n) in child_ids.into_iter().zip(noise) {
            let child = self.arena.get_mut(child_id);
            child.prior = fraction * n + (1.0 - fraction) * child.prior;
        }

        Ok(())
    }

    /// Root id if a move can be committed from it.
    fn committable_root(&self) -> Result<NodeId, TreeError> {
        let root = self.root_id()?;
        let node = self.arena.get(root);

        if !node.is_expanded() {
            return Err(TreeError::NotExpanded);
        }
        if node.is_terminal() {
            return Err(TreeError::GameOver);
        }
        Ok(root)
    }

    /// Commit the most visited root child. Earlier children win ties.
    pub fn move_greedy(&mut self) -> Result<M, TreeError> {
        let root = self.committable_root()?;

        let mut best: Option<(NodeId, u32)> = None;
        for (child_id, child) in self.arena.children(root) {
            if best.map_or(true, |(_, visits)| child.visit_count > visits) {
                best = Some((child_id, child.visit_count));
            }
        }

        let Some((chosen, _)) = best else {
            return Err(TreeError::GameOver);
        };
        Ok(self.commit(chosen))
    }

    /// Commit a root child sampled in proportion to its visit count.
    ///
    /// With no searches beyond the root expansion, every child is equally
    /// likely.
    pub fn move_proportional(&mut self) -> Result<M, TreeError> {
        let root = self.committable_root()?;
        let root_visits = self.arena.get(root).visit_count;

        let chosen = if root_visits == 1 {
            let child_ids: Vec<NodeId> = self.arena.children(root).map(|(id, _)| id).collect();
            child_ids[self.rng.gen_range(0..child_ids.len())]
        } else {
            // Child visits sum to root_visits - 1.
            let mut selector = self.rng.gen_range(0..=root_visits - 2);
            let mut picked = None;
            let mut last = None;

            for (child_id, child) in self.arena.children(root) {
                last = Some(child_id);
                if selector < child.visit_count {
                    picked = Some(child_id);
                    break;
                }
                selector -= child.visit_count;
            }

            debug_assert!(picked.is_some(), "child visits do not cover root visits");
            match picked.or(last) {
                Some(id) => id,
                None => return Err(TreeError::GameOver),
            }
        };

        Ok(self.commit(chosen))
    }

    fn commit(&mut self, chosen: NodeId) -> M {
        match self.play_move(Some(chosen)) {
            Some(mv) => {
                debug!(turn = self.history.len(), "committed move");
                mv
            }
            None => unreachable!("non-root nodes always carry a move"),
        }
    }

    /// Record the current root as a history entry, release every root child
    /// other than `new_root`, and make `new_root` the root.
    ///
    /// Passing `None` releases the whole tree.
    fn play_move(&mut self, new_root: Option<NodeId>) -> Option<M> {
        let root = self.root?;
        let denom = self.arena.get(root).visit_count.saturating_sub(1);

        let child_ids: Vec<NodeId> = self.arena.children(root).map(|(id, _)| id).collect();
        let mut search_probabilities = Vec::with_capacity(child_ids.len());
        let mut chosen_move = None;

        for child_id in child_ids {
            let child = self.arena.get_mut(child_id);
            let fraction = if denom == 0 {
                0.0
            } else {
                child.visit_count as f64 / denom as f64
            };
            let mv = child.mv.take();

            if Some(child_id) == new_root {
                chosen_move = mv.clone();
            } else {
                self.arena.release_subtree(child_id);
            }

            if let Some(mv) = mv {
                search_probabilities.push((mv, fraction));
            }
        }

        let old_root = self.arena.recycle(root);
        self.history.push(HistoryEntry {
            state: old_root.state,
            search_probabilities,
        });

        if let Some(new_root) = new_root {
            let node = self.arena.get_mut(new_root);
            node.parent = None;
            node.sibling = None;
        }

        self.root = new_root;
        self.searches_this_turn = 0;

        chosen_move
    }

    /// Finish the game and hand back its score and history.
    ///
    /// The score is the root's stored value if the root is terminal and 0
    /// otherwise, negated when an even number of entries was recorded so it
    /// reads from the first player's perspective.
    pub fn collect_result(&mut self) -> Result<GameResult<S, M>, TreeError> {
        let root = self.arena.get(self.root_id()?);
        let mut score = if root.is_terminal() {
            root.total_value
        } else {
            0.0
        };

        self.play_move(None);

        if self.history.len() % 2 == 0 {
            score = -score;
        }

        let history = std::mem::take(&mut self.history);
        debug!(score, turns = history.len(), "collected game result");

        Ok(GameResult { score, history })
    }

    /// Discard all search state and start over at `initial_state`.
    pub fn reset(&mut self, initial_state: S) {
        if let Some(root) = self.root.take() {
            self.arena.release_subtree(root);
        }

        self.root = Some(self.arena.allocate(Node::new_root(initial_state)));
        self.history.clear();
        self.searches_this_turn = 0;
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let (root_visits, root_value) = self
            .root_node()
            .map_or((0, 0.0), |root| (root.visit_count, root.mean_value()));

        TreeStats {
            live_nodes: self.arena.len(),
            free_slots: self.arena.free_len(),
            root_visits,
            root_value,
            max_depth: self.root.map_or(0, |root| self.compute_max_depth(root)),
        }
    }

    fn compute_max_depth(&self, root: NodeId) -> u32 {
        let mut max_depth = 0;
        let mut stack = vec![(root, 0u32)];

        while let Some((node_id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.arena.children(node_id).map(|(id, _)| (id, depth + 1)));
        }

        max_depth
    }
}
