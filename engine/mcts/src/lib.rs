//! Batched Monte Carlo Tree Search for AlphaZero-style self-play.
//!
//! This crate is game-agnostic: game states `S` and moves `M` are opaque
//! to the search. Everything the search needs to know about a state (its
//! value, its legal continuations, whether it is terminal) comes from an
//! [`Evaluator`], which is called on whole batches of states at once.
//!
//! # Overview
//!
//! Each self-play game owns a [`Tree`]. A search step has three phases:
//!
//! 1. **Selection**: [`Tree::select_leaf`] walks down with PUCT to an
//!    unexpanded node. Walks that end on a terminal node are resolved
//!    inside the tree without an evaluation.
//! 2. **Evaluation**: the caller gathers leaf states from many trees and
//!    sends them to the evaluator in one batch.
//! 3. **Expansion and backpropagation**: [`Tree::expand_leaf`] attaches the
//!    evaluated continuations and propagates the value to the root,
//!    flipping its sign at each level.
//!
//! After enough searches a move is committed, which records a training
//! example ([`HistoryEntry`]) and keeps the chosen subtree as the next root.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcts::{run_self_play, Evaluation, EvaluatorError};
//!
//! let evaluator = |states: &[MyState]| -> Result<Vec<Evaluation<MyState, MyMove>>, EvaluatorError> {
//!     Ok(states.iter().map(|s| model.evaluate(s)).collect())
//! };
//!
//! let results = run_self_play(64, 200, 1.25, 19652.0, MyState::initial(), &evaluator)?;
//! for result in results {
//!     println!("score {} after {} positions", result.score, result.history.len());
//! }
//! ```
//!
//! # Drivers
//!
//! - [`run_self_play`] / [`BatchedSelfPlay`]: a fixed number of search rounds
//!   over a fixed set of games, then every game is played out on its tree.
//! - [`SelfPlayWorker`]: continuous round-robin scheduling that commits a
//!   move every `evaluations_per_move` searches and recycles trees until a
//!   target number of games is reached.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            BatchedSelfPlay / SelfPlayWorker                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Tree 0    │  │   Tree n    │  │     Evaluator       │  │
//! │  │  (arena)    │  │  (arena)    │  │ (batched value +    │  │
//! │  │             │  │             │  │  continuations)     │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//! │         │                │                    │             │
//! │         ▼                ▼                    ▼             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │   select all → evaluate batch → expand all            │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod arena;
pub mod batch;
pub mod config;
pub mod evaluator;
pub mod node;
pub mod tree;
pub mod worker;

// Re-export main types
pub use arena::NodeArena;
pub use batch::{run_self_play, BatchedSelfPlay, RoundStats, SelfPlayError};
pub use config::{ConfigError, SearchConfig};
pub use evaluator::{Evaluation, Evaluator, EvaluatorError, Expansion};
pub use node::{Node, NodeId};
pub use tree::{GameResult, HistoryEntry, Leaf, Tree, TreeError, TreeStats};
pub use worker::SelfPlayWorker;
