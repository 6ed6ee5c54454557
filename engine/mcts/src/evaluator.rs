//! Evaluator trait for batched position evaluation.
//!
//! The evaluator scores game states and proposes their continuations. In
//! AlphaZero this is a neural network; game rules (legal moves, terminal
//! detection) are folded in here too, so the search only ever sees opaque
//! states and moves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Model error: {0}")]
    Model(String),
}

/// One legal continuation of an evaluated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion<S, M> {
    /// Move leading to the child.
    pub mv: M,
    /// Game state after the move.
    pub state: S,
    /// Prior probability assigned to the move.
    pub prior: f64,
}

impl<S, M> Expansion<S, M> {
    pub fn new(mv: M, state: S, prior: f64) -> Self {
        Self { mv, state, prior }
    }
}

/// Result of evaluating one game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation<S, M> {
    /// Value estimate for the player to move.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f64,

    /// Legal continuations in the order they should be searched.
    /// Empty when the state is terminal.
    pub children: Vec<Expansion<S, M>>,
}

impl<S, M> Evaluation<S, M> {
    pub fn new(value: f64, children: Vec<Expansion<S, M>>) -> Self {
        Self { value, children }
    }

    /// A terminal evaluation: no continuations, `value` is the outcome.
    pub fn terminal(value: f64) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }
}

/// Trait for batched position evaluators.
///
/// Implementations must return exactly one [`Evaluation`] per submitted
/// state, in submission order. The call is synchronous: the coordinator does
/// not advance any tree until the whole batch has come back.
pub trait Evaluator<S, M> {
    fn evaluate_batch(&self, states: &[S]) -> Result<Vec<Evaluation<S, M>>, EvaluatorError>;
}

impl<S, M, F> Evaluator<S, M> for F
where
    F: Fn(&[S]) -> Result<Vec<Evaluation<S, M>>, EvaluatorError>,
{
    fn evaluate_batch(&self, states: &[S]) -> Result<Vec<Evaluation<S, M>>, EvaluatorError> {
        self(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_down(states: &[u32]) -> Result<Vec<Evaluation<u32, u32>>, EvaluatorError> {
        states
            .iter()
            .map(|&s| {
                if s == 0 {
                    Ok(Evaluation::terminal(-1.0))
                } else {
                    Ok(Evaluation::new(0.0, vec![Expansion::new(1, s - 1, 1.0)]))
                }
            })
            .collect()
    }

    #[test]
    fn test_function_is_evaluator() {
        let results = Evaluator::<u32, u32>::evaluate_batch(&count_down, &[2, 0]).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].children, vec![Expansion::new(1, 1, 1.0)]);
        assert!(results[1].children.is_empty());
        assert!((results[1].value + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closure_errors_propagate() {
        let failing = |_: &[u32]| -> Result<Vec<Evaluation<u32, u32>>, EvaluatorError> {
            Err(EvaluatorError::Model("weights not loaded".into()))
        };

        let err = Evaluator::<u32, u32>::evaluate_batch(&failing, &[1]).unwrap_err();
        assert_eq!(err.to_string(), "Model error: weights not loaded");
    }
}
