//! Connect-K reference game for the MCTS engine.
//!
//! Connect-K generalises Connect 4 to any board size and line length: two
//! players drop pieces into columns of a `rows x cols` grid and the first to
//! line up `k` pieces horizontally, vertically or diagonally wins.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 2: [ 8][ 9][10][11]  <- Top
//! Row 1: [ 4][ 5][ 6][ 7]
//! Row 0: [ 0][ 1][ 2][ 3]  <- Bottom
//!         Col 0  1  2  3
//! ```
//!
//! Outcomes are reported from the perspective of the player to move, which
//! is what the search tree expects from its evaluator: a finished game is
//! always a loss (the opponent just connected) or a draw (board full).
//!
//! # Usage
//!
//! ```rust
//! use games_connectk::{ConnectK, UniformEvaluator};
//!
//! let game = ConnectK::standard();
//! let evaluator = UniformEvaluator::new(game);
//! let results = mcts::run_self_play(4, 50, 1.25, 19652.0, game.initial_state(), &evaluator).unwrap();
//! assert_eq!(results.len(), 4);
//! ```

use std::fmt;

use mcts::{Evaluation, Evaluator, EvaluatorError, Expansion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A move is the column a piece is dropped into.
pub type Move = u8;

/// Errors from constructing a game or playing a move.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid board {rows}x{cols} for k = {k}")]
    InvalidDimensions { rows: usize, cols: usize, k: usize },

    #[error("illegal move: column {0}")]
    IllegalMove(Move),

    #[error("game is over")]
    GameOver,
}

/// Rules of a Connect-K variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectK {
    rows: u8,
    cols: u8,
    k: u8,
}

impl ConnectK {
    /// Create a variant. `k` must fit on the board in at least one direction.
    pub fn new(rows: usize, cols: usize, k: usize) -> Result<Self, GameError> {
        let invalid = GameError::InvalidDimensions { rows, cols, k };

        if rows == 0 || cols == 0 || k == 0 || k > rows.max(cols) {
            return Err(invalid);
        }
        let (Ok(r), Ok(c), Ok(k8)) = (u8::try_from(rows), u8::try_from(cols), u8::try_from(k))
        else {
            return Err(invalid);
        };
        // Board indices must fit in a u16.
        if rows * cols > u16::MAX as usize {
            return Err(invalid);
        }

        Ok(Self {
            rows: r,
            cols: c,
            k: k8,
        })
    }

    /// Classic Connect 4: 6 rows, 7 columns, four in a row.
    pub fn standard() -> Self {
        Self {
            rows: 6,
            cols: 7,
            k: 4,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn k(&self) -> usize {
        self.k as usize
    }

    /// Empty board with player 1 to move.
    pub fn initial_state(&self) -> State {
        State::new(*self)
    }
}

impl Default for ConnectK {
    fn default() -> Self {
        Self::standard()
    }
}

/// How a finished game ended, for the player to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The opponent completed a line with the last move.
    Loss,
    /// The board filled up without a line.
    Draw,
}

impl Outcome {
    /// Value for the player to move: -1 for a loss, 0 for a draw.
    pub fn value(self) -> f64 {
        match self {
            Outcome::Loss => -1.0,
            Outcome::Draw => 0.0,
        }
    }
}

/// Connect-K game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    game: ConnectK,
    /// 0=empty, 1=player 1, 2=player 2. Row-major, row 0 at the bottom.
    board: Vec<u8>,
    /// Number of pieces in each column.
    column_heights: Vec<u8>,
    /// 1 or 2.
    current_player: u8,
    outcome: Option<Outcome>,
}

impl State {
    pub fn new(game: ConnectK) -> Self {
        Self {
            game,
            board: vec![0; game.rows() * game.cols()],
            column_heights: vec![0; game.cols()],
            current_player: 1,
            outcome: None,
        }
    }

    pub fn game(&self) -> ConnectK {
        self.game
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// Piece at `(row, col)`: 0 for empty, otherwise the player number.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.board[self.pos(col, row)]
    }

    /// Number of pieces on the board.
    pub fn pieces(&self) -> usize {
        self.column_heights.iter().map(|&h| h as usize).sum()
    }

    /// Columns that are not full. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_done() {
            return Vec::new();
        }

        (0..self.game.cols)
            .filter(|&col| self.column_heights[col as usize] < self.game.rows)
            .collect()
    }

    #[inline]
    fn pos(&self, col: usize, row: usize) -> usize {
        row * self.game.cols() + col
    }

    /// Drop a piece for the player to move and return the resulting state.
    pub fn play(&self, column: Move) -> Result<State, GameError> {
        if self.is_done() {
            return Err(GameError::GameOver);
        }

        let col = column as usize;
        if col >= self.game.cols() || self.column_heights[col] >= self.game.rows {
            return Err(GameError::IllegalMove(column));
        }

        let mut next = self.clone();
        let row = self.column_heights[col] as usize;
        let pos = self.pos(col, row);

        next.board[pos] = self.current_player;
        next.column_heights[col] += 1;
        next.current_player = 3 - self.current_player;

        if next.connects_at(col, row) {
            next.outcome = Some(Outcome::Loss);
        } else if next
            .column_heights
            .iter()
            .all(|&h| h >= self.game.rows)
        {
            next.outcome = Some(Outcome::Draw);
        }

        Ok(next)
    }

    /// Whether the piece at `(col, row)` is part of a line of at least `k`.
    fn connects_at(&self, col: usize, row: usize) -> bool {
        let player = self.board[self.pos(col, row)];
        if player == 0 {
            return false;
        }

        let (cols, rows) = (self.game.cols() as i32, self.game.rows() as i32);

        // Horizontal, vertical, diagonal /, diagonal \
        let directions: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        for (dc, dr) in directions {
            let mut count = 1;

            for sign in [1, -1] {
                let (mut c, mut r) = (col as i32 + sign * dc, row as i32 + sign * dr);
                while c >= 0 && c < cols && r >= 0 && r < rows {
                    if self.board[self.pos(c as usize, r as usize)] != player {
                        break;
                    }
                    count += 1;
                    c += sign * dc;
                    r += sign * dr;
                }
            }

            if count >= self.game.k() {
                return true;
            }
        }

        false
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "#".repeat(self.game.cols() + 2);
        writeln!(f, "{border}")?;

        for row in (0..self.game.rows()).rev() {
            write!(f, "#")?;
            for col in 0..self.game.cols() {
                let c = match self.cell(row, col) {
                    1 => '*',
                    2 => '+',
                    _ => ' ',
                };
                write!(f, "{c}")?;
            }
            writeln!(f, "#")?;
        }

        write!(f, "{border}")
    }
}

/// Evaluator with a uniform policy over legal moves and a neutral value.
///
/// Terminal states are scored with their actual outcome. Useful for tests
/// and for bootstrapping self-play before any model exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformEvaluator {
    game: ConnectK,
}

impl UniformEvaluator {
    pub fn new(game: ConnectK) -> Self {
        Self { game }
    }

    pub fn game(&self) -> ConnectK {
        self.game
    }

    fn evaluate(&self, state: &State) -> Result<Evaluation<State, Move>, EvaluatorError> {
        if state.game() != self.game {
            return Err(EvaluatorError::InvalidState(format!(
                "expected {}x{} k={}, got {}x{} k={}",
                self.game.rows(),
                self.game.cols(),
                self.game.k(),
                state.game().rows(),
                state.game().cols(),
                state.game().k(),
            )));
        }

        if let Some(outcome) = state.outcome() {
            return Ok(Evaluation::terminal(outcome.value()));
        }

        let moves = state.legal_moves();
        let prior = 1.0 / moves.len() as f64;
        let children = moves
            .into_iter()
            .map(|mv| {
                state
                    .play(mv)
                    .map(|next| Expansion::new(mv, next, prior))
                    .map_err(|e| EvaluatorError::InvalidState(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Evaluation::new(0.0, children))
    }
}

impl Evaluator<State, Move> for UniformEvaluator {
    fn evaluate_batch(
        &self,
        states: &[State],
    ) -> Result<Vec<Evaluation<State, Move>>, EvaluatorError> {
        states.iter().map(|state| self.evaluate(state)).collect()
    }
}
