//! MCTS tree node representation.
//!
//! Each node represents a game state reached by playing a move from the
//! parent. Children form a singly linked list threaded through `sibling`,
//! in the order the evaluator supplied them.

/// Generational handle into a [`NodeArena`](crate::arena::NodeArena).
///
/// The generation is bumped every time a slot is recycled, so a handle kept
/// past a move commit or a reset no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node<S, M> {
    /// Move that led here from the parent. `None` at the root.
    pub(crate) mv: Option<M>,

    /// Game state at this node.
    pub(crate) state: S,

    /// Prior from the evaluator when the parent was expanded.
    /// Not renormalised after noise blending.
    pub(crate) prior: f64,

    pub(crate) parent: Option<NodeId>,
    pub(crate) child: Option<NodeId>,
    pub(crate) sibling: Option<NodeId>,

    /// 0 means not yet expanded.
    pub(crate) visit_count: u32,

    /// Sum of backpropagated values, from the perspective of the player
    /// to move at this node.
    pub(crate) total_value: f64,
}

impl<S, M> Node<S, M> {
    /// Create a fresh root node.
    pub(crate) fn new_root(state: S) -> Self {
        Self {
            mv: None,
            state,
            prior: 1.0,
            parent: None,
            child: None,
            sibling: None,
            visit_count: 0,
            total_value: 0.0,
        }
    }

    /// Create an unexpanded child node.
    pub(crate) fn new_child(parent: NodeId, mv: M, state: S, prior: f64) -> Self {
        Self {
            mv: Some(mv),
            state,
            prior,
            parent: Some(parent),
            child: None,
            sibling: None,
            visit_count: 0,
            total_value: 0.0,
        }
    }

    #[inline]
    pub fn mv(&self) -> Option<&M> {
        self.mv.as_ref()
    }

    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    #[inline]
    pub fn prior(&self) -> f64 {
        self.prior
    }

    #[inline]
    pub fn visit_count(&self) -> u32 {
        self.visit_count
    }

    #[inline]
    pub fn total_value(&self) -> f64 {
        self.total_value
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Mean value Q = total_value / visit_count, 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / self.visit_count as f64
        }
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.visit_count != 0
    }

    /// Expanded with no children: the game is over at this node.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.is_expanded() && self.child.is_none()
    }

    /// PUCT score of this node as a child of a parent with `parent_visits`.
    ///
    /// `exploration` is the parent-level factor
    /// `ln((1 + N_parent + c_base) / c_base) + c_init`, computed once per
    /// parent by the caller together with `parent_visits_sqrt`.
    #[inline]
    pub fn puct_score(&self, exploration: f64, parent_visits_sqrt: f64) -> f64 {
        let u = exploration * self.prior * parent_visits_sqrt / (1.0 + self.visit_count as f64);
        self.mean_value() + u
    }
}

/// Exploration factor of the PUCT rule for a parent with `parent_visits`.
#[inline]
pub fn exploration_factor(parent_visits: u32, c_init: f64, c_base: f64) -> f64 {
    ((1.0 + parent_visits as f64 + c_base) / c_base).ln() + c_init
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> NodeId {
        NodeId {
            index,
            generation: 0,
        }
    }

    #[test]
    fn test_new_root() {
        let node: Node<u8, u8> = Node::new_root(7);

        assert!(node.parent.is_none());
        assert!(node.mv().is_none());
        assert_eq!(*node.state(), 7);
        assert_eq!(node.visit_count(), 0);
        assert!((node.prior() - 1.0).abs() < 1e-12);
        assert!(!node.is_expanded());
        assert!(!node.is_terminal());
    }

    #[test]
    fn test_mean_value() {
        let mut node: Node<(), u8> = Node::new_child(id(0), 3, (), 0.5);

        assert_eq!(node.mean_value(), 0.0);

        node.visit_count = 4;
        node.total_value = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_requires_expansion() {
        let mut node: Node<(), u8> = Node::new_child(id(0), 0, (), 0.5);
        assert!(!node.is_terminal());

        node.visit_count = 1;
        assert!(node.is_terminal());

        node.child = Some(id(2));
        assert!(node.is_expanded());
        assert!(!node.is_terminal());
    }

    #[test]
    fn test_puct_score() {
        let mut node: Node<(), u8> = Node::new_child(id(0), 0, (), 0.5);
        node.visit_count = 10;
        node.total_value = 5.0;

        // c_init = 1.0, c_base = 19652, N_parent = 100
        let exploration = exploration_factor(100, 1.0, 19652.0);
        let expected_exploration = (101.0f64 + 19652.0) / 19652.0;
        assert!((exploration - (expected_exploration.ln() + 1.0)).abs() < 1e-12);

        // Q + U = 0.5 + exploration * 0.5 * 10 / 11
        let score = node.puct_score(exploration, 10.0);
        let expected = 0.5 + exploration * 0.5 * 10.0 / 11.0;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unvisited_score_is_pure_exploration() {
        let node: Node<(), u8> = Node::new_child(id(0), 0, (), 0.25);
        let score = node.puct_score(2.0, 3.0);
        assert!((score - 2.0 * 0.25 * 3.0).abs() < 1e-12);
    }
}
