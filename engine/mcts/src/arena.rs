//! Pooled node storage with generational handles.
//!
//! Nodes live in a contiguous `Vec` of slots and are referenced by
//! [`NodeId`]. Recycled slots go on a free list and are handed out again
//! before the vector grows. Each recycle bumps the slot generation, so
//! handles to a released node stop resolving instead of aliasing the
//! node that later reuses the slot.

use crate::node::{Node, NodeId};

#[derive(Debug)]
struct Slot<S, M> {
    generation: u32,
    node: Option<Node<S, M>>,
}

/// Arena of tree nodes owned by a single search tree.
#[derive(Debug)]
pub struct NodeArena<S, M> {
    slots: Vec<Slot<S, M>>,
    free: Vec<u32>,
}

impl<S, M> NodeArena<S, M> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Store a node, reusing a freed slot when one is available.
    pub fn allocate(&mut self, node: Node<S, M>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.node.is_none(), "free list slot still occupied");
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Return a single node's slot to the pool and hand back the node.
    ///
    /// Links held by the node (children, siblings) are not followed.
    pub fn recycle(&mut self, id: NodeId) -> Node<S, M> {
        let slot = &mut self.slots[id.index as usize];
        assert_eq!(slot.generation, id.generation, "recycle of stale node {:?}", id);
        let node = slot
            .node
            .take()
            .unwrap_or_else(|| panic!("recycle of free node {:?}", id));

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        node
    }

    /// Recycle a node together with every node reachable through its child
    /// list. The node's own sibling link is not followed.
    ///
    /// Returns the number of nodes released.
    pub fn release_subtree(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let node = self.recycle(current);
            released += 1;

            let mut next_child = node.child;
            while let Some(child_id) = next_child {
                next_child = self.get(child_id).sibling;
                stack.push(child_id);
            }
        }

        released
    }

    /// Whether `id` still refers to a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
    }

    /// Get a node by handle. Panics on a stale handle.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<S, M> {
        let slot = &self.slots[id.index as usize];
        debug_assert_eq!(slot.generation, id.generation, "stale node {:?}", id);
        slot.node
            .as_ref()
            .unwrap_or_else(|| panic!("access to free node {:?}", id))
    }

    /// Get a node mutably by handle. Panics on a stale handle.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<S, M> {
        let slot = &mut self.slots[id.index as usize];
        debug_assert_eq!(slot.generation, id.generation, "stale node {:?}", id);
        slot.node
            .as_mut()
            .unwrap_or_else(|| panic!("access to free node {:?}", id))
    }

    /// Iterate over the children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> Children<'_, S, M> {
        Children {
            arena: self,
            next: self.get(id).child,
        }
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots waiting on the free list.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

impl<S, M> Default for NodeArena<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's child list.
pub struct Children<'a, S, M> {
    arena: &'a NodeArena<S, M>,
    next: Option<NodeId>,
}

impl<'a, S, M> Iterator for Children<'a, S, M> {
    type Item = (NodeId, &'a Node<S, M>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.arena.get(id);
        self.next = node.sibling;
        Some((id, node))
    }
}
