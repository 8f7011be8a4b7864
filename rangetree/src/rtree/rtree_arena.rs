//! Arena storage for R-Tree nodes.
//!
//! Nodes live in a vector of slots addressed by [`NodeId`]. A freed slot is
//! pushed on a free list and handed out again by the next allocation, so
//! long insert/delete workloads do not grow the arena without bound.

use super::rtree_types::{Node, NodeId};

/// Slot storage for the nodes of one tree
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<T, const D: usize> {
    slots: Vec<Option<Node<T, D>>>,
    /// Freed slot ids available for reuse
    free_slots: Vec<NodeId>,
}

impl<T, const D: usize> NodeArena<T, D> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Store a node, reusing a freed slot when one is available
    pub fn allocate(&mut self, node: Node<T, D>) -> NodeId {
        if let Some(id) = self.free_slots.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    /// Take a node out of the arena and recycle its slot
    pub fn free(&mut self, id: NodeId) -> Node<T, D> {
        let node = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("double free of node slot {}", id.index()));
        self.free_slots.push(id);
        node
    }

    pub fn get(&self, id: NodeId) -> &Node<T, D> {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("dangling node id {}", id.index()))
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<T, D> {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("dangling node id {}", id.index()))
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Drop every node and forget all slots
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_get() {
        let mut arena: NodeArena<u32, 2> = NodeArena::new();
        let a = arena.allocate(Node::empty_leaf());
        let b = arena.allocate(Node::Internal {
            children: Vec::new(),
            level: 1,
        });
        assert_ne!(a, b);
        assert!(arena.get(a).is_leaf());
        assert_eq!(arena.get(b).level(), 1);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_free_slot_is_reused() {
        let mut arena: NodeArena<u32, 2> = NodeArena::new();
        let a = arena.allocate(Node::empty_leaf());
        let _b = arena.allocate(Node::empty_leaf());
        arena.free(a);
        assert_eq!(arena.len(), 1);

        let c = arena.allocate(Node::empty_leaf());
        assert_eq!(c, a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_panics() {
        let mut arena: NodeArena<u32, 2> = NodeArena::new();
        let a = arena.allocate(Node::empty_leaf());
        arena.free(a);
        arena.free(a);
    }

    #[test]
    fn test_clear() {
        let mut arena: NodeArena<u32, 2> = NodeArena::new();
        arena.allocate(Node::empty_leaf());
        arena.allocate(Node::empty_leaf());
        arena.clear();
        assert_eq!(arena.len(), 0);
    }
}
