//! Acceptance predicates and visitors driving tree traversal.
//!
//! A traversal asks an [`Accept`] predicate twice per level: once with the
//! combined box of an internal entry (`accepts_node`, used for pruning) and
//! once with the exact box of a leaf entry (`accepts_leaf`, used for
//! selection). Each accepted leaf is handed to a [`Visitor`], which may stop
//! the walk by returning [`ControlFlow::Break`].

use std::ops::ControlFlow;

use crate::bounding_box::BoundingBox;
use crate::rtree::rtree_types::LeafEntry;

/// Boundary test used to prune subtrees and select leaves
pub trait Accept<const D: usize> {
    /// Test against the combined box of an internal entry
    fn accepts_node(&self, bbox: &BoundingBox<D>) -> bool;

    /// Test against the exact box of a leaf entry
    fn accepts_leaf(&self, bbox: &BoundingBox<D>) -> bool;
}

/// Accepts everything overlapping the query box
#[derive(Debug, Clone, Copy)]
pub struct AcceptOverlapping<const D: usize> {
    pub bound: BoundingBox<D>,
}

impl<const D: usize> AcceptOverlapping<D> {
    pub fn new(bound: BoundingBox<D>) -> Self {
        Self { bound }
    }
}

impl<const D: usize> Accept<D> for AcceptOverlapping<D> {
    fn accepts_node(&self, bbox: &BoundingBox<D>) -> bool {
        self.bound.overlaps(bbox)
    }

    fn accepts_leaf(&self, bbox: &BoundingBox<D>) -> bool {
        self.bound.overlaps(bbox)
    }
}

/// Accepts leaves lying entirely inside the query box.
///
/// Internal entries are still pruned by overlap: a node whose cover sticks
/// out of the query box may hold enclosed leaves.
#[derive(Debug, Clone, Copy)]
pub struct AcceptEnclosing<const D: usize> {
    pub bound: BoundingBox<D>,
}

impl<const D: usize> AcceptEnclosing<D> {
    pub fn new(bound: BoundingBox<D>) -> Self {
        Self { bound }
    }
}

impl<const D: usize> Accept<D> for AcceptEnclosing<D> {
    fn accepts_node(&self, bbox: &BoundingBox<D>) -> bool {
        self.bound.overlaps(bbox)
    }

    fn accepts_leaf(&self, bbox: &BoundingBox<D>) -> bool {
        self.bound.encloses(bbox)
    }
}

/// Accepts every node and leaf
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAny;

impl<const D: usize> Accept<D> for AcceptAny {
    fn accepts_node(&self, _bbox: &BoundingBox<D>) -> bool {
        true
    }

    fn accepts_leaf(&self, _bbox: &BoundingBox<D>) -> bool {
        true
    }
}

// ============================================================================
// Visitors
// ============================================================================

/// Consumer of accepted leaf entries
pub trait Visitor<T, const D: usize> {
    /// Called once per accepted leaf; `Break` stops the traversal
    fn visit(&mut self, entry: &LeafEntry<T, D>) -> ControlFlow<()>;
}

impl<T, const D: usize, F> Visitor<T, D> for F
where
    F: FnMut(&LeafEntry<T, D>) -> ControlFlow<()>,
{
    fn visit(&mut self, entry: &LeafEntry<T, D>) -> ControlFlow<()> {
        self(entry)
    }
}

/// Consumer allowed to edit payloads in place. Boxes stay read-only.
pub trait VisitorMut<T, const D: usize> {
    fn visit_mut(&mut self, bbox: &BoundingBox<D>, data: &mut T) -> ControlFlow<()>;
}

impl<T, const D: usize, F> VisitorMut<T, D> for F
where
    F: FnMut(&BoundingBox<D>, &mut T) -> ControlFlow<()>,
{
    fn visit_mut(&mut self, bbox: &BoundingBox<D>, data: &mut T) -> ControlFlow<()> {
        self(bbox, data)
    }
}

/// Clones the payload of every visited leaf
#[derive(Debug, Clone)]
pub struct CollectVisitor<T> {
    pub items: Vec<T>,
    limit: Option<usize>,
}

impl<T> CollectVisitor<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            limit: None,
        }
    }

    /// Stop the traversal once `limit` payloads were collected
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for CollectVisitor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const D: usize> Visitor<T, D> for CollectVisitor<T> {
    fn visit(&mut self, entry: &LeafEntry<T, D>) -> ControlFlow<()> {
        self.items.push(entry.data.clone());
        match self.limit {
            Some(limit) if self.items.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

/// Counts visited leaves, optionally stopping at a cap
#[derive(Debug, Clone, Copy, Default)]
pub struct CountVisitor {
    pub count: usize,
    cap: Option<usize>,
}

impl CountVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            count: 0,
            cap: Some(cap),
        }
    }
}

impl<T, const D: usize> Visitor<T, D> for CountVisitor {
    fn visit(&mut self, _entry: &LeafEntry<T, D>) -> ControlFlow<()> {
        self.count += 1;
        match self.cap {
            Some(cap) if self.count >= cap => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

// ============================================================================
// Removal
// ============================================================================

/// How many matches a keyed removal takes out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovePolicy {
    /// Remove every matching entry
    #[default]
    All,
    /// Stop after the first matching entry
    First,
}

/// Decides which accepted leaves a removal pass deletes
pub trait LeafRemover<T, const D: usize> {
    fn should_remove(&mut self, entry: &LeafEntry<T, D>) -> bool;

    /// Checked before each candidate; `false` ends the pass
    fn continue_visiting(&self) -> bool {
        true
    }
}

/// Removes every accepted leaf
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveAnyLeaf;

impl<T, const D: usize> LeafRemover<T, D> for RemoveAnyLeaf {
    fn should_remove(&mut self, _entry: &LeafEntry<T, D>) -> bool {
        true
    }
}

/// Removes accepted leaves whose payload equals a key
#[derive(Debug, Clone)]
pub struct RemoveSpecificLeaf<'a, T> {
    key: &'a T,
    policy: RemovePolicy,
    continue_visiting: bool,
}

impl<'a, T> RemoveSpecificLeaf<'a, T> {
    pub fn new(key: &'a T, policy: RemovePolicy) -> Self {
        Self {
            key,
            policy,
            continue_visiting: true,
        }
    }
}

impl<T: PartialEq, const D: usize> LeafRemover<T, D> for RemoveSpecificLeaf<'_, T> {
    fn should_remove(&mut self, entry: &LeafEntry<T, D>) -> bool {
        if self.continue_visiting && entry.data == *self.key {
            if self.policy == RemovePolicy::First {
                self.continue_visiting = false;
            }
            return true;
        }
        false
    }

    fn continue_visiting(&self) -> bool {
        self.continue_visiting
    }
}
