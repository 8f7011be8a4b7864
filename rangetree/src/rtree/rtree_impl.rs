//! RTree implementation.

use std::ops::ControlFlow;

use crate::bounding_box::{BoundingBox, VolumeMetric};
use crate::visitor::{
    Accept, AcceptEnclosing, AcceptOverlapping, CollectVisitor, LeafRemover, RemoveAnyLeaf,
    RemovePolicy, RemoveSpecificLeaf, Visitor, VisitorMut,
};

use super::iter::Iter;
use super::rtree_arena::NodeArena;
use super::rtree_config::RTreeConfig;
use super::rtree_types::{
    ChildRef, IntegrityReport, LeafEntry, Node, NodeId, RTreeStats, SpatialResult,
};
use super::split::split_entries;

/// In-memory R-Tree over `D`-dimensional bounding boxes carrying payloads of
/// type `T`.
///
/// The tree starts as a single empty leaf. Inserts descend along the child
/// needing the least enlargement and split overflowing nodes on the way back
/// up; removals condense under-full nodes and reinsert their entries.
///
/// # Examples
///
/// ```rust
/// use rangetree::{AcceptOverlapping, BoundingBox, CollectVisitor, RTree};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tree: RTree<&str, 2> = RTree::new();
/// tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]), "a")?;
/// tree.insert(BoundingBox::new([5.0, 5.0], [6.0, 6.0]), "b")?;
///
/// let probe = AcceptOverlapping::new(BoundingBox::new([0.0, 0.0], [2.0, 2.0]));
/// let found = tree.query(&probe, CollectVisitor::new()).into_items();
/// assert_eq!(found, vec!["a"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RTree<T, const D: usize> {
    pub(super) config: RTreeConfig,
    pub(super) arena: NodeArena<T, D>,
    pub(super) root: NodeId,
}

impl<T, const D: usize> Default for RTree<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const D: usize> RTree<T, D> {
    /// Create an empty tree with the default configuration
    pub fn new() -> Self {
        Self::with_config(RTreeConfig::default())
    }

    /// Create an empty tree with a validated configuration
    pub fn with_config(config: RTreeConfig) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::empty_leaf());
        Self {
            config,
            arena,
            root,
        }
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// Number of levels; a tree whose root is a leaf has height 1
    pub fn height(&self) -> usize {
        self.arena.get(self.root).level() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.arena.get(self.root).is_empty()
    }

    /// Box covering every entry, `None` for an empty tree
    pub fn bounds(&self) -> Option<BoundingBox<D>> {
        self.arena.get(self.root).compute_bbox()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<T, D> {
        self.arena.get(id)
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    /// Iterate over every leaf entry, depth-first in storage order
    pub fn iter(&self) -> Iter<'_, T, D> {
        Iter::new(self)
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert a record under `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBoundingBox`](crate::SpatialError) if
    /// `bbox` has `min > max` or a NaN coordinate; the tree is not touched.
    pub fn insert(&mut self, bbox: BoundingBox<D>, data: T) -> SpatialResult<()> {
        bbox.validate()?;
        self.insert_entry(LeafEntry { bbox, data });
        Ok(())
    }

    fn insert_entry(&mut self, entry: LeafEntry<T, D>) {
        if let Some(sibling) = self.insert_rec(self.root, entry, 0) {
            self.grow_root(sibling);
        }
    }

    /// Returns the new sibling when `node_id` had to split
    fn insert_rec(&mut self, node_id: NodeId, entry: LeafEntry<T, D>, depth: usize) -> Option<NodeId> {
        self.assert_depth(depth);
        let max_fill = self.config.max_fill();
        let metric = self.config.volume_metric();
        let bbox = entry.bbox;

        let (index, child_id) = match self.arena.get_mut(node_id) {
            Node::Leaf { entries } => {
                entries.push(entry);
                if entries.len() <= max_fill {
                    return None;
                }
                return Some(self.split_node(node_id));
            }
            Node::Internal { children, .. } => {
                let index = choose_subtree(children, &bbox, metric);
                (index, children[index].node)
            }
        };

        match self.insert_rec(child_id, entry, depth + 1) {
            None => {
                self.children_mut(node_id)[index].bbox.expand(&bbox);
                None
            }
            Some(sibling) => {
                let updated = self.child_ref(child_id);
                let added = self.child_ref(sibling);
                let children = self.children_mut(node_id);
                children[index] = updated;
                children.push(added);
                if children.len() > max_fill {
                    Some(self.split_node(node_id))
                } else {
                    None
                }
            }
        }
    }

    /// Split an overflowing node in place; returns the new sibling
    fn split_node(&mut self, node_id: NodeId) -> NodeId {
        let max_fill = self.config.max_fill();
        let min_fill = self.config.min_fill();
        let metric = self.config.volume_metric();

        let sibling = match self.arena.get_mut(node_id) {
            Node::Leaf { entries } => {
                debug_assert_eq!(entries.len(), max_fill + 1, "split of a leaf that is not overflowing");
                let (keep, moved) = split_entries(std::mem::take(entries), min_fill, metric);
                *entries = keep;
                Node::Leaf { entries: moved }
            }
            Node::Internal { children, level } => {
                debug_assert_eq!(children.len(), max_fill + 1, "split of a node that is not overflowing");
                let (keep, moved) = split_entries(std::mem::take(children), min_fill, metric);
                *children = keep;
                Node::Internal {
                    children: moved,
                    level: *level,
                }
            }
        };
        self.arena.allocate(sibling)
    }

    fn grow_root(&mut self, sibling: NodeId) {
        let old_root = self.root;
        let level = self.arena.get(old_root).level() + 1;
        assert!(
            (level as usize) < self.config.max_height(),
            "tree height would exceed the configured maximum of {}",
            self.config.max_height()
        );

        let children = vec![self.child_ref(old_root), self.child_ref(sibling)];
        self.root = self.arena.allocate(Node::Internal { children, level });
        log::debug!("root split, tree height is now {}", level + 1);
    }

    fn child_ref(&self, node: NodeId) -> ChildRef<D> {
        let bbox = self
            .arena
            .get(node)
            .compute_bbox()
            .unwrap_or_else(|| panic!("node {} has no entries to bound", node.index()));
        ChildRef { bbox, node }
    }

    fn children_mut(&mut self, node_id: NodeId) -> &mut Vec<ChildRef<D>> {
        match self.arena.get_mut(node_id) {
            Node::Internal { children, .. } => children,
            Node::Leaf { .. } => panic!("node {} is a leaf", node_id.index()),
        }
    }

    fn assert_depth(&self, depth: usize) {
        assert!(
            depth < self.config.max_height(),
            "traversal depth {} exceeds the configured maximum height {}",
            depth,
            self.config.max_height()
        );
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove every entry overlapping `bbox` whose payload equals `key`.
    ///
    /// Returns `Ok(false)` when nothing matched.
    pub fn remove(&mut self, bbox: &BoundingBox<D>, key: &T) -> SpatialResult<bool>
    where
        T: PartialEq,
    {
        self.remove_with(bbox, key, RemovePolicy::All)
    }

    /// Like [`RTree::remove`] with an explicit duplicate policy
    pub fn remove_with(
        &mut self,
        bbox: &BoundingBox<D>,
        key: &T,
        policy: RemovePolicy,
    ) -> SpatialResult<bool>
    where
        T: PartialEq,
    {
        bbox.validate()?;
        let accept = AcceptOverlapping::new(*bbox);
        let mut remover = RemoveSpecificLeaf::new(key, policy);
        Ok(self.remove_if(&accept, &mut remover) > 0)
    }

    /// Remove every entry lying entirely inside `bbox`; returns how many
    pub fn remove_area(&mut self, bbox: &BoundingBox<D>) -> SpatialResult<usize> {
        bbox.validate()?;
        Ok(self.remove_if(&AcceptEnclosing::new(*bbox), &mut RemoveAnyLeaf))
    }

    /// Remove the accepted leaves `remover` selects, then condense the tree.
    ///
    /// Under-full nodes left behind are dissolved and their entries are
    /// reinserted from the root. Returns the number of removed entries.
    pub fn remove_if<A, R>(&mut self, accept: &A, remover: &mut R) -> usize
    where
        A: Accept<D>,
        R: LeafRemover<T, D>,
    {
        let mut orphans = Vec::new();
        let removed = self.remove_rec(self.root, accept, remover, &mut orphans, 0);
        if removed == 0 {
            return 0;
        }

        if !self.arena.get(self.root).is_leaf() && self.arena.get(self.root).is_empty() {
            self.arena.free(self.root);
            self.root = self.arena.allocate(Node::empty_leaf());
            log::debug!("every root child dissolved, root reset to a leaf");
        }

        if !orphans.is_empty() {
            log::trace!("reinserting {} orphaned entries", orphans.len());
        }
        for entry in orphans {
            self.insert_entry(entry);
        }

        self.collapse_root();
        removed
    }

    fn remove_rec<A, R>(
        &mut self,
        node_id: NodeId,
        accept: &A,
        remover: &mut R,
        orphans: &mut Vec<LeafEntry<T, D>>,
        depth: usize,
    ) -> usize
    where
        A: Accept<D>,
        R: LeafRemover<T, D>,
    {
        self.assert_depth(depth);

        if let Node::Leaf { entries } = self.arena.get_mut(node_id) {
            let before = entries.len();
            let mut index = 0;
            while index < entries.len() && remover.continue_visiting() {
                if accept.accepts_leaf(&entries[index].bbox) && remover.should_remove(&entries[index]) {
                    entries.remove(index);
                } else {
                    index += 1;
                }
            }
            return before - entries.len();
        }

        let min_fill = self.config.min_fill();
        let mut removed = 0;
        let mut index = 0;
        while index < self.children_mut(node_id).len() && remover.continue_visiting() {
            let child = self.children_mut(node_id)[index];
            if !accept.accepts_node(&child.bbox) {
                index += 1;
                continue;
            }

            let count = self.remove_rec(child.node, accept, remover, orphans, depth + 1);
            if count == 0 {
                index += 1;
                continue;
            }
            removed += count;

            if self.arena.get(child.node).len() < min_fill {
                self.children_mut(node_id).remove(index);
                self.flatten_into(child.node, orphans, depth + 1);
            } else {
                let updated = self.child_ref(child.node);
                self.children_mut(node_id)[index] = updated;
                index += 1;
            }
        }
        removed
    }

    /// Free a detached subtree, keeping only its leaf entries
    fn flatten_into(&mut self, node_id: NodeId, orphans: &mut Vec<LeafEntry<T, D>>, depth: usize) {
        self.assert_depth(depth);
        match self.arena.free(node_id) {
            Node::Leaf { entries } => orphans.extend(entries),
            Node::Internal { children, .. } => {
                for child in children {
                    self.flatten_into(child.node, orphans, depth + 1);
                }
            }
        }
    }

    /// Replace an internal root holding a single child by that child
    fn collapse_root(&mut self) {
        loop {
            let only_child = match self.arena.get(self.root) {
                Node::Internal { children, .. } if children.len() == 1 => children[0].node,
                _ => break,
            };
            self.arena.free(self.root);
            self.root = only_child;
            log::debug!("root collapsed, tree height is now {}", self.height());
        }
    }

    /// Drop every entry, leaving a single empty leaf root
    pub fn remove_all(&mut self) {
        self.arena.clear();
        self.root = self.arena.allocate(Node::empty_leaf());
        log::debug!("removed all entries");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Depth-first walk feeding every accepted leaf to `visitor`.
    ///
    /// The walk stops as soon as the visitor returns `Break`; the visitor is
    /// handed back either way.
    pub fn query<A, V>(&self, accept: &A, mut visitor: V) -> V
    where
        A: Accept<D>,
        V: Visitor<T, D>,
    {
        let _ = self.visit_rec(self.root, accept, &mut visitor, 0);
        visitor
    }

    fn visit_rec<A, V>(&self, node_id: NodeId, accept: &A, visitor: &mut V, depth: usize) -> ControlFlow<()>
    where
        A: Accept<D>,
        V: Visitor<T, D>,
    {
        self.assert_depth(depth);
        match self.arena.get(node_id) {
            Node::Leaf { entries } => {
                for entry in entries {
                    if accept.accepts_leaf(&entry.bbox) {
                        visitor.visit(entry)?;
                    }
                }
            }
            Node::Internal { children, .. } => {
                for child in children {
                    if accept.accepts_node(&child.bbox) {
                        self.visit_rec(child.node, accept, visitor, depth + 1)?;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Like [`RTree::query`] but the visitor may edit payloads in place
    pub fn query_mut<A, V>(&mut self, accept: &A, mut visitor: V) -> V
    where
        A: Accept<D>,
        V: VisitorMut<T, D>,
    {
        let root = self.root;
        let _ = self.visit_mut_rec(root, accept, &mut visitor, 0);
        visitor
    }

    fn visit_mut_rec<A, V>(&mut self, node_id: NodeId, accept: &A, visitor: &mut V, depth: usize) -> ControlFlow<()>
    where
        A: Accept<D>,
        V: VisitorMut<T, D>,
    {
        self.assert_depth(depth);
        let accepted: Vec<NodeId> = match self.arena.get_mut(node_id) {
            Node::Leaf { entries } => {
                for entry in entries.iter_mut() {
                    if accept.accepts_leaf(&entry.bbox) {
                        visitor.visit_mut(&entry.bbox, &mut entry.data)?;
                    }
                }
                return ControlFlow::Continue(());
            }
            Node::Internal { children, .. } => children
                .iter()
                .filter(|child| accept.accepts_node(&child.bbox))
                .map(|child| child.node)
                .collect(),
        };

        for child in accepted {
            self.visit_mut_rec(child, accept, visitor, depth + 1)?;
        }
        ControlFlow::Continue(())
    }

    /// Count entries overlapping `bbox`, calling `callback` on each.
    ///
    /// Returning `false` from the callback stops the search; the entry that
    /// stopped it is included in the count.
    pub fn search<F>(&self, bbox: &BoundingBox<D>, mut callback: F) -> SpatialResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        bbox.validate()?;
        let mut found = 0;
        let _ = self.query(&AcceptOverlapping::new(*bbox), |entry: &LeafEntry<T, D>| {
            found += 1;
            if callback(&entry.data) {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });
        Ok(found)
    }

    /// Payloads of every entry overlapping `bbox`
    pub fn find_intersecting(&self, bbox: &BoundingBox<D>) -> SpatialResult<Vec<T>>
    where
        T: Clone,
    {
        bbox.validate()?;
        Ok(self
            .query(&AcceptOverlapping::new(*bbox), CollectVisitor::new())
            .into_items())
    }

    /// Payloads of every entry lying entirely inside `bbox`
    pub fn find_contained(&self, bbox: &BoundingBox<D>) -> SpatialResult<Vec<T>>
    where
        T: Clone,
    {
        bbox.validate()?;
        Ok(self
            .query(&AcceptEnclosing::new(*bbox), CollectVisitor::new())
            .into_items())
    }

    /// Number of entries. Walks the whole tree; no counter is maintained.
    pub fn count(&self) -> usize {
        self.count_rec(self.root, 0)
    }

    fn count_rec(&self, node_id: NodeId, depth: usize) -> usize {
        self.assert_depth(depth);
        match self.arena.get(node_id) {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { children, .. } => children
                .iter()
                .map(|child| self.count_rec(child.node, depth + 1))
                .sum(),
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Get shape statistics
    pub fn stats(&self) -> RTreeStats {
        let mut stats = RTreeStats {
            tree_height: self.height() as u32,
            ..RTreeStats::default()
        };
        let mut slots_used = 0u64;
        self.stats_rec(self.root, &mut stats, &mut slots_used, 0);

        let nodes = stats.leaf_nodes + stats.internal_nodes;
        stats.fill_factor = slots_used as f64 / (nodes * self.config.max_fill() as u64) as f64;
        stats
    }

    fn stats_rec(
        &self,
        node_id: NodeId,
        stats: &mut RTreeStats,
        slots_used: &mut u64,
        depth: usize,
    ) {
        self.assert_depth(depth);
        let node = self.arena.get(node_id);
        *slots_used += node.len() as u64;
        match node {
            Node::Leaf { entries } => {
                stats.leaf_nodes += 1;
                stats.total_entries += entries.len() as u64;
            }
            Node::Internal { children, .. } => {
                stats.internal_nodes += 1;
                for child in children {
                    self.stats_rec(child.node, stats, slots_used, depth + 1);
                }
            }
        }
    }

    /// Check fill bounds, levels and stored boxes of every node
    ///
    /// This walks the whole tree and reports each violation found:
    /// - nodes holding more than max fill entries
    /// - non-root nodes holding fewer than min fill entries
    /// - internal entries whose box is not exactly the child's cover
    /// - children whose level is not one below their parent's
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::new();
        let root = self.arena.get(self.root);
        if !root.is_leaf() && root.len() < 2 {
            report.fail(format!("internal root holds {} children", root.len()));
        }
        self.check_node(self.root, None, &mut report, 0);
        report
    }

    fn check_node(&self, node_id: NodeId, expected_level: Option<u32>, report: &mut IntegrityReport, depth: usize) {
        report.nodes_checked += 1;
        let node = self.arena.get(node_id);
        let is_root = node_id == self.root;

        if depth >= self.config.max_height() {
            report.fail(format!("node {} lies deeper than the maximum height", node_id.index()));
            return;
        }
        if let Some(level) = expected_level {
            if node.level() != level {
                report.level_mismatches += 1;
                report.fail(format!(
                    "node {} has level {}, expected {}",
                    node_id.index(),
                    node.level(),
                    level
                ));
            }
        }
        if node.len() > self.config.max_fill() {
            report.overfull_nodes += 1;
            report.fail(format!("node {} holds {} entries", node_id.index(), node.len()));
        }
        if !is_root && node.len() < self.config.min_fill() {
            report.underfull_nodes += 1;
            report.fail(format!("node {} holds only {} entries", node_id.index(), node.len()));
        }

        if let Node::Internal { children, level } = node {
            if *level == 0 {
                report.level_mismatches += 1;
                report.fail(format!("internal node {} has level 0", node_id.index()));
                return;
            }
            for child in children {
                if self.arena.get(child.node).compute_bbox() != Some(child.bbox) {
                    report.stale_bounds += 1;
                    report.fail(format!(
                        "stale bounding box {} for child {}",
                        child.bbox,
                        child.node.index()
                    ));
                }
                self.check_node(child.node, Some(level - 1), report, depth + 1);
            }
        }
    }
}

/// Child needing the least enlargement to cover `bbox`; ties go to the smaller
/// resulting volume, then the smaller existing volume, then the lower index.
fn choose_subtree<const D: usize>(children: &[ChildRef<D>], bbox: &BoundingBox<D>, metric: VolumeMetric) -> usize {
    debug_assert!(!children.is_empty(), "descending into an internal node without children");
    let mut best = 0;
    let mut best_key = (f64::INFINITY, f64::INFINITY, f64::INFINITY);

    for (index, child) in children.iter().enumerate() {
        let existing = child.bbox.measure(metric);
        let resulting = child.bbox.combine(bbox).measure(metric);
        let key = (resulting - existing, resulting, existing);
        if key < best_key {
            best = index;
            best_key = key;
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================
