//! Forward iteration over leaf entries.

use super::rtree_impl::RTree;
use super::rtree_types::{LeafEntry, Node, NodeId};

/// Depth-first iterator over every leaf entry of an [`RTree`].
///
/// Keeps an explicit stack of `(node, next index)` pairs, one per level, so
/// iteration never recurses.
pub struct Iter<'a, T, const D: usize> {
    tree: &'a RTree<T, D>,
    stack: Vec<(NodeId, usize)>,
}

impl<'a, T, const D: usize> Iter<'a, T, D> {
    pub(crate) fn new(tree: &'a RTree<T, D>) -> Self {
        let mut stack = Vec::with_capacity(tree.height());
        stack.push((tree.root_id(), 0));
        Self { tree, stack }
    }
}

impl<'a, T, const D: usize> Iterator for Iter<'a, T, D> {
    type Item = &'a LeafEntry<T, D>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node_id, index) = self.stack.pop()?;
            match self.tree.node(node_id) {
                Node::Leaf { entries } => {
                    if let Some(entry) = entries.get(index) {
                        self.stack.push((node_id, index + 1));
                        return Some(entry);
                    }
                }
                Node::Internal { children, .. } => {
                    if let Some(child) = children.get(index) {
                        self.stack.push((node_id, index + 1));
                        self.stack.push((child.node, 0));
                        assert!(
                            self.stack.len() <= self.tree.config().max_height(),
                            "iterator stack exceeds the configured maximum height"
                        );
                    }
                }
            }
        }
    }
}

impl<'a, T, const D: usize> IntoIterator for &'a RTree<T, D> {
    type Item = &'a LeafEntry<T, D>;
    type IntoIter = Iter<'a, T, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::bounding_box::BoundingBox;
    use crate::rtree::{RTree, RTreeConfig};

    #[test]
    fn test_iter_empty() {
        let tree: RTree<u32, 2> = RTree::new();
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_iter_visits_every_entry_once() {
        let config = RTreeConfig::builder().max_fill(3).min_fill(1).build().unwrap();
        let mut tree: RTree<u32, 1> = RTree::with_config(config);
        for i in 0..200u32 {
            let x = i as f64;
            tree.insert(BoundingBox::new([x], [x + 0.5]), i).unwrap();
        }
        assert!(tree.height() > 3);

        let mut seen: Vec<u32> = (&tree).into_iter().map(|entry| entry.data).collect();
        seen.sort();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }
}
