//! Core types and data structures for the R-Tree implementation.
//!
//! This module defines the fundamental types used throughout the R-Tree:
//! - Error types and result types
//! - Node types (Leaf and Internal) and their entries
//! - Statistics and integrity report structures

use std::io;
use thiserror::Error;

use crate::bounding_box::BoundingBox;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in spatial indexing operations
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Incompatible file header: {0}")]
    IncompatibleHeader(String),

    #[error("Corrupted tree data: {0}")]
    Corrupted(String),
}

impl From<bincode::error::EncodeError> for SpatialError {
    fn from(err: bincode::error::EncodeError) -> Self {
        SpatialError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for SpatialError {
    fn from(err: bincode::error::DecodeError) -> Self {
        match err {
            bincode::error::DecodeError::UnexpectedEnd { .. } => {
                SpatialError::Corrupted("unexpected end of input".into())
            }
            bincode::error::DecodeError::Io { inner, .. }
                if inner.kind() == io::ErrorKind::UnexpectedEof =>
            {
                SpatialError::Corrupted("unexpected end of input".into())
            }
            bincode::error::DecodeError::LimitExceeded => {
                SpatialError::Corrupted("encoded value exceeds the decode limit".into())
            }
            bincode::error::DecodeError::Io { inner, .. } => SpatialError::Io(inner),
            other => SpatialError::Serialization(other.to_string()),
        }
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Index of a node slot in the tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// Anything carrying a bounding box; lets the split engine work on both
/// leaf entries and child references.
pub trait Bounded<const D: usize> {
    fn bbox(&self) -> &BoundingBox<D>;
}

/// An entry in a leaf node: the exact box of a caller record plus the record
#[derive(Debug, Clone, PartialEq)]
pub struct LeafEntry<T, const D: usize> {
    pub bbox: BoundingBox<D>,
    pub data: T,
}

/// A child reference in an internal node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRef<const D: usize> {
    /// Minimum box covering every entry of the child
    pub bbox: BoundingBox<D>,
    pub node: NodeId,
}

impl<T, const D: usize> Bounded<D> for LeafEntry<T, D> {
    fn bbox(&self) -> &BoundingBox<D> {
        &self.bbox
    }
}

impl<const D: usize> Bounded<D> for ChildRef<D> {
    fn bbox(&self) -> &BoundingBox<D> {
        &self.bbox
    }
}

/// Node types in the R-Tree
#[derive(Debug, Clone)]
pub enum Node<T, const D: usize> {
    /// Leaf node containing actual entries
    Leaf { entries: Vec<LeafEntry<T, D>> },
    /// Internal node containing child references
    Internal {
        children: Vec<ChildRef<D>>,
        level: u32, // Height from leaf level (leaves are 0)
    },
}

impl<T, const D: usize> Node<T, D> {
    pub fn empty_leaf() -> Self {
        Node::Leaf {
            entries: Vec::new(),
        }
    }

    /// Get the bounding box enclosing all children/entries, `None` when empty
    pub fn compute_bbox(&self) -> Option<BoundingBox<D>> {
        match self {
            Node::Leaf { entries } => BoundingBox::cover(entries.iter().map(|e| &e.bbox)),
            Node::Internal { children, .. } => {
                BoundingBox::cover(children.iter().map(|c| &c.bbox))
            }
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { level, .. } => *level,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Shape statistics gathered by a full traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RTreeStats {
    pub total_entries: u64,
    pub leaf_nodes: u64,
    pub internal_nodes: u64,
    /// Number of levels; a lone leaf root has height 1
    pub tree_height: u32,
    /// Mean entries per node divided by max fill (0-1)
    pub fill_factor: f64,
}

/// Result of a structural integrity check
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// Total nodes checked
    pub nodes_checked: u64,
    /// Non-root nodes below min fill
    pub underfull_nodes: u64,
    /// Nodes above max fill
    pub overfull_nodes: u64,
    /// Internal entries whose box differs from the child's cover
    pub stale_bounds: u64,
    /// Children whose level is not exactly one below the parent's
    pub level_mismatches: u64,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            underfull_nodes: 0,
            overfull_nodes: 0,
            stale_bounds: 0,
            level_mismatches: 0,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_compute_bbox() {
        let node: Node<u32, 2> = Node::Leaf {
            entries: vec![
                LeafEntry {
                    bbox: BoundingBox::new([0.0, 0.0], [1.0, 1.0]),
                    data: 1,
                },
                LeafEntry {
                    bbox: BoundingBox::new([4.0, -1.0], [5.0, 0.5]),
                    data: 2,
                },
            ],
        };
        assert_eq!(
            node.compute_bbox(),
            Some(BoundingBox::new([0.0, -1.0], [5.0, 1.0]))
        );
        assert_eq!(node.level(), 0);
        assert_eq!(node.len(), 2);
        assert!(Node::<u32, 2>::empty_leaf().compute_bbox().is_none());
    }

    #[test]
    fn test_internal_node_level() {
        let node: Node<u32, 2> = Node::Internal {
            children: vec![ChildRef {
                bbox: BoundingBox::new([0.0, 0.0], [1.0, 1.0]),
                node: NodeId(3),
            }],
            level: 2,
        };
        assert_eq!(node.level(), 2);
        assert!(!node.is_leaf());
        assert!(!node.is_empty());
    }

    #[test]
    fn test_decode_error_mapping() {
        let err: SpatialError = bincode::error::DecodeError::UnexpectedEnd { additional: 4 }.into();
        assert!(matches!(err, SpatialError::Corrupted(_)));

        let err: SpatialError = bincode::error::DecodeError::LimitExceeded.into();
        assert!(matches!(err, SpatialError::Corrupted(_)));
    }

    #[test]
    fn test_integrity_report_fail() {
        let mut report = IntegrityReport::new();
        assert!(report.is_valid);
        report.fail("node 1 is overfull".into());
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
    }
}
