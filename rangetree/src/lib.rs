//! # Rangetree - Multidimensional R-Tree
//!
//! This crate provides an in-memory R-Tree indexing caller records by
//! axis-aligned bounding boxes in any fixed number of dimensions.
//!
//! ## Features
//!
//! - **Quadratic Split**: Overflowing nodes split by the classical quadratic
//!   seed-and-distribute algorithm
//! - **Condensing Deletion**: Under-full nodes are dissolved and their entries
//!   reinserted, keeping every node within its fill bounds
//! - **Visitor Queries**: Pluggable acceptance predicates and visitors with
//!   early termination
//! - **Persistence**: Compact binary save/load with header validation
//! - **Thread Safe Handle**: [`SharedRTree`] wraps a tree in a read/write lock
//!
//! ## Quick Start
//!
//! ```rust
//! use rangetree::{BoundingBox, RTree, RTreeConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RTreeConfig::builder().max_fill(4).build()?;
//! let mut tree: RTree<u32, 2> = RTree::with_config(config);
//!
//! tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]), 1)?;
//! tree.insert(BoundingBox::new([5.0, 5.0], [6.0, 6.0]), 2)?;
//!
//! let mut hits = Vec::new();
//! let found = tree.search(&BoundingBox::new([0.0, 0.0], [2.0, 2.0]), |id| {
//!     hits.push(*id);
//!     true
//! })?;
//! assert_eq!(found, 1);
//! assert_eq!(hits, vec![1]);
//!
//! assert!(tree.remove(&BoundingBox::new([0.0, 0.0], [1.0, 1.0]), &1)?);
//! assert_eq!(tree.count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Persistence
//!
//! ```rust
//! use rangetree::{BoundingBox, RTree};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree: RTree<String, 3> = RTree::new();
//! tree.insert(BoundingBox::point([1.0, 2.0, 3.0]), "probe".to_string())?;
//!
//! let mut buffer = Vec::new();
//! tree.save(&mut buffer)?;
//!
//! let mut restored: RTree<String, 3> = RTree::new();
//! restored.load(&mut Cursor::new(buffer))?;
//! assert_eq!(restored.count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bounding_box;
pub mod rtree;
pub mod shared;
pub mod spatial_index;
pub mod visitor;

// Re-export R-Tree types
pub use bounding_box::{unit_sphere_volume, BoundingBox, VolumeMetric};
pub use rtree::{
    FileHeader, IntegrityReport, Iter, LeafEntry, RTree, RTreeConfig, RTreeConfigBuilder,
    RTreeStats, SpatialError, SpatialResult,
};

// Re-export traversal types
pub use visitor::{
    Accept, AcceptAny, AcceptEnclosing, AcceptOverlapping, CollectVisitor, CountVisitor,
    LeafRemover, RemoveAnyLeaf, RemovePolicy, RemoveSpecificLeaf, Visitor, VisitorMut,
};

pub use shared::SharedRTree;
pub use spatial_index::SpatialIndex;
