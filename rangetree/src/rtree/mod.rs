//! In-memory R-Tree with quadratic split and condensing deletion.
//!
//! Nodes live in an arena addressed by [`NodeId`]; internal nodes hold child
//! references with the child's covering box, leaves hold caller records with
//! their exact box. The tree can be written to and restored from any
//! `Read`/`Write` stream.

mod iter;
pub mod persistence;
mod rtree_arena;
mod rtree_config;
pub mod rtree_constants;
mod rtree_impl;
pub mod rtree_types;
mod split;

pub use iter::Iter;
pub use persistence::FileHeader;
pub use rtree_config::{RTreeConfig, RTreeConfigBuilder};
pub use rtree_constants::{DEFAULT_MAX_FILL, DEFAULT_MAX_HEIGHT, DEFAULT_MIN_FILL};
pub use rtree_impl::RTree;
pub use rtree_types::{
    Bounded, ChildRef, IntegrityReport, LeafEntry, Node, NodeId, RTreeStats, SpatialError,
    SpatialResult,
};
