//! SpatialIndex trait definition for keyed spatial indexing.

use crate::bounding_box::BoundingBox;
use crate::rtree::SpatialResult;

/// Thread-safe keyed spatial index.
///
/// Every method takes `&self`; implementations handle their own locking so a
/// single index can be shared between threads.
pub trait SpatialIndex<T, const D: usize>: Send + Sync {
    /// Adds a value under `key`.
    fn add(&self, key: &BoundingBox<D>, value: T) -> SpatialResult<()>;

    /// Removes every entry overlapping `key` whose value equals `value`.
    fn remove(&self, key: &BoundingBox<D>, value: &T) -> SpatialResult<bool>;

    /// Finds the values of entries overlapping `key`.
    fn find_intersecting(&self, key: &BoundingBox<D>) -> SpatialResult<Vec<T>>;

    /// Finds the values of entries lying inside `key`.
    fn find_contained(&self, key: &BoundingBox<D>) -> SpatialResult<Vec<T>>;

    /// Gets the number of entries.
    fn size(&self) -> usize;

    /// Clears all entries.
    fn clear(&self);
}
