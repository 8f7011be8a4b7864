//! Shared, lock-protected handle to an [`RTree`].

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bounding_box::BoundingBox;
use crate::rtree::{RTree, RTreeStats, SpatialResult};
use crate::spatial_index::SpatialIndex;
use crate::visitor::{Accept, Visitor};

/// Cloneable handle sharing one tree between threads.
///
/// Mutations take the write lock, queries the read lock. Clones refer to
/// the same tree.
pub struct SharedRTree<T, const D: usize> {
    inner: Arc<RwLock<RTree<T, D>>>,
}

impl<T, const D: usize> Clone for SharedRTree<T, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, const D: usize> Default for SharedRTree<T, D> {
    fn default() -> Self {
        Self::new(RTree::new())
    }
}

impl<T, const D: usize> From<RTree<T, D>> for SharedRTree<T, D> {
    fn from(tree: RTree<T, D>) -> Self {
        Self::new(tree)
    }
}

impl<T, const D: usize> SharedRTree<T, D> {
    pub fn new(tree: RTree<T, D>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Shared access for several calls under one lock
    pub fn read(&self) -> RwLockReadGuard<'_, RTree<T, D>> {
        self.inner.read()
    }

    /// Exclusive access for several calls under one lock
    pub fn write(&self) -> RwLockWriteGuard<'_, RTree<T, D>> {
        self.inner.write()
    }

    pub fn insert(&self, bbox: BoundingBox<D>, data: T) -> SpatialResult<()> {
        self.inner.write().insert(bbox, data)
    }

    pub fn remove(&self, bbox: &BoundingBox<D>, key: &T) -> SpatialResult<bool>
    where
        T: PartialEq,
    {
        self.inner.write().remove(bbox, key)
    }

    pub fn query<A, V>(&self, accept: &A, visitor: V) -> V
    where
        A: Accept<D>,
        V: Visitor<T, D>,
    {
        self.inner.read().query(accept, visitor)
    }

    pub fn search<F>(&self, bbox: &BoundingBox<D>, callback: F) -> SpatialResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().search(bbox, callback)
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    pub fn stats(&self) -> RTreeStats {
        self.inner.read().stats()
    }

    pub fn remove_all(&self) {
        self.inner.write().remove_all()
    }

    pub fn save<W: Write>(&self, writer: &mut W) -> SpatialResult<()>
    where
        T: Serialize,
    {
        self.inner.read().save(writer)
    }

    pub fn load<R: Read>(&self, reader: &mut R) -> SpatialResult<()>
    where
        T: DeserializeOwned,
    {
        self.inner.write().load(reader)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SpatialResult<()>
    where
        T: Serialize,
    {
        self.inner.read().save_to_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> SpatialResult<()>
    where
        T: DeserializeOwned,
    {
        self.inner.write().load_from_file(path)
    }
}

impl<T, const D: usize> SpatialIndex<T, D> for SharedRTree<T, D>
where
    T: Clone + PartialEq + Send + Sync,
{
    fn add(&self, key: &BoundingBox<D>, value: T) -> SpatialResult<()> {
        self.insert(*key, value)
    }

    fn remove(&self, key: &BoundingBox<D>, value: &T) -> SpatialResult<bool> {
        SharedRTree::remove(self, key, value)
    }

    fn find_intersecting(&self, key: &BoundingBox<D>) -> SpatialResult<Vec<T>> {
        self.inner.read().find_intersecting(key)
    }

    fn find_contained(&self, key: &BoundingBox<D>) -> SpatialResult<Vec<T>> {
        self.inner.read().find_contained(key)
    }

    fn size(&self) -> usize {
        self.count()
    }

    fn clear(&self) {
        self.remove_all()
    }
}
