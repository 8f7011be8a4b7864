use rand::Rng;
use rangetree::{
    BoundingBox, RTree, RTreeConfig, SharedRTree, SpatialError, SpatialResult,
};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

/// Runs a test between a setup and a teardown step.
/// The teardown runs even when the test body fails or panics.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()>,
    B: Fn() -> SpatialResult<TestContext>,
    A: Fn(TestContext) -> SpatialResult<()>,
{
    let start_time = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_ctx = ctx.clone();
    let result = panic::catch_unwind(AssertUnwindSafe(|| test(test_ctx)));
    let after_result = after(ctx);
    log::debug!("test finished in {:?}", start_time.elapsed());

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => panic::resume_unwind(panic_err),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: PathBuf,
    tree: SharedRTree<u64, 2>,
}

impl TestContext {
    pub fn new(path: PathBuf, tree: SharedRTree<u64, 2>) -> Self {
        Self { path, tree }
    }

    /// Scratch directory owned by this test
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> SharedRTree<u64, 2> {
        self.tree.clone()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

pub fn random_path() -> PathBuf {
    let id: u64 = rand::random();
    env::temp_dir().join(format!("rangetree-{:016x}", id))
}

/// Context with the default configuration (max fill 8, min fill 4)
pub fn create_test_context() -> SpatialResult<TestContext> {
    create_test_context_with(RTreeConfig::default())
}

/// Context whose tree splits after four entries
pub fn create_small_test_context() -> SpatialResult<TestContext> {
    create_test_context_with(RTreeConfig::builder().max_fill(4).min_fill(2).build()?)
}

pub fn create_test_context_with(config: RTreeConfig) -> SpatialResult<TestContext> {
    let path = random_path();
    fs::create_dir_all(&path)?;
    Ok(TestContext::new(path, SharedRTree::new(RTree::with_config(config))))
}

pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    ctx.tree().remove_all();
    match fs::remove_dir_all(ctx.path()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SpatialError::Io(e)),
    }
}

/// Unit square at grid cell `i` of a ten-column grid with one unit of spacing
pub fn grid_box(i: u64) -> BoundingBox<2> {
    let x = (i % 10) as f64 * 2.0;
    let y = (i / 10) as f64 * 2.0;
    BoundingBox::new([x, y], [x + 1.0, y + 1.0])
}

/// Box with its lower corner in `[0, extent)` and sides in `[0, max_side)`
pub fn random_box<R: Rng + ?Sized, const D: usize>(
    rng: &mut R,
    extent: f64,
    max_side: f64,
) -> BoundingBox<D> {
    let mut min = [0.0; D];
    let mut max = [0.0; D];
    for (lo, hi) in min.iter_mut().zip(max.iter_mut()) {
        *lo = rng.random_range(0.0..extent);
        *hi = *lo + rng.random_range(0.0..max_side);
    }
    BoundingBox::new(min, max)
}

/// A box covering everything the generators produce
pub fn everything<const D: usize>() -> BoundingBox<D> {
    BoundingBox::new([-1e12; D], [1e12; D])
}

pub fn brute_force_overlapping<const D: usize>(
    entries: &[(BoundingBox<D>, u64)],
    query: &BoundingBox<D>,
) -> Vec<u64> {
    let mut ids: Vec<u64> = entries
        .iter()
        .filter(|(bbox, _)| query.overlaps(bbox))
        .map(|(_, id)| *id)
        .collect();
    ids.sort_unstable();
    ids
}

pub fn brute_force_enclosed<const D: usize>(
    entries: &[(BoundingBox<D>, u64)],
    query: &BoundingBox<D>,
) -> Vec<u64> {
    let mut ids: Vec<u64> = entries
        .iter()
        .filter(|(bbox, _)| query.encloses(bbox))
        .map(|(_, id)| *id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Sorted payloads of every entry overlapping `query`
pub fn overlapping_ids<const D: usize>(tree: &RTree<u64, D>, query: &BoundingBox<D>) -> Vec<u64> {
    let mut ids = tree.find_intersecting(query).unwrap_or_default();
    ids.sort_unstable();
    ids
}

/// Sorted `(box, payload)` pairs of every leaf, for comparing whole trees
pub fn leaf_multiset<const D: usize>(tree: &RTree<u64, D>) -> Vec<(String, u64)> {
    let mut all: Vec<(String, u64)> = tree
        .iter()
        .map(|entry| (entry.bbox.to_string(), entry.data))
        .collect();
    all.sort();
    all
}

pub fn assert_invariants<const D: usize>(tree: &RTree<u64, D>) {
    let report = tree.check_integrity();
    assert!(
        report.is_valid,
        "tree invariants violated after checking {} nodes: {:?}",
        report.nodes_checked, report.errors
    );
}
