use rand::rngs::StdRng;
use rand::SeedableRng;
use rangetree::{BoundingBox, RTree, SpatialResult};
use rangetree_int_test::test_util::{random_box, random_path};
use std::fs;

fn main() -> SpatialResult<()> {
    colog::init();
    println!("Starting stress test...");

    let count = 1_000_000u64;
    let mut rng = StdRng::seed_from_u64(42);
    let boxes: Vec<BoundingBox<2>> = (0..count)
        .map(|_| random_box(&mut rng, 10_000.0, 10.0))
        .collect();
    let mut tree: RTree<u64, 2> = RTree::new();

    let start = std::time::Instant::now();
    for (id, bbox) in boxes.iter().enumerate() {
        tree.insert(*bbox, id as u64)?;
    }
    let elapsed = start.elapsed();
    println!("Inserted {} boxes in {:?}, height {}", count, elapsed, tree.height());

    let start = std::time::Instant::now();
    let window = BoundingBox::new([2_500.0, 2_500.0], [7_500.0, 7_500.0]);
    let hits = tree.search(&window, |_| true)?;
    println!("Found {} boxes in {:?}", hits, start.elapsed());

    let dir = random_path();
    fs::create_dir_all(&dir)?;
    let path = dir.join("stress.rtree");
    let start = std::time::Instant::now();
    tree.save_to_file(&path)?;
    let mut restored: RTree<u64, 2> = RTree::new();
    restored.load_from_file(&path)?;
    println!(
        "Saved and reloaded {} boxes in {:?}",
        restored.count(),
        start.elapsed()
    );
    fs::remove_dir_all(&dir)?;

    let start = std::time::Instant::now();
    for (id, bbox) in boxes.iter().enumerate().step_by(2) {
        tree.remove(bbox, &(id as u64))?;
    }
    println!(
        "Removed half of the boxes in {:?}, {} remaining",
        start.elapsed(),
        tree.count()
    );

    let stats = tree.stats();
    println!(
        "Leaves: {}, internal nodes: {}, fill factor: {:.2}",
        stats.leaf_nodes, stats.internal_nodes, stats.fill_factor
    );
    Ok(())
}
