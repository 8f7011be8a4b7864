//! Randomized checks of the tree against a brute-force list.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangetree::{
    AcceptAny, AcceptOverlapping, BoundingBox, CountVisitor, LeafEntry, RTree, RTreeConfig,
    RemovePolicy, VolumeMetric,
};
use rangetree_int_test::test_util::{
    assert_invariants, brute_force_enclosed, brute_force_overlapping, everything, random_box,
};
use std::ops::ControlFlow;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn sorted(mut ids: Vec<u64>) -> Vec<u64> {
    ids.sort_unstable();
    ids
}

fn check_queries<const D: usize>(
    tree: &RTree<u64, D>,
    live: &[(BoundingBox<D>, u64)],
    rng: &mut StdRng,
) {
    for _ in 0..25 {
        let query: BoundingBox<D> = random_box(rng, 100.0, 40.0);
        assert_eq!(
            sorted(tree.find_intersecting(&query).unwrap()),
            brute_force_overlapping(live, &query)
        );
        assert_eq!(
            sorted(tree.find_contained(&query).unwrap()),
            brute_force_enclosed(live, &query)
        );
    }
}

fn random_workload<const D: usize>(config: RTreeConfig, seed: u64, operations: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree: RTree<u64, D> = RTree::with_config(config);
    let mut live: Vec<(BoundingBox<D>, u64)> = Vec::new();

    for id in 0..operations {
        if live.is_empty() || rng.random_bool(0.65) {
            let bbox = random_box(&mut rng, 100.0, 8.0);
            tree.insert(bbox, id).unwrap();
            live.push((bbox, id));
        } else {
            let victim = rng.random_range(0..live.len());
            let (bbox, key) = live.swap_remove(victim);
            assert!(tree.remove(&bbox, &key).unwrap());
        }

        if id % 97 == 0 {
            assert_invariants(&tree);
            check_queries(&tree, &live, &mut rng);
        }
    }

    assert_invariants(&tree);
    assert_eq!(tree.count(), live.len());
    check_queries(&tree, &live, &mut rng);
}

#[test]
fn test_random_workload_2d_default_config() {
    random_workload::<2>(RTreeConfig::default(), 1, 2000);
}

#[test]
fn test_random_workload_3d_small_nodes() {
    let config = RTreeConfig::builder().max_fill(4).min_fill(2).build().unwrap();
    random_workload::<3>(config, 2, 1500);
}

#[test]
fn test_random_workload_rectangular_metric() {
    let config = RTreeConfig::builder()
        .max_fill(6)
        .min_fill(3)
        .volume_metric(VolumeMetric::Rectangular)
        .build()
        .unwrap();
    random_workload::<2>(config, 3, 1500);
}

#[test]
fn test_random_workload_one_dimension() {
    let config = RTreeConfig::builder().max_fill(5).min_fill(1).build().unwrap();
    random_workload::<1>(config, 4, 1000);
}

#[test]
fn test_removing_absent_entry_changes_nothing() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut tree: RTree<u64, 2> = RTree::new();
    for id in 0..300 {
        tree.insert(random_box(&mut rng, 100.0, 5.0), id).unwrap();
    }
    let probe = BoundingBox::new([10.0, 10.0], [60.0, 60.0]);
    let before = sorted(tree.find_intersecting(&probe).unwrap());

    // unknown key, and a known key under a box that does not reach it
    assert!(!tree.remove(&probe, &10_000).unwrap());
    assert!(!tree
        .remove(&BoundingBox::new([500.0, 500.0], [501.0, 501.0]), &7)
        .unwrap());
    assert_eq!(tree.remove_area(&BoundingBox::point([-50.0, -50.0])).unwrap(), 0);

    assert_eq!(tree.count(), 300);
    assert_eq!(sorted(tree.find_intersecting(&probe).unwrap()), before);
    assert_invariants(&tree);
}

#[test]
fn test_breaking_visitor_sees_exactly_one_leaf() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut tree: RTree<u64, 2> = RTree::new();
    for id in 0..500 {
        tree.insert(random_box(&mut rng, 100.0, 5.0), id).unwrap();
    }

    let mut visits = 0;
    tree.query(&AcceptAny, |_: &LeafEntry<u64, 2>| {
        visits += 1;
        ControlFlow::Break(())
    });
    assert_eq!(visits, 1);

    let probe = AcceptOverlapping::new(BoundingBox::new([0.0, 0.0], [50.0, 50.0]));
    let counted = tree.query(&probe, CountVisitor::with_cap(1)).count;
    assert_eq!(counted, 1);

    let stopped = tree.search(&everything(), |_| false).unwrap();
    assert_eq!(stopped, 1);
}

#[test]
fn test_duplicate_entries_follow_policy() {
    let mut tree: RTree<u64, 2> = RTree::new();
    let spot = BoundingBox::new([3.0, 3.0], [4.0, 4.0]);
    for _ in 0..20 {
        tree.insert(spot, 42).unwrap();
    }
    tree.insert(spot, 43).unwrap();

    for remaining in (15..20).rev() {
        assert!(tree.remove_with(&spot, &42, RemovePolicy::First).unwrap());
        assert_eq!(tree.count(), remaining + 1);
    }
    assert!(tree.remove(&spot, &42).unwrap());
    assert_eq!(tree.find_intersecting(&spot).unwrap(), vec![43]);
    assert_invariants(&tree);
}

#[test]
fn test_degenerate_boxes() {
    let mut tree: RTree<u64, 2> = RTree::new();
    for id in 0..50 {
        let x = id as f64;
        tree.insert(BoundingBox::point([x, x]), id).unwrap();
    }
    // a zero-volume query still touches the points on its edge
    let line = BoundingBox::new([10.0, 0.0], [10.0, 100.0]);
    assert_eq!(sorted(tree.find_intersecting(&line).unwrap()), vec![10]);
    assert_invariants(&tree);
}
