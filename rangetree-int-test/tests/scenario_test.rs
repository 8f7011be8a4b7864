//! End-to-end scenarios: basic overlap query, bulk insert/delete, corrupted
//! header on load and reinsertion after condensation.

use rangetree::{BoundingBox, RTree, RTreeConfig, SpatialError};
use rangetree_int_test::test_util::{
    assert_invariants, cleanup, create_small_test_context, create_test_context, everything,
    grid_box, leaf_multiset, overlapping_ids, run_test,
};
use std::io::Cursor;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_overlap_query_returns_only_intersecting_payload() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            let tree = ctx.tree();
            tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]), 1)?;
            tree.insert(BoundingBox::new([5.0, 5.0], [6.0, 6.0]), 2)?;

            let query = BoundingBox::new([0.0, 0.0], [2.0, 2.0]);
            assert_eq!(overlapping_ids(&*tree.read(), &query), vec![1]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_hundred_inserts_then_fifty_removals() {
    run_test(
        || create_test_context(),
        |ctx| {
            let tree = ctx.tree();
            for i in 0..100 {
                tree.insert(grid_box(i), i)?;
            }
            assert!(tree.read().height() > 1);
            assert_invariants(&*tree.read());

            // arbitrary but fixed removal order
            let doomed: Vec<u64> = (0..100).map(|i| (i * 37) % 100).filter(|i| i % 2 == 1).collect();
            assert_eq!(doomed.len(), 50);
            for id in &doomed {
                assert!(tree.remove(&grid_box(*id), id)?);
                assert_invariants(&*tree.read());
            }

            let expected: Vec<u64> = (0..100).filter(|i| i % 2 == 0).collect();
            assert_eq!(overlapping_ids(&*tree.read(), &everything()), expected);
            assert_eq!(tree.count(), 50);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_corrupted_header_keeps_fresh_tree_empty() {
    run_test(
        || create_test_context(),
        |ctx| {
            let tree = ctx.tree();
            for i in 0..30 {
                tree.insert(grid_box(i), i)?;
            }
            let mut buffer = Vec::new();
            tree.save(&mut buffer)?;

            // each header field is one little-endian u32; flip max fill
            let max_fill_offset = 5 * 4;
            buffer[max_fill_offset] ^= 0xff;

            let mut fresh: RTree<u64, 2> = RTree::new();
            let result = fresh.load(&mut Cursor::new(buffer.clone()));
            assert!(matches!(result, Err(SpatialError::IncompatibleHeader(_))));
            assert!(fresh.is_empty());

            // a wrong magic number is rejected the same way
            buffer[max_fill_offset] ^= 0xff;
            buffer[0] = b'X';
            let result = fresh.load(&mut Cursor::new(buffer));
            assert!(matches!(result, Err(SpatialError::IncompatibleHeader(_))));
            assert_eq!(fresh.count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_underflow_reinserts_sibling_entries() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            let tree = ctx.tree();
            // two well separated clusters of three force a split into two leaves
            let left: Vec<(BoundingBox<2>, u64)> = (0..3)
                .map(|i| {
                    let x = i as f64;
                    (BoundingBox::new([x, 0.0], [x + 0.5, 0.5]), i)
                })
                .collect();
            let right: Vec<(BoundingBox<2>, u64)> = (0..3)
                .map(|i| {
                    let x = 100.0 + i as f64;
                    (BoundingBox::new([x, 0.0], [x + 0.5, 0.5]), 10 + i)
                })
                .collect();
            for (bbox, id) in left.iter().chain(right.iter()) {
                tree.insert(*bbox, *id)?;
            }
            assert_eq!(tree.read().height(), 2);
            let before = leaf_multiset(&*tree.read());

            // leaving one entry in the left leaf drops it below min fill 2
            assert!(tree.remove(&left[0].0, &left[0].1)?);
            assert!(tree.remove(&left[1].0, &left[1].1)?);

            let guard = tree.read();
            assert_invariants(&*guard);
            assert_eq!(guard.count(), 4);
            assert_eq!(overlapping_ids(&*guard, &left[2].0), vec![2]);
            assert_eq!(overlapping_ids(&*guard, &everything()), vec![2, 10, 11, 12]);

            let after = leaf_multiset(&*guard);
            let mut expected = before;
            expected.retain(|(_, id)| *id != 0 && *id != 1);
            assert_eq!(after, expected);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_condensation_over_deep_tree_loses_nothing() {
    let config = RTreeConfig::builder().max_fill(4).min_fill(2).build().unwrap();
    let mut tree: RTree<u64, 2> = RTree::with_config(config);
    for i in 0..200 {
        tree.insert(grid_box(i), i).unwrap();
    }
    assert!(tree.height() >= 4);

    // carve a band out of the middle of the grid
    let band = BoundingBox::new([-1.0, 10.0], [100.0, 21.0]);
    let removed = tree.remove_area(&band).unwrap();
    assert_eq!(removed, 60);
    assert_invariants(&tree);

    let expected: Vec<u64> = (0..200).filter(|i| !(50..110).contains(i)).collect();
    assert_eq!(overlapping_ids(&tree, &everything()), expected);
}
