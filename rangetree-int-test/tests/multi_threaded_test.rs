use rangetree::{AcceptOverlapping, BoundingBox, CollectVisitor, SharedRTree, SpatialIndex};
use rangetree_int_test::test_util::{
    assert_invariants, cleanup, create_test_context, everything, grid_box, run_test,
};
use std::sync::Arc;
use std::thread;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_concurrent_inserts_and_queries() {
    run_test(
        || create_test_context(),
        |ctx| {
            let tree = ctx.tree();
            let writers: Vec<_> = (0..4u64)
                .map(|t| {
                    let tree = tree.clone();
                    thread::spawn(move || {
                        for i in 0..250 {
                            let id = t * 1000 + i;
                            tree.insert(grid_box(id), id).unwrap();
                        }
                    })
                })
                .collect();

            let readers: Vec<_> = (0..2)
                .map(|_| {
                    let tree = tree.clone();
                    thread::spawn(move || {
                        let mut last = 0;
                        for _ in 0..50 {
                            let seen = tree.search(&everything(), |_| true).unwrap();
                            assert!(seen >= last);
                            last = seen;
                        }
                    })
                })
                .collect();

            for handle in writers.into_iter().chain(readers) {
                handle.join().unwrap();
            }

            assert_eq!(tree.count(), 1000);
            assert_invariants(&*tree.read());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_concurrent_removals() {
    run_test(
        || create_test_context(),
        |ctx| {
            let tree = ctx.tree();
            for id in 0..800 {
                tree.insert(grid_box(id), id)?;
            }

            let handles: Vec<_> = (0..4u64)
                .map(|t| {
                    let tree = tree.clone();
                    thread::spawn(move || {
                        for id in (t..800).step_by(8) {
                            assert!(tree.remove(&grid_box(id), &id).unwrap());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(tree.count(), 400);
            let remaining = tree
                .query(&AcceptOverlapping::new(everything()), CollectVisitor::new())
                .into_items();
            assert!(remaining.iter().all(|id| id % 8 >= 4));
            assert_invariants(&*tree.read());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_behind_trait_object() {
    let index: Arc<dyn SpatialIndex<u64, 2>> = Arc::new(SharedRTree::default());
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..25 {
                    let id = t * 100 + i;
                    index.add(&grid_box(id), id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.size(), 100);
    let corner = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
    assert_eq!(index.find_contained(&corner).unwrap(), vec![0]);
    index.clear();
    assert_eq!(index.size(), 0);
}
