//! Quadratic node split.
//!
//! An overflowing node hands its `max_fill + 1` entries to
//! [`split_entries`], which seeds two groups with the most wasteful pair and
//! then distributes the rest greedily, forcing the tail into one group when
//! the other would otherwise end up below the minimum fill.

use crate::bounding_box::{BoundingBox, VolumeMetric};

use super::rtree_types::Bounded;

/// Bookkeeping for one split in progress
struct Partition<const D: usize> {
    assignment: Vec<Option<usize>>,
    cover: [BoundingBox<D>; 2],
    volume: [f64; 2],
    count: [usize; 2],
    metric: VolumeMetric,
}

impl<const D: usize> Partition<D> {
    fn seeded(seed_a: &BoundingBox<D>, seed_b: &BoundingBox<D>, total: usize, metric: VolumeMetric) -> Self {
        Self {
            assignment: vec![None; total],
            cover: [*seed_a, *seed_b],
            volume: [seed_a.measure(metric), seed_b.measure(metric)],
            count: [0, 0],
            metric,
        }
    }

    fn assign(&mut self, index: usize, group: usize, bbox: &BoundingBox<D>) {
        debug_assert!(self.assignment[index].is_none(), "entry {} placed twice", index);
        self.assignment[index] = Some(group);
        if self.count[group] > 0 {
            self.cover[group].expand(bbox);
        } else {
            self.cover[group] = *bbox;
        }
        self.volume[group] = self.cover[group].measure(self.metric);
        self.count[group] += 1;
    }

    fn assigned(&self) -> usize {
        self.count[0] + self.count[1]
    }

    /// Group an entry should join given the growth each group would see
    fn preferred_group(&self, growth: [f64; 2], grown: [f64; 2]) -> usize {
        if growth[0] != growth[1] {
            return if growth[0] < growth[1] { 0 } else { 1 };
        }
        if grown[0] != grown[1] {
            return if grown[0] < grown[1] { 0 } else { 1 };
        }
        if self.count[1] < self.count[0] {
            1
        } else {
            0
        }
    }

    /// Unassigned entry with the strongest preference for one group
    fn pick_next<E: Bounded<D>>(&self, entries: &[E]) -> (usize, usize) {
        let mut best: Option<(usize, usize, f64)> = None;

        for (index, entry) in entries.iter().enumerate() {
            if self.assignment[index].is_some() {
                continue;
            }
            let bbox = entry.bbox();
            let grown = [
                self.cover[0].combine(bbox).measure(self.metric),
                self.cover[1].combine(bbox).measure(self.metric),
            ];
            let growth = [grown[0] - self.volume[0], grown[1] - self.volume[1]];
            let group = self.preferred_group(growth, grown);
            let diff = (growth[0] - growth[1]).abs();

            let better = match best {
                None => true,
                Some((_, best_group, best_diff)) => {
                    diff > best_diff
                        || (diff == best_diff && self.count[group] < self.count[best_group])
                }
            };
            if better {
                best = Some((index, group, diff));
            }
        }

        let (index, group, _) = best.unwrap_or_else(|| panic!("no unassigned entry left to place"));
        (index, group)
    }
}

/// Pair of entries that wastes the most volume when put together
fn pick_seeds<E: Bounded<D>, const D: usize>(entries: &[E], metric: VolumeMetric) -> (usize, usize) {
    let volumes: Vec<f64> = entries.iter().map(|e| e.bbox().measure(metric)).collect();
    let mut worst = f64::NEG_INFINITY;
    let mut seeds = (0, 1);

    for a in 0..entries.len() - 1 {
        for b in a + 1..entries.len() {
            let waste = entries[a].bbox().combine(entries[b].bbox()).measure(metric)
                - volumes[a]
                - volumes[b];
            if waste > worst {
                worst = waste;
                seeds = (a, b);
            }
        }
    }
    seeds
}

/// Partition `entries` into two groups of at least `min_fill` entries each.
///
/// Entries keep their relative order inside each group.
pub(crate) fn split_entries<E, const D: usize>(
    entries: Vec<E>,
    min_fill: usize,
    metric: VolumeMetric,
) -> (Vec<E>, Vec<E>)
where
    E: Bounded<D>,
{
    let total = entries.len();
    assert!(
        total >= 2 && min_fill >= 1 && 2 * min_fill <= total,
        "cannot split {} entries with min fill {}",
        total,
        min_fill
    );

    let (seed_a, seed_b) = pick_seeds(&entries, metric);
    let mut partition = Partition::seeded(entries[seed_a].bbox(), entries[seed_b].bbox(), total, metric);
    partition.assign(seed_a, 0, entries[seed_a].bbox());
    partition.assign(seed_b, 1, entries[seed_b].bbox());

    let limit = total - min_fill;
    while partition.assigned() < total && partition.count[0] < limit && partition.count[1] < limit {
        let (index, group) = partition.pick_next(&entries);
        partition.assign(index, group, entries[index].bbox());
    }

    // one group is full enough; the other takes the rest so it reaches min fill
    if partition.assigned() < total {
        let group = if partition.count[0] >= limit { 1 } else { 0 };
        for (index, entry) in entries.iter().enumerate() {
            if partition.assignment[index].is_none() {
                partition.assign(index, group, entry.bbox());
            }
        }
    }

    let mut first = Vec::with_capacity(partition.count[0]);
    let mut second = Vec::with_capacity(partition.count[1]);
    for (entry, group) in entries.into_iter().zip(partition.assignment) {
        match group {
            Some(0) => first.push(entry),
            Some(_) => second.push(entry),
            None => unreachable!("every entry is assigned before distribution"),
        }
    }

    log::trace!("split {} entries into {} + {}", total, first.len(), second.len());
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtree::rtree_types::LeafEntry;

    fn entry(x0: f64, y0: f64, x1: f64, y1: f64, data: u32) -> LeafEntry<u32, 2> {
        LeafEntry {
            bbox: BoundingBox::new([x0, y0], [x1, y1]),
            data,
        }
    }

    fn ids(group: &[LeafEntry<u32, 2>]) -> Vec<u32> {
        let mut ids: Vec<u32> = group.iter().map(|e| e.data).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_split_separates_clusters() {
        let entries = vec![
            entry(0.0, 0.0, 1.0, 1.0, 1),
            entry(100.0, 100.0, 101.0, 101.0, 2),
            entry(0.5, 0.5, 1.5, 1.5, 3),
            entry(100.5, 100.5, 101.5, 101.5, 4),
            entry(1.0, 0.0, 2.0, 1.0, 5),
        ];

        for metric in [VolumeMetric::Rectangular, VolumeMetric::Spherical] {
            let (a, b) = split_entries(entries.clone(), 2, metric);
            let (low, high) = if ids(&a).contains(&1) { (a, b) } else { (b, a) };
            assert_eq!(ids(&low), vec![1, 3, 5]);
            assert_eq!(ids(&high), vec![2, 4]);
        }
    }

    #[test]
    fn test_split_respects_min_fill() {
        // one far outlier would attract nothing; min fill must force entries over
        let mut entries: Vec<_> = (0..8)
            .map(|i| entry(i as f64 * 0.1, 0.0, i as f64 * 0.1 + 0.1, 0.1, i))
            .collect();
        entries.push(entry(1000.0, 1000.0, 1001.0, 1001.0, 99));

        let (a, b) = split_entries(entries, 4, VolumeMetric::Rectangular);
        assert!(a.len() >= 4 && b.len() >= 4, "got {} + {}", a.len(), b.len());
        assert_eq!(a.len() + b.len(), 9);
    }

    #[test]
    fn test_split_identical_boxes() {
        let entries: Vec<_> = (0..5).map(|i| entry(1.0, 1.0, 2.0, 2.0, i)).collect();
        let (a, b) = split_entries(entries, 2, VolumeMetric::Spherical);
        assert!(a.len() >= 2 && b.len() >= 2);

        let mut all = ids(&a);
        all.extend(ids(&b));
        all.sort();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_split_preserves_relative_order() {
        let entries = vec![
            entry(0.0, 0.0, 1.0, 1.0, 1),
            entry(50.0, 50.0, 51.0, 51.0, 2),
            entry(0.2, 0.2, 1.2, 1.2, 3),
            entry(50.2, 50.2, 51.2, 51.2, 4),
            entry(0.4, 0.4, 1.4, 1.4, 5),
        ];
        let (a, b) = split_entries(entries, 2, VolumeMetric::Rectangular);
        for group in [a, b] {
            let order: Vec<u32> = group.iter().map(|e| e.data).collect();
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(order, sorted);
        }
    }

    #[test]
    #[should_panic(expected = "cannot split")]
    fn test_split_too_few_entries_panics() {
        let entries = vec![entry(0.0, 0.0, 1.0, 1.0, 1), entry(2.0, 2.0, 3.0, 3.0, 2)];
        split_entries(entries, 2, VolumeMetric::Rectangular);
    }
}
