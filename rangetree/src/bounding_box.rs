use std::hash::Hash;

use crate::rtree::rtree_constants::UNIT_SPHERE_VOLUMES;
use crate::rtree::rtree_types::{SpatialError, SpatialResult};

/// An axis-aligned box in `D` dimensions, stored as one closed `[min, max]`
/// interval per dimension.
///
/// `BoundingBox` is the key type of the tree: every leaf entry carries the
/// exact box of its record and every internal entry carries the minimum box
/// covering its subtree.
///
/// # Examples
///
/// ```rust
/// use rangetree::BoundingBox;
///
/// let a = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
/// let b = BoundingBox::new([1.0, 1.0], [2.0, 3.0]);
///
/// // closed intervals: touching boxes overlap
/// assert!(a.overlaps(&b));
/// assert_eq!(a.combine(&b), BoundingBox::new([0.0, 0.0], [2.0, 3.0]));
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundingBox<const D: usize> {
    /// Lower bound per dimension
    pub min: [f64; D],
    /// Upper bound per dimension
    pub max: [f64; D],
}

impl<const D: usize> Hash for BoundingBox<D> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for value in self.min.iter().chain(self.max.iter()) {
            value.to_bits().hash(state);
        }
    }
}

impl<const D: usize> std::fmt::Display for BoundingBox<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox(")?;
        for dim in 0..D {
            if dim > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[{}, {}]", self.min[dim], self.max[dim])?;
        }
        write!(f, ")")
    }
}

impl<const D: usize> BoundingBox<D> {
    /// Creates a box from its lower and upper corners.
    ///
    /// No validation happens here; the tree calls [`BoundingBox::validate`]
    /// before it accepts a box.
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        BoundingBox { min, max }
    }

    /// Creates a degenerate box covering a single point.
    pub fn point(coords: [f64; D]) -> Self {
        BoundingBox {
            min: coords,
            max: coords,
        }
    }

    /// Checks that every interval is well formed (`min <= max`, no NaN).
    pub fn validate(&self) -> SpatialResult<()> {
        for dim in 0..D {
            let (lo, hi) = (self.min[dim], self.max[dim]);
            if lo.is_nan() || hi.is_nan() {
                return Err(SpatialError::InvalidBoundingBox(format!(
                    "NaN coordinate in dimension {} of {}",
                    dim, self
                )));
            }
            if lo > hi {
                return Err(SpatialError::InvalidBoundingBox(format!(
                    "min {} > max {} in dimension {} of {}",
                    lo, hi, dim, self
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` if the box passes [`BoundingBox::validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Width of the interval along `dim`.
    pub fn extent(&self, dim: usize) -> f64 {
        self.max[dim] - self.min[dim]
    }

    /// Midpoint of the box.
    pub fn center(&self) -> [f64; D] {
        let mut center = [0.0; D];
        for (dim, c) in center.iter_mut().enumerate() {
            *c = (self.min[dim] + self.max[dim]) / 2.0;
        }
        center
    }

    /// True iff the intervals intersect in every dimension. Touching counts.
    pub fn overlaps(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|dim| self.min[dim] <= other.max[dim] && other.min[dim] <= self.max[dim])
    }

    /// True iff `other` lies inside this box in every dimension (closed).
    pub fn encloses(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|dim| self.min[dim] <= other.min[dim] && other.max[dim] <= self.max[dim])
    }

    /// Checks if this bounding box contains a point.
    pub fn contains_point(&self, point: &[f64; D]) -> bool {
        (0..D).all(|dim| self.min[dim] <= point[dim] && point[dim] <= self.max[dim])
    }

    /// Minimum box covering both boxes.
    pub fn combine(&self, other: &BoundingBox<D>) -> BoundingBox<D> {
        let mut combined = *self;
        combined.expand(other);
        combined
    }

    /// Grows this box in place to cover `other`.
    pub fn expand(&mut self, other: &BoundingBox<D>) {
        for dim in 0..D {
            self.min[dim] = self.min[dim].min(other.min[dim]);
            self.max[dim] = self.max[dim].max(other.max[dim]);
        }
    }

    /// Product of the extents.
    pub fn volume(&self) -> f64 {
        (0..D).map(|dim| self.extent(dim)).product()
    }

    /// Volume of the sphere circumscribing the box.
    ///
    /// Unlike [`BoundingBox::volume`] this stays non-zero for flat or
    /// elongated boxes, which keeps split comparisons meaningful.
    pub fn spherical_volume(&self) -> f64 {
        let sum_of_squares: f64 = (0..D)
            .map(|dim| {
                let half = self.extent(dim) * 0.5;
                half * half
            })
            .sum();
        let radius = sum_of_squares.sqrt();
        let radius_pow = match D {
            2 => radius * radius,
            3 => radius * radius * radius,
            _ => radius.powi(D as i32),
        };
        radius_pow * unit_sphere_volume(D)
    }

    /// Volume under the given metric.
    pub fn measure(&self, metric: VolumeMetric) -> f64 {
        match metric {
            VolumeMetric::Rectangular => self.volume(),
            VolumeMetric::Spherical => self.spherical_volume(),
        }
    }

    /// Increase in `metric` volume needed for this box to also cover `other`.
    pub fn enlargement(&self, other: &BoundingBox<D>, metric: VolumeMetric) -> f64 {
        self.combine(other).measure(metric) - self.measure(metric)
    }

    /// Combination of all boxes yielded by `boxes`, or `None` if it is empty.
    pub fn cover<'a, I>(boxes: I) -> Option<BoundingBox<D>>
    where
        I: IntoIterator<Item = &'a BoundingBox<D>>,
    {
        let mut iter = boxes.into_iter();
        let mut cover = *iter.next()?;
        for b in iter {
            cover.expand(b);
        }
        Some(cover)
    }
}

/// How box volume is measured by the branch chooser and the split engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeMetric {
    /// Product of per-dimension extents
    Rectangular,
    /// Volume of the circumscribed sphere
    #[default]
    Spherical,
}

/// Volume of the unit sphere in `dims` dimensions.
pub fn unit_sphere_volume(dims: usize) -> f64 {
    if let Some(volume) = UNIT_SPHERE_VOLUMES.get(dims) {
        return *volume;
    }
    // V(n) = V(n - 2) * 2π / n
    let mut n = UNIT_SPHERE_VOLUMES.len() - 1 - (dims % 2);
    if n % 2 != dims % 2 {
        n -= 1;
    }
    let mut volume = UNIT_SPHERE_VOLUMES[n];
    while n < dims {
        n += 2;
        volume *= 2.0 * std::f64::consts::PI / n as f64;
    }
    volume
}
