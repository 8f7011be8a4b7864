//! Tree configuration: fill bounds, height guard and volume metric.

use crate::bounding_box::VolumeMetric;

use super::rtree_constants::{DEFAULT_MAX_FILL, DEFAULT_MAX_HEIGHT, DEFAULT_MIN_FILL};
use super::rtree_types::{SpatialError, SpatialResult};

/// Validated R-Tree configuration.
///
/// Create one through [`RTreeConfig::builder`]; the default matches
/// [`RTreeConfig::default`] (max fill 8, min fill 4, height guard 32,
/// spherical volume).
///
/// # Examples
///
/// ```rust
/// use rangetree::{RTree, RTreeConfig, VolumeMetric};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RTreeConfig::builder()
///     .max_fill(16)
///     .min_fill(6)
///     .volume_metric(VolumeMetric::Rectangular)
///     .build()?;
/// let tree: RTree<u64, 3> = RTree::with_config(config);
/// assert_eq!(tree.config().max_fill(), 16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RTreeConfig {
    max_fill: usize,
    min_fill: usize,
    max_height: usize,
    volume_metric: VolumeMetric,
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self {
            max_fill: DEFAULT_MAX_FILL,
            min_fill: DEFAULT_MIN_FILL,
            max_height: DEFAULT_MAX_HEIGHT,
            volume_metric: VolumeMetric::default(),
        }
    }
}

impl RTreeConfig {
    pub fn builder() -> RTreeConfigBuilder {
        RTreeConfigBuilder::new()
    }

    /// Maximum number of entries a node may hold
    pub fn max_fill(&self) -> usize {
        self.max_fill
    }

    /// Minimum number of entries a non-root node must hold
    pub fn min_fill(&self) -> usize {
        self.min_fill
    }

    /// Maximum number of levels; exceeding it is treated as a fatal bug
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn volume_metric(&self) -> VolumeMetric {
        self.volume_metric
    }

    pub fn validate(&self) -> SpatialResult<()> {
        if self.max_fill < 2 {
            return Err(SpatialError::InvalidConfig(format!(
                "max_fill must be at least 2, got {}",
                self.max_fill
            )));
        }
        if self.min_fill == 0 || self.min_fill > self.max_fill / 2 {
            return Err(SpatialError::InvalidConfig(format!(
                "min_fill must be within [1, {}], got {}",
                self.max_fill / 2,
                self.min_fill
            )));
        }
        if self.max_height == 0 {
            return Err(SpatialError::InvalidConfig(
                "max_height must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`RTreeConfig`].
///
/// When only `max_fill` is set, `min_fill` follows it at half its value.
#[derive(Debug, Clone, Default)]
pub struct RTreeConfigBuilder {
    max_fill: Option<usize>,
    min_fill: Option<usize>,
    max_height: Option<usize>,
    volume_metric: Option<VolumeMetric>,
}

impl RTreeConfigBuilder {
    pub fn new() -> RTreeConfigBuilder {
        RTreeConfigBuilder::default()
    }

    pub fn max_fill(mut self, max_fill: usize) -> Self {
        self.max_fill = Some(max_fill);
        self
    }

    pub fn min_fill(mut self, min_fill: usize) -> Self {
        self.min_fill = Some(min_fill);
        self
    }

    pub fn max_height(mut self, max_height: usize) -> Self {
        self.max_height = Some(max_height);
        self
    }

    pub fn volume_metric(mut self, volume_metric: VolumeMetric) -> Self {
        self.volume_metric = Some(volume_metric);
        self
    }

    pub fn build(self) -> SpatialResult<RTreeConfig> {
        let defaults = RTreeConfig::default();
        let max_fill = self.max_fill.unwrap_or(defaults.max_fill);
        let config = RTreeConfig {
            max_fill,
            min_fill: self.min_fill.unwrap_or(max_fill / 2),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            volume_metric: self.volume_metric.unwrap_or(defaults.volume_metric),
        };
        config.validate()?;
        Ok(config)
    }
}
