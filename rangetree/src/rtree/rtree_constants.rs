//! Constants for the R-Tree implementation.

/// Default maximum number of entries per node
pub const DEFAULT_MAX_FILL: usize = 8;

/// Default minimum number of entries per non-root node (half of max)
pub const DEFAULT_MIN_FILL: usize = DEFAULT_MAX_FILL / 2;

/// Default bound on tree height; allows roughly `min_fill ^ 32` entries
pub const DEFAULT_MAX_HEIGHT: usize = 32;

/// Upper bound on the encoded size of any single value read by `load`.
/// A corrupted length prefix fails with this instead of allocating.
pub const MAX_DECODED_VALUE_BYTES: usize = 1 << 24;

/// Magic number for file format identification ("RTRE", little-endian)
pub const MAGIC: u32 = u32::from_le_bytes(*b"RTRE");

/// Volumes of the unit sphere for dimensions 0 through 20
pub const UNIT_SPHERE_VOLUMES: [f64; 21] = [
    0.000000, 2.000000, 3.141593, // 0, 1, 2
    4.188790, 4.934802, 5.263789, // 3, 4, 5
    5.167713, 4.724766, 4.058712, // 6, 7, 8
    3.298509, 2.550164, 1.884104, // 9, 10, 11
    1.335263, 0.910629, 0.599265, // 12, 13, 14
    0.381443, 0.235331, 0.140981, // 15, 16, 17
    0.082146, 0.046622, 0.025807, // 18, 19, 20
];
