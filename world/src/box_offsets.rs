//! Precomputed perimeter offsets driving the expanding ring searches.

use arrakis_core::FootprintSize;

/// Footprints that have a precomputed offset table.
pub const SUPPORTED_FOOTPRINTS: [FootprintSize; 5] = [
    FootprintSize::new(1, 1),
    FootprintSize::new(2, 2),
    FootprintSize::new(2, 3),
    FootprintSize::new(3, 2),
    FootprintSize::new(3, 3),
];

/// Rings of offsets around a footprint, one ring per search depth.
///
/// Ring `d` walks the perimeter of the footprint inflated by `d` tiles: the
/// left column top to bottom, the right column top to bottom, then the top
/// and bottom rows without the corners already visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxOffsets {
    size: FootprintSize,
    rings: Vec<Vec<(i32, i32)>>,
}

impl BoxOffsets {
    /// Builds rings for depths `1..=max_depth`.
    #[must_use]
    pub fn new(size: FootprintSize, max_depth: i32) -> Self {
        let rings = (1..=max_depth.max(0))
            .map(|depth| ring_offsets(size, depth))
            .collect();
        Self { size, rings }
    }

    /// Footprint the rings surround.
    #[must_use]
    pub const fn size(&self) -> FootprintSize {
        self.size
    }

    /// Deepest ring available.
    #[must_use]
    pub fn max_depth(&self) -> i32 {
        i32::try_from(self.rings.len()).unwrap_or(i32::MAX)
    }

    /// Offsets of ring `depth`, or an empty slice past the last ring.
    #[must_use]
    pub fn ring(&self, depth: i32) -> &[(i32, i32)] {
        usize::try_from(depth - 1)
            .ok()
            .and_then(|index| self.rings.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The per-map collection of offset tables, one per supported footprint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoxOffsetTable {
    tables: Vec<BoxOffsets>,
}

impl BoxOffsetTable {
    /// Builds tables deep enough to cover a map of the given size.
    #[must_use]
    pub fn for_map(width: i32, height: i32) -> Self {
        let max_depth = width.max(height);
        Self {
            tables: SUPPORTED_FOOTPRINTS
                .into_iter()
                .map(|size| BoxOffsets::new(size, max_depth))
                .collect(),
        }
    }

    /// Table for `size`, if that footprint is supported.
    #[must_use]
    pub fn get(&self, size: FootprintSize) -> Option<&BoxOffsets> {
        self.tables.iter().find(|table| table.size() == size)
    }
}

/// Computes a single ring without consulting a table.
#[must_use]
pub fn ring_offsets(size: FootprintSize, depth: i32) -> Vec<(i32, i32)> {
    let left = -depth;
    let right = size.width - 1 + depth;
    let top = -depth;
    let bottom = size.height - 1 + depth;

    let mut ring = Vec::new();
    ring.extend((top..=bottom).map(|y| (left, y)));
    ring.extend((top..=bottom).map(|y| (right, y)));
    ring.extend((left + 1..right).map(|x| (x, top)));
    ring.extend((left + 1..right).map(|x| (x, bottom)));
    ring
}
