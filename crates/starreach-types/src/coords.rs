//! Sector grid coordinates and absolute galactic positions.
//!
//! The galaxy is an unbounded grid of fixed-size square sectors addressed by
//! signed 64-bit coordinates. A star's absolute position is its sector's
//! origin plus its offset within the sector.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coordinate of a sector on the galaxy grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct SectorCoord {
    /// Column on the grid.
    pub x: i64,
    /// Row on the grid.
    pub y: i64,
}

impl SectorCoord {
    /// The centre of the galaxy.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a coordinate.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance between two sectors.
    pub const fn chebyshev_distance(self, other: Self) -> u64 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Chebyshev distance from the galaxy centre.
    pub const fn distance_to_centre(self) -> u64 {
        self.chebyshev_distance(Self::ORIGIN)
    }

    /// Key used to order sectors deterministically: rows first, then columns.
    pub const fn ordering_key(self) -> (i64, i64) {
        (self.y, self.x)
    }

    /// All coordinates at exactly `radius` Chebyshev distance from `self`,
    /// sorted by [`ordering_key`](Self::ordering_key).
    ///
    /// Radius 0 yields `self` alone; radius `r > 0` yields `8r` coordinates.
    /// Coordinates that would overflow `i64` are skipped.
    pub fn ring(self, radius: u32) -> Vec<Self> {
        let r = i64::from(radius);
        let lo = 0_i64.saturating_sub(r);
        let mut coords = Vec::new();
        for dy in lo..=r {
            for dx in lo..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                if let (Some(x), Some(y)) = (self.x.checked_add(dx), self.y.checked_add(dy)) {
                    coords.push(Self { x, y });
                }
            }
        }
        coords
    }

    /// Absolute position of a point at `(offset_x, offset_y)` inside this
    /// sector, for a galaxy whose sectors are `sector_size` units wide.
    pub const fn position(self, sector_size: i64, offset_x: i64, offset_y: i64) -> GalacticPosition {
        GalacticPosition {
            x: self.x.saturating_mul(sector_size).saturating_add(offset_x),
            y: self.y.saturating_mul(sector_size).saturating_add(offset_y),
        }
    }
}

impl core::fmt::Display for SectorCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Absolute position in galaxy units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GalacticPosition {
    /// Horizontal position.
    pub x: i64,
    /// Vertical position.
    pub y: i64,
}

impl GalacticPosition {
    /// Squared Euclidean distance, widened to avoid overflow.
    pub const fn distance_squared(self, other: Self) -> u128 {
        let dx = self.x.abs_diff(other.x) as u128;
        let dy = self.y.abs_diff(other.y) as u128;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Whether `other` lies strictly closer than `distance` units.
    pub const fn is_within(self, other: Self, distance: u64) -> bool {
        let limit = distance as u128;
        self.distance_squared(other) < limit.saturating_mul(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_zero_is_self() {
        let c = SectorCoord::new(3, -2);
        assert_eq!(c.ring(0), vec![c]);
    }

    #[test]
    fn ring_sizes() {
        let c = SectorCoord::ORIGIN;
        assert_eq!(c.ring(1).len(), 8);
        assert_eq!(c.ring(2).len(), 16);
        assert!(c.ring(2).iter().all(|r| r.chebyshev_distance(c) == 2));
    }

    #[test]
    fn ring_is_sorted_rows_first() {
        let ring = SectorCoord::ORIGIN.ring(1);
        let mut sorted = ring.clone();
        sorted.sort_by_key(|c| c.ordering_key());
        assert_eq!(ring, sorted);
        assert_eq!(ring.first(), Some(&SectorCoord::new(-1, -1)));
    }

    #[test]
    fn position_and_distance() {
        let a = SectorCoord::new(0, 0).position(1024, 100, 100);
        let b = SectorCoord::new(1, 0).position(1024, 100, 100);
        assert_eq!(b.x, 1124);
        assert_eq!(a.distance_squared(b), 1024 * 1024);
        assert!(a.is_within(b, 1025));
        assert!(!a.is_within(b, 1024));
    }
}
