//! Empty-sector selection shared by every [`DataStore`](crate::DataStore)
//! implementation.

use std::collections::BTreeSet;

use starreach_types::SectorCoord;

/// Summary of one generated sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorSummary {
    /// Sector coordinate.
    pub coord: SectorCoord,
    /// Number of stars with at least one colony.
    pub claimed_stars: usize,
}

/// Choose the sector a new empire should start searching from.
///
/// The closest generated sector without claimed stars wins, ordered by
/// distance to the centre and then `(y, x)`. When every generated sector is
/// claimed, the first never-generated coordinate found ring by ring from the
/// centre is returned. `None` once `max_radius` is exhausted.
pub fn pick_empty_sector(
    sectors: impl IntoIterator<Item = SectorSummary>,
    max_radius: u32,
) -> Option<SectorCoord> {
    let limit = u64::from(max_radius);
    let mut explored = BTreeSet::new();
    let mut best: Option<SectorCoord> = None;

    for summary in sectors {
        let coord = summary.coord;
        explored.insert(coord.ordering_key());
        if summary.claimed_stars > 0 || coord.distance_to_centre() > limit {
            continue;
        }
        let closer = best.is_none_or(|b| {
            (coord.distance_to_centre(), coord.ordering_key())
                < (b.distance_to_centre(), b.ordering_key())
        });
        if closer {
            best = Some(coord);
        }
    }

    best.or_else(|| {
        (0..=max_radius)
            .flat_map(|radius| SectorCoord::ORIGIN.ring(radius))
            .find(|coord| !explored.contains(&coord.ordering_key()))
    })
}
