//! Aggregate availability figures derived from an [`OccupancyState`].
//!
//! Nothing here is stored; every figure is recomputed from the live mapping.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{OccupancyState, OccupancyStatus};

/// Spot counts for one location. `total == occupied + free` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total: usize,
    pub occupied: usize,
    pub free: usize,
}

/// One slice of the occupied/free chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistributionSlice {
    pub status: OccupancyStatus,
    pub count: usize,
    /// Whole-number share of the total, e.g. `67` for 2 of 3.
    pub percent: Decimal,
}

#[must_use]
pub fn summarize(state: &OccupancyState) -> AnalyticsSnapshot {
    let total = state.len();
    let occupied = state
        .iter()
        .filter(|s| s.status == OccupancyStatus::Occupied)
        .count();

    AnalyticsSnapshot {
        total,
        occupied,
        free: total - occupied,
    }
}

/// Share of occupied spots as a percentage with exactly one decimal place,
/// so 3 of 4 reads `75.0`.
///
/// Returns zero for an empty location.
#[must_use]
pub fn occupancy_rate_percent(snapshot: &AnalyticsSnapshot) -> Decimal {
    percent_of(snapshot.occupied, snapshot.total, 1)
}

/// Occupied and free slices, in that order.
#[must_use]
pub fn distribution(snapshot: &AnalyticsSnapshot) -> [DistributionSlice; 2] {
    [
        DistributionSlice {
            status: OccupancyStatus::Occupied,
            count: snapshot.occupied,
            percent: percent_of(snapshot.occupied, snapshot.total, 0),
        },
        DistributionSlice {
            status: OccupancyStatus::Free,
            count: snapshot.free,
            percent: percent_of(snapshot.free, snapshot.total, 0),
        },
    ]
}

fn percent_of(part: usize, total: usize, decimal_places: u32) -> Decimal {
    let mut percent = if total == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total))
            .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
    };
    // Pad the scale so whole numbers keep their decimal places when serialized.
    percent.rescale(decimal_places);
    percent
}
