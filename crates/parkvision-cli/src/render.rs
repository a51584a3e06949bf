//! Plain-text rendering of catalog entries, spot grids and analytics.

use std::fmt::Write as _;

use parkvision_core::Location;
use parkvision_engine::{
    distribution, occupancy_rate_percent, AnalyticsSnapshot, DashboardOverview, OccupancyStatus,
    SpotOccupancy,
};

const GRID_COLUMNS: usize = 6;

pub(crate) fn render_locations(locations: &[Location]) -> String {
    let mut out = String::new();
    for location in locations {
        let _ = writeln!(
            out,
            "{:<16} {} ({})",
            location.id, location.name, location.localized_name
        );
        let _ = writeln!(
            out,
            "{:<16} {} | {} spots | {}",
            "",
            location.address,
            location.spot_count(),
            location.price
        );
    }
    out
}

fn cell(spot: &SpotOccupancy, selection: Option<&str>) -> String {
    let mark = match spot.status {
        OccupancyStatus::Free if selection == Some(spot.spot_id.as_str()) => '*',
        OccupancyStatus::Free => ' ',
        OccupancyStatus::Occupied => 'X',
    };
    format!("{:>3}[{mark}]", spot.spot_id)
}

/// Spots laid out in rows of six. `*` marks the selected spot.
pub(crate) fn render_grid(spots: &[SpotOccupancy], selection: Option<&str>) -> String {
    spots
        .chunks(GRID_COLUMNS)
        .map(|row| {
            row.iter()
                .map(|spot| cell(spot, selection))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn render_analytics(snapshot: &AnalyticsSnapshot) -> String {
    let [occupied, free] = distribution(snapshot);
    format!(
        "total {} | occupied {} | free {} | occupancy {:.1}% | split {}% / {}%",
        snapshot.total,
        snapshot.occupied,
        snapshot.free,
        occupancy_rate_percent(snapshot),
        occupied.percent,
        free.percent,
    )
}

pub(crate) fn render_overview(overview: &DashboardOverview) -> String {
    let mut out = String::new();
    if let Some(location) = &overview.location {
        let _ = writeln!(out, "{} ({})", location.name, location.localized_name);
        let _ = writeln!(out, "{}", location.price);
    }
    let _ = writeln!(
        out,
        "{}",
        render_grid(&overview.spots, overview.selection.as_deref())
    );
    let _ = writeln!(out, "{}", render_analytics(&overview.analytics));
    if let Some(url) = &overview.directions_url {
        let _ = writeln!(out, "directions: {url}");
    }
    out
}
