//! Outbound links to an external navigation service.

use crate::Coordinates;

const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// Build a driving-directions URL to the given coordinates.
///
/// Opening the link is left to the host environment.
#[must_use]
pub fn directions_url(coordinates: &Coordinates) -> String {
    format!(
        "{DIRECTIONS_BASE_URL}&destination={},{}&travelmode=driving",
        coordinates.lat, coordinates.lng
    )
}
