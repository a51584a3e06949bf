use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AppConfig, CatalogError, ConfigError};

/// Latitude/longitude pair of a parking facility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A parking facility and the fixed, ordered set of spots it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// URL-safe key, e.g. `"freedom-square"`.
    pub id: String,
    pub name: String,
    /// Name in the local script, e.g. `"თავისუფლების მოედანი"`.
    pub localized_name: String,
    pub address: String,
    pub coordinates: Coordinates,
    /// Spot identifiers in display order, e.g. `["A1", "A2", ...]`.
    pub spots: Vec<String>,
    /// Free-text pricing label, e.g. `"2 GEL/hour"`.
    pub price: String,
}

impl Location {
    #[must_use]
    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }
}

/// Read-only set of known locations, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

impl LocationCatalog {
    /// Build a catalog from the given locations after validating them.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if an id is blank or repeated, a location has
    /// no spots, a spot id is repeated within its location, or coordinates are
    /// out of range.
    pub fn new(locations: Vec<Location>) -> Result<Self, CatalogError> {
        validate_locations(&locations)?;
        Ok(Self { locations })
    }

    /// The demo catalog of four Tbilisi parking facilities.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            locations: vec![
                builtin_location(
                    "freedom-square",
                    "Freedom Square Parking",
                    "თავისუფლების მოედანი",
                    "Freedom Square, Old Tbilisi",
                    (41.6938, 44.8015),
                    numbered_spots("A", 6)
                        .into_iter()
                        .chain(numbered_spots("B", 6))
                        .collect(),
                    "2 GEL/hour",
                ),
                builtin_location(
                    "rustaveli",
                    "Rustaveli Avenue Parking",
                    "რუსთაველის გამზირი",
                    "Rustaveli Ave, near Parliament",
                    (41.6941, 44.8003),
                    numbered_spots("R", 8),
                    "3 GEL/hour",
                ),
                builtin_location(
                    "vake-park",
                    "Vake Park Parking",
                    "ვაკის პარკი",
                    "Chavchavadze Ave, Vake District",
                    (41.7086, 44.7531),
                    numbered_spots("V", 10),
                    "1.5 GEL/hour",
                ),
                builtin_location(
                    "tbilisi-mall",
                    "Tbilisi Mall Parking",
                    "თბილისი მოლი",
                    "Tbilisi Mall, Saburtalo",
                    (41.7235, 44.7518),
                    numbered_spots("T", 12),
                    "Free (first 2h)",
                ),
            ],
        }
    }

    /// Look up a location by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if `id` is not a known key.
    pub fn get(&self, id: &str) -> Result<&Location, CatalogError> {
        self.find(id).ok_or_else(|| CatalogError::NotFound { id: id.to_string() })
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// All locations in catalog order.
    #[must_use]
    pub fn list(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn builtin_location(
    id: &str,
    name: &str,
    localized_name: &str,
    address: &str,
    (lat, lng): (f64, f64),
    spots: Vec<String>,
    price: &str,
) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
        localized_name: localized_name.to_string(),
        address: address.to_string(),
        coordinates: Coordinates { lat, lng },
        spots,
        price: price.to_string(),
    }
}

fn numbered_spots(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("{prefix}{n}")).collect()
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub locations: Vec<Location>,
}

/// Load and validate a location catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<LocationCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CatalogFile = serde_yaml::from_str(&content)?;
    Ok(LocationCatalog::new(file.locations)?)
}

/// Pick the catalog named by `PARKVISION_CATALOG_PATH`, or the built-in one.
///
/// # Errors
///
/// Returns `ConfigError` if a configured catalog file cannot be loaded, or if
/// the configured default location is not part of the resulting catalog.
pub fn resolve_catalog(config: &AppConfig) -> Result<LocationCatalog, ConfigError> {
    let catalog = match &config.catalog_path {
        Some(path) => load_catalog(path)?,
        None => LocationCatalog::builtin(),
    };

    if !catalog.contains(&config.default_location) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARKVISION_DEFAULT_LOCATION".to_string(),
            reason: format!("'{}' is not in the catalog", config.default_location),
        });
    }

    Ok(catalog)
}

fn validate_locations(locations: &[Location]) -> Result<(), CatalogError> {
    let mut seen_ids = HashSet::new();

    for location in locations {
        if location.id.trim().is_empty() {
            return Err(CatalogError::Validation(
                "location id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(location.id.as_str()) {
            return Err(CatalogError::DuplicateLocation(location.id.clone()));
        }

        if location.spots.is_empty() {
            return Err(CatalogError::EmptyLocation(location.id.clone()));
        }

        let Coordinates { lat, lng } = location.coordinates;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CatalogError::Validation(format!(
                "location '{}' has out-of-range coordinates {lat},{lng}",
                location.id
            )));
        }

        let mut seen_spots = HashSet::new();
        for spot in &location.spots {
            if spot.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "location '{}' has a blank spot id",
                    location.id
                )));
            }
            if !seen_spots.insert(spot.as_str()) {
                return Err(CatalogError::DuplicateSpot {
                    location: location.id.clone(),
                    spot: spot.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, spots: &[&str]) -> Location {
        Location {
            id: id.to_string(),
            name: format!("{id} parking"),
            localized_name: String::new(),
            address: "somewhere".to_string(),
            coordinates: Coordinates {
                lat: 41.7,
                lng: 44.8,
            },
            spots: spots.iter().map(ToString::to_string).collect(),
            price: "1 GEL/hour".to_string(),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = LocationCatalog::builtin();
        assert!(LocationCatalog::new(catalog.list().to_vec()).is_ok());
    }

    #[test]
    fn builtin_catalog_order_and_sizes() {
        let catalog = LocationCatalog::builtin();
        let ids: Vec<&str> = catalog.list().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            ids,
            ["freedom-square", "rustaveli", "vake-park", "tbilisi-mall"]
        );
        let sizes: Vec<usize> = catalog.list().iter().map(Location::spot_count).collect();
        assert_eq!(sizes, [12, 8, 10, 12]);
    }

    #[test]
    fn builtin_freedom_square_spots_are_ordered() {
        let catalog = LocationCatalog::builtin();
        let location = catalog.get("freedom-square").unwrap();
        assert_eq!(location.spots.first().map(String::as_str), Some("A1"));
        assert_eq!(location.spots.get(6).map(String::as_str), Some("B1"));
        assert_eq!(location.price, "2 GEL/hour");
    }

    #[test]
    fn get_unknown_location_is_not_found() {
        let catalog = LocationCatalog::builtin();
        let err = catalog.get("airport").unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound {
                id: "airport".to_string()
            }
        );
    }

    #[test]
    fn validate_rejects_duplicate_location() {
        let err = LocationCatalog::new(vec![location("a", &["1"]), location("a", &["2"])])
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateLocation("a".to_string()));
    }

    #[test]
    fn validate_rejects_duplicate_spot() {
        let err = LocationCatalog::new(vec![location("a", &["A1", "A2", "A1"])]).unwrap_err();
        assert!(err.to_string().contains("duplicate spot id 'A1'"));
    }

    #[test]
    fn validate_rejects_location_without_spots() {
        let err = LocationCatalog::new(vec![location("empty", &[])]).unwrap_err();
        assert_eq!(err, CatalogError::EmptyLocation("empty".to_string()));
    }

    #[test]
    fn validate_rejects_blank_id() {
        let err = LocationCatalog::new(vec![location("  ", &["1"])]).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_out_of_range_coordinates() {
        let mut bad = location("north", &["N1"]);
        bad.coordinates.lat = 91.0;
        let err = LocationCatalog::new(vec![bad]).unwrap_err();
        assert!(err.to_string().contains("out-of-range"));
    }

    #[test]
    fn same_spot_id_in_different_locations_is_allowed() {
        let catalog =
            LocationCatalog::new(vec![location("a", &["S1"]), location("b", &["S1"])]).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn load_catalog_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("locations.yaml");
        assert!(
            path.exists(),
            "locations.yaml missing at {path:?}; required for this test"
        );
        let result = load_catalog(&path);
        assert!(result.is_ok(), "failed to load locations.yaml: {result:?}");
        let catalog = result.unwrap();
        assert!(catalog.contains("freedom-square"));
    }

    #[test]
    fn load_catalog_missing_file_is_io_error() {
        let err = load_catalog(Path::new("/nonexistent/locations.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
    }

    #[test]
    fn location_serializes_coordinates() {
        let json = serde_json::to_value(location("a", &["A1"])).unwrap();
        assert!((json["coordinates"]["lat"].as_f64().unwrap() - 41.7).abs() < 1e-9);
        assert_eq!(json["spots"][0], "A1");
    }
}
