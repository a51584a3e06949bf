pub mod app_config;
pub mod catalog;
pub mod config;
pub mod navigation;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, resolve_catalog, Coordinates, Location, LocationCatalog};
pub use config::{load_app_config, load_app_config_from_env};
pub use navigation::directions_url;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Errors raised while building or querying a [`LocationCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("location not found: {id}")]
    NotFound { id: String },

    #[error("duplicate location id: '{0}'")]
    DuplicateLocation(String),

    #[error("location '{location}' has duplicate spot id '{spot}'")]
    DuplicateSpot { location: String, spot: String },

    #[error("location '{0}' has no spots")]
    EmptyLocation(String),

    #[error("{0}")]
    Validation(String),
}
