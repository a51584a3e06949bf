use parkvision_core::CatalogError;
use thiserror::Error;

use crate::OccupancyStatus;

/// Recoverable failures of engine commands. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("location not found: {id}")]
    NotFound { id: String },

    #[error("unknown spot: {spot_id}")]
    UnknownSpot { spot_id: String },

    #[error("spot {spot_id} is {status} and cannot be selected")]
    InvalidSelection {
        spot_id: String,
        status: OccupancyStatus,
    },

    #[error(transparent)]
    Catalog(CatalogError),
}

impl From<CatalogError> for EngineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { id } => EngineError::NotFound { id },
            other => EngineError::Catalog(other),
        }
    }
}
