use axum::{
    extract::{Path, State},
    Extension, Json,
};
use parkvision_core::{directions_url, CatalogError, Location};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct LocationItem {
    #[serde(flatten)]
    pub location: Location,
    pub spot_count: usize,
    pub directions_url: String,
}

impl From<&Location> for LocationItem {
    fn from(location: &Location) -> Self {
        Self {
            spot_count: location.spot_count(),
            directions_url: directions_url(&location.coordinates),
            location: location.clone(),
        }
    }
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<LocationItem>>> {
    let data = state.catalog.list().iter().map(LocationItem::from).collect();
    Json(ApiResponse::new(data, req_id.0))
}

pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LocationItem>>, ApiError> {
    match state.catalog.get(&id) {
        Ok(location) => Ok(Json(ApiResponse::new(
            LocationItem::from(location),
            req_id.0,
        ))),
        Err(e @ CatalogError::NotFound { .. }) => {
            Err(ApiError::new(req_id.0, "not_found", e.to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, "catalog lookup failed");
            Err(ApiError::new(req_id.0, "internal_error", "catalog lookup failed"))
        }
    }
}
