use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use parkvision_engine::{DashboardOverview, OccupancyStatus, View};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{json_body, map_engine_error, require_id, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ViewRequest {
    pub view: View,
}

#[derive(Debug, Deserialize)]
pub(super) struct SelectLocationRequest {
    pub location_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SelectSpotRequest {
    pub spot_id: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SpotToggleData {
    pub spot_id: String,
    pub status: OccupancyStatus,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearSelectionData {
    pub cleared: bool,
}

type OverviewResult = Result<Json<ApiResponse<DashboardOverview>>, ApiError>;

pub(super) async fn get_dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<DashboardOverview>> {
    let overview = state.dashboard.lock().await.overview();
    Json(ApiResponse::new(overview, req_id.0))
}

pub(super) async fn set_view(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ViewRequest>, JsonRejection>,
) -> OverviewResult {
    let body = json_body(&req_id.0, body)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.set_view(body.view);
    Ok(Json(ApiResponse::new(dashboard.overview(), req_id.0)))
}

pub(super) async fn select_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SelectLocationRequest>, JsonRejection>,
) -> OverviewResult {
    let body = json_body(&req_id.0, body)?;
    let location_id = require_id(&req_id.0, "location_id", &body.location_id)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard
        .select_location(location_id)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(dashboard.overview(), req_id.0)))
}

pub(super) async fn toggle_spot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(spot_id): Path<String>,
) -> Result<Json<ApiResponse<SpotToggleData>>, ApiError> {
    let status = state
        .dashboard
        .lock()
        .await
        .toggle_spot(&spot_id)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(
        SpotToggleData { spot_id, status },
        req_id.0,
    )))
}

pub(super) async fn select_spot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SelectSpotRequest>, JsonRejection>,
) -> OverviewResult {
    let body = json_body(&req_id.0, body)?;
    let spot_id = require_id(&req_id.0, "spot_id", &body.spot_id)?;
    let dashboard = state.dashboard.lock().await;
    dashboard
        .select_spot(spot_id)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(dashboard.overview(), req_id.0)))
}

pub(super) async fn clear_selection(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ClearSelectionData>> {
    let cleared = state.dashboard.lock().await.clear_selection();
    Json(ApiResponse::new(ClearSelectionData { cleared }, req_id.0))
}
