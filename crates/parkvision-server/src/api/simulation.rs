use axum::{extract::State, Extension, Json};
use parkvision_engine::Dashboard;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct SimulationStatus {
    pub running: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct SimulationCommandResult {
    pub running: bool,
    /// `false` when the command was a no-op, e.g. starting an already running simulation.
    pub changed: bool,
}

pub(super) async fn get_simulation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SimulationStatus>> {
    let dashboard = state.dashboard.lock().await;
    let status = SimulationStatus {
        running: dashboard.is_simulating(),
        interval_ms: u64::try_from(dashboard.simulation_interval().as_millis())
            .unwrap_or(u64::MAX),
    };
    Json(ApiResponse::new(status, req_id.0))
}

pub(super) async fn start_simulation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SimulationCommandResult>> {
    run_command(&state, req_id, Dashboard::start_simulation).await
}

pub(super) async fn stop_simulation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SimulationCommandResult>> {
    run_command(&state, req_id, Dashboard::stop_simulation).await
}

pub(super) async fn toggle_simulation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SimulationCommandResult>> {
    run_command(&state, req_id, |dashboard| {
        dashboard.toggle_simulation();
        true
    })
    .await
}

async fn run_command(
    state: &AppState,
    req_id: RequestId,
    command: impl FnOnce(&mut Dashboard) -> bool,
) -> Json<ApiResponse<SimulationCommandResult>> {
    let mut dashboard = state.dashboard.lock().await;
    let changed = command(&mut *dashboard);
    let result = SimulationCommandResult {
        running: dashboard.is_simulating(),
        changed,
    };
    Json(ApiResponse::new(result, req_id.0))
}
