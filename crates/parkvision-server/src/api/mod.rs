mod dashboard;
mod locations;
mod simulation;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use parkvision_core::LocationCatalog;
use parkvision_engine::{Dashboard, EngineError};
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<LocationCatalog>,
    pub dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    #[must_use]
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            catalog: Arc::clone(dashboard.catalog()),
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "unknown_spot" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "invalid_selection" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_engine_error(request_id: String, error: &EngineError) -> ApiError {
    let code = match error {
        EngineError::NotFound { .. } => "not_found",
        EngineError::UnknownSpot { .. } => "unknown_spot",
        EngineError::InvalidSelection { .. } => "invalid_selection",
        EngineError::Catalog(_) => "internal_error",
    };
    tracing::debug!(error = %error, code, "engine rejected command");
    ApiError::new(request_id, code, error.to_string())
}

/// Unwrap a JSON body, turning axum's rejection into a `bad_request` envelope.
pub(super) fn json_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::new(request_id, "bad_request", rejection.body_text())
    })
}

pub(super) fn require_id<'a>(
    request_id: &str,
    field: &str,
    value: &'a str,
) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("{field} must not be blank"),
        ));
    }
    Ok(trimmed)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/locations", get(locations::list_locations))
        .route("/api/v1/locations/{id}", get(locations::get_location))
        .route("/api/v1/dashboard", get(dashboard::get_dashboard))
        .route("/api/v1/dashboard/view", put(dashboard::set_view))
        .route("/api/v1/dashboard/location", put(dashboard::select_location))
        .route(
            "/api/v1/dashboard/spots/{spot_id}/toggle",
            post(dashboard::toggle_spot),
        )
        .route(
            "/api/v1/dashboard/selection",
            put(dashboard::select_spot).delete(dashboard::clear_selection),
        )
        .route("/api/v1/simulation", get(simulation::get_simulation))
        .route("/api/v1/simulation/start", post(simulation::start_simulation))
        .route("/api/v1/simulation/stop", post(simulation::stop_simulation))
        .route(
            "/api/v1/simulation/toggle",
            post(simulation::toggle_simulation),
        )
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::new(HealthData { status: "ok" }, req_id.0))
}
