//! Routes owned by this process. Device control routes are mounted by their
//! own collaborators and are not part of this router.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::DiscoveryPayload,
};

use crate::app_state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct HomeResponse {
    pub(crate) service: String,
    pub(crate) version: String,
    pub(crate) device_name: String,
    pub(crate) http_port: u16,
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/discovery", get(current_announcement))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn home(State(state): State<Arc<AppState>>) -> Json<HomeResponse> {
    Json(HomeResponse {
        service: "control".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device_name: state.device_name.clone(),
        http_port: state.http_port,
    })
}

async fn current_announcement(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiscoveryPayload>, (StatusCode, Json<ApiError>)> {
    let broadcast = state.broadcast.lock().await;
    broadcast.announcement().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                ErrorCode::NotFound,
                "discovery broadcast is not running",
            )),
        )
    })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
