use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use sessions::{SessionError, SessionView};
use shared::{
    domain::SessionKind,
    error::{ApiError, ErrorCode},
    protocol::{CreateSessionRequest, ProbeResponse, SessionListResponse, TabSummary},
};
use tracing::debug;

use crate::dispatch::{RegistryClosed, RegistryHandle};

pub struct AppState {
    pub registry: RegistryHandle,
    pub http: reqwest::Client,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct CreateSessionForm {
    #[serde(default)]
    name: String,
    kind: SessionKind,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/sessions", post(submit_session_form))
        .route("/tabs/:index/focus", post(focus_tab))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:name/probe", get(probe_session))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn home(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let snapshot = state.registry.snapshot().await.map_err(unavailable)?;
    Ok(Html(crate::page::render(&snapshot)))
}

async fn submit_session_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreateSessionForm>,
) -> ApiResult<Redirect> {
    let outcome = state
        .registry
        .submit_form(form.name, form.kind)
        .await
        .map_err(unavailable)?;
    if let Err(err) = outcome {
        debug!(%err, "session form rejected");
    }
    Ok(Redirect::to("/"))
}

async fn focus_tab(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<Redirect> {
    if !state.registry.focus(index).await.map_err(unavailable)? {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, "tab not found")),
        ));
    }
    Ok(Redirect::to("/"))
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionListResponse>> {
    let list = state.registry.list().await.map_err(unavailable)?;
    Ok(Json(list))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<TabSummary>)> {
    let summary = state
        .registry
        .create(req.name, req.kind)
        .await
        .map_err(unavailable)?
        .map_err(|err| {
            let (status, code) = match &err {
                SessionError::EmptyName => (StatusCode::BAD_REQUEST, ErrorCode::Validation),
                SessionError::DuplicateName(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            };
            (status, Json(ApiError::new(code, err.prompt())))
        })?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn probe_session(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<ProbeResponse>> {
    let view = state
        .registry
        .view(name.clone())
        .await
        .map_err(unavailable)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(ErrorCode::NotFound, "session not found")),
            )
        })?;

    let SessionView::Network(network) = view else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                ErrorCode::Validation,
                "only network sessions have a remote endpoint",
            )),
        ));
    };

    let health_url = network.endpoint().health_url().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, e.to_string())),
        )
    })?;
    let endpoint = network
        .endpoint()
        .base_url()
        .map(|url| url.to_string())
        .unwrap_or_else(|_| health_url.to_string());

    let result = state
        .http
        .get(health_url)
        .send()
        .await
        .and_then(|response| response.error_for_status());
    let response = match result {
        Ok(_) => ProbeResponse {
            name,
            endpoint,
            reachable: true,
            detail: None,
        },
        Err(err) => ProbeResponse {
            name,
            endpoint,
            reachable: false,
            detail: Some(err.to_string()),
        },
    };
    Ok(Json(response))
}

fn unavailable(err: RegistryClosed) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError::new(ErrorCode::Unavailable, err.to_string())),
    )
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
