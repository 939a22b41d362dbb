//! HTTP request handlers

use super::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

/// Query parameters for library search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    #[serde(default)]
    pub query: String,
}

/// Library search handler
pub async fn api_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Response {
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    let tenant = state.tenant_for(host);
    debug!("Library search from host {:?} as tenant {}", host, tenant);

    match state.search.perform_search(&tenant, &params.query).await {
        Ok(aggregate) => Json(aggregate).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.to_string()).into_response()
        }
    }
}

/// Backend statistics handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics().snapshot())
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance": state.instance_name(),
        "version": crate::VERSION
    }))
}
