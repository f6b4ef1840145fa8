//! HTTP surface: an SSE search endpoint plus read/write access to the configuration.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::config::SiteConfig;
use crate::types::SourceResult;
use crate::VodHub;

#[derive(Clone)]
struct AppState {
    hub: Arc<VodHub>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    keyword: Option<String>,
}

/// Every route is open to any origin so a frontend hosted elsewhere can call it.
pub fn router(hub: Arc<VodHub>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/search", get(handle_search))
        .route("/config", get(handle_get_config).post(handle_update_config))
        .with_state(AppState { hub })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(hub: Arc<VodHub>, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind).await.with_context(|| format!("binding {bind}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(hub)).await.context("server error")
}

/// One SSE frame: `data: <json>\n\n`. Non-ASCII text is written as-is.
pub fn sse_frame(result: &SourceResult) -> Result<String> {
    Ok(format!("data: {}\n\n", serde_json::to_string(result)?))
}

/// Blank or whitespace-only keywords are rejected before any source is contacted.
pub fn normalize_keyword(keyword: Option<&str>) -> Option<&str> {
    keyword.map(str::trim).filter(|k| !k.is_empty())
}

async fn handle_search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let Some(keyword) = normalize_keyword(params.keyword.as_deref()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "keyword is required" }))).into_response();
    };
    info!(keyword, "search");
    // dropping the body on client disconnect drops the stream, which aborts the fetches
    let events = state.hub.search(keyword).map(|result| Event::default().json_data(result));
    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

async fn handle_get_config(State(state): State<AppState>) -> Json<SiteConfig> {
    Json(state.hub.config().as_ref().clone())
}

async fn handle_update_config(State(state): State<AppState>, Json(config): Json<SiteConfig>) -> Response {
    match state.hub.update_config(config).await {
        Ok(current) => Json(json!({
            "message": "Configuration updated and saved successfully.",
            "current_config": current.as_ref(),
        }))
        .into_response(),
        Err(e) if e.downcast_ref::<ConfigError>().is_some() => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "config update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": format!("Error updating config: {e}") }))).into_response()
        }
    }
}
