use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::data::ingest;
use crate::data::store::Collection;
use crate::engine::selection::ClickOutcome;
use crate::engine::session::ChartSession;
use crate::error::ChartError;

pub struct AppState {
    pub session: Mutex<ChartSession>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: Mutex::new(ChartSession::new(config.chart.clone())),
            config,
        }
    }

    /// The session stays usable even if a handler panicked while holding it.
    fn session(&self) -> MutexGuard<'_, ChartSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IntoResponse for ChartError {
    fn into_response(self) -> Response {
        let status = match &self {
            ChartError::Structural { .. } | ChartError::DuplicateKey { .. } | ChartError::Parse(_) => {
                StatusCode::BAD_REQUEST
            }
            ChartError::LookupMiss { .. } | ChartError::PageUnavailable { .. } => StatusCode::NOT_FOUND,
            ChartError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"status": "error", "message": self.to_string()}))).into_response()
    }
}

type ApiResult = Result<Response, ChartError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/candles", post(load_candles))
        .route("/signals", post(add_signals))
        .route("/levels", post(add_levels))
        .route("/trends", post(add_trends))
        .route("/annotations", post(merge_annotations))
        .route("/markers", post(replace_markers))
        .route("/collections/{collection}", delete(clear_collection))
        .route("/view", get(get_view))
        .route("/pages", get(get_pages))
        .route("/page", post(select_page))
        .route("/search", post(search))
        .route("/click", post(click))
        .route("/popup/close", post(close_popup))
        .route("/tooltip/{timestamp}", get(get_tooltip))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API Server listening on {}", addr);
    axum::serve(listener, app).await
}

fn loaded(collection: Collection, total: usize) -> Response {
    Json(json!({"status": "loaded", "collection": collection, "total": total})).into_response()
}

async fn load_candles(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let candles = ingest::parse_candles(&body)?;
    let total = state.session().load_candles(candles)?;
    Ok(loaded(Collection::Candles, total))
}

async fn add_signals(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let signals = ingest::parse_signals(&body)?;
    let total = state.session().add_signals(signals);
    Ok(loaded(Collection::Signals, total))
}

async fn add_levels(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let levels = ingest::parse_levels(&body)?;
    let total = state.session().add_levels(levels);
    Ok(loaded(Collection::Levels, total))
}

async fn add_trends(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let trends = ingest::parse_trends(&body)?;
    let total = state.session().add_trends(trends);
    Ok(loaded(Collection::Trends, total))
}

async fn merge_annotations(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let annotations = ingest::parse_annotations(&body)?;
    let total = state.session().merge_annotations(annotations);
    Ok(loaded(Collection::Annotations, total))
}

async fn replace_markers(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let markers = ingest::parse_markers(&body)?;
    let total = state.session().replace_markers(markers);
    Ok(loaded(Collection::Markers, total))
}

async fn clear_collection(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<Collection>,
) -> impl IntoResponse {
    state.session().clear(collection);
    Json(json!({"status": "cleared", "collection": collection}))
}

async fn get_view(State(state): State<Arc<AppState>>) -> ApiResult {
    let session = state.session();
    let view = serde_json::to_value(session.snapshot())
        .inspect_err(|e| error!("Failed to serialize view: {}", e))?;
    Ok(Json(view).into_response())
}

async fn get_pages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session();
    Json(json!({
        "available": session.available_pages(),
        "selected": session.selected_page(),
        "options": session.page_options(),
    }))
}

#[derive(Deserialize)]
struct PageRequest {
    page: i64,
}

async fn select_page(State(state): State<Arc<AppState>>, Json(req): Json<PageRequest>) -> ApiResult {
    let mut session = state.session();
    let shown = session.select_page(req.page)?.len();
    Ok(Json(json!({"status": "ok", "page": req.page, "candles": shown})).into_response())
}

#[derive(Deserialize)]
struct SearchRequest {
    timestamp: i64,
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> ApiResult {
    let mut session = state.session();
    match session.search(req.timestamp) {
        Ok(window) => {
            let shown = window.len();
            Ok(Json(json!({"status": "ok", "timestamp": req.timestamp, "candles": shown})).into_response())
        }
        Err(e) => {
            warn!("Search for {} failed: {}", req.timestamp, e);
            Err(e)
        }
    }
}

#[derive(Deserialize)]
struct ClickRequest {
    timestamp: Option<i64>,
}

async fn click(State(state): State<Arc<AppState>>, Json(req): Json<ClickRequest>) -> impl IntoResponse {
    let outcome = state.session().click(req.timestamp);
    let body = match outcome {
        ClickOutcome::Ignored => json!({"outcome": "ignored"}),
        ClickOutcome::OpenedSignal(handle) => json!({"outcome": "signal", "index": handle.index}),
        ClickOutcome::OpenedTrend(handle) => json!({"outcome": "trend", "index": handle.index}),
        ClickOutcome::Highlighted(ts) => json!({"outcome": "highlighted", "timestamp": ts}),
    };
    Json(body)
}

async fn close_popup(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session().close_popup();
    Json(json!({"status": "closed"}))
}

async fn get_tooltip(State(state): State<Arc<AppState>>, Path(timestamp): Path<i64>) -> ApiResult {
    let tooltip = state.session().tooltip(timestamp)?;
    Ok(Json(tooltip).into_response())
}
