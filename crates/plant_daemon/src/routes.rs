use crate::state::AppState;
use crate::tick_loop;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use plant_core::{ActionOutcome, Category, ReportRecord, Status};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Reports returned when the request does not set `limit`.
const DEFAULT_REPORT_LIMIT: usize = 100;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, HeaderValue::from_static("http://localhost:5173"))
}

pub fn make_router_with_cors(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .route("/api/v1/modules", get(modules_handler))
        .route("/api/v1/modules/:identifier/:action", post(action_handler))
        .route("/api/v1/tick", post(tick_handler))
        .route("/api/v1/reports", get(reports_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = app_state.plant.snapshot();
    let paused = app_state.paused.load(Ordering::Relaxed);
    Json(serde_json::json!({
        "tick": snapshot.meta.tick,
        "seed": snapshot.meta.seed,
        "modules": snapshot.registry.len(),
        "eligible_modules": snapshot.registry.eligible_count(),
        "reports_in_memory": app_state.plant.sink().history_len(),
        "ticks_per_sec": app_state.ticks_per_sec,
        "paused": paused,
    }))
}

pub async fn snapshot_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let snapshot = app_state.plant.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        ),
        Err(err) => {
            tracing::error!("snapshot serialization failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

#[derive(Serialize)]
pub struct ModuleSummary {
    pub identifier: String,
    pub name: String,
    pub category: Category,
    pub status: Status,
    pub ticked: bool,
}

pub async fn modules_handler(State(app_state): State<AppState>) -> Json<Vec<ModuleSummary>> {
    let snapshot = app_state.plant.snapshot();
    let registry = &snapshot.registry;
    let modules = registry
        .modules()
        .map(|(category, module)| ModuleSummary {
            identifier: module.identifier(),
            name: module.name.clone(),
            category,
            status: module.status,
            ticked: registry.is_eligible(&module.name),
        })
        .collect();
    Json(modules)
}

pub async fn action_handler(
    State(app_state): State<AppState>,
    Path((identifier, action)): Path<(String, String)>,
) -> (StatusCode, Json<ActionOutcome>) {
    let outcome = app_state.plant.apply_action(&identifier, &action);
    let status = if outcome.applied {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(outcome))
}

pub async fn tick_handler(State(app_state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match tick_loop::tick_blocking(app_state.plant.clone()).await {
        Ok(summary) => (StatusCode::OK, Json(serde_json::json!(summary))),
        Err(err) => {
            tracing::error!("manual tick reports not recorded: {err:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": format!("{err:#}")})),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Substring match on module name, e.g. `Reactor`.
    pub module: Option<String>,
    pub limit: Option<usize>,
}

pub async fn reports_handler(
    State(app_state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Json<Vec<ReportRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_REPORT_LIMIT);
    Json(
        app_state
            .plant
            .sink()
            .recent(query.module.as_deref(), limit),
    )
}

pub async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

pub async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.plant.sink().subscribe();
    let plant = app_state.plant.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(5));
        heartbeat.tick().await; // discard the immediate first tick
        let mut flush = tokio::time::interval(Duration::from_millis(50));
        flush.tick().await; // discard the immediate first tick
        let mut pending: Vec<ReportRecord> = Vec::new();
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(record) => pending.push(record),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "report stream subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = flush.tick() => {
                    if !pending.is_empty() {
                        let data = serde_json::to_string(&pending).unwrap_or_default();
                        pending.clear();
                        yield Ok(Event::default().data(data));
                    }
                }
                _ = heartbeat.tick() => {
                    let tick = plant.tick_count();
                    let hb = serde_json::json!({"heartbeat": true, "tick": tick});
                    yield Ok(Event::default().data(hb.to_string()));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}
