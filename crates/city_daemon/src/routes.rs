use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use city_core::{
    demolish_building, effective_props, place_building, select_building, upgrade_building,
    ActionError, BuildingId, BuildingKind, Provenance,
};

use crate::state::AppState;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, "http://localhost:5173")
}

pub fn make_router_with_cors(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<axum::http::HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/state", get(state_handler))
        .route("/api/v1/stats", get(stats_handler))
        .route("/api/v1/history", get(history_handler))
        .route("/api/v1/selection", get(selection_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/actions/place", post(place_handler))
        .route("/api/v1/actions/demolish", post(demolish_handler))
        .route("/api/v1/actions/upgrade", post(upgrade_handler))
        .route("/api/v1/actions/select", post(select_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .route("/api/v1/autonomy", post(autonomy_handler))
        .route("/api/v1/save", post(save_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PlaceRequest {
    kind: BuildingKind,
    x: i32,
    z: i32,
}

#[derive(Deserialize)]
struct DemolishRequest {
    x: i32,
    z: i32,
}

#[derive(Deserialize)]
struct UpgradeRequest {
    building_id: String,
}

#[derive(Deserialize)]
struct SelectRequest {
    building_id: Option<String>,
}

#[derive(Deserialize)]
struct AutonomyRequest {
    enabled: bool,
}

fn reject(err: &ActionError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"error": err, "message": err.to_string()})),
    )
}

// ---------------------------------------------------------------------------
// Read handlers
// ---------------------------------------------------------------------------

async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let paused = app_state.paused.load(Ordering::Relaxed);
    Json(serde_json::json!({
        "month": sim.game_state.stats.month,
        "seed": sim.game_state.meta.seed,
        "content_version": sim.game_state.meta.content_version,
        "months_per_sec": app_state.months_per_sec,
        "paused": paused,
        "autonomy": sim.game_state.planner.autonomy_enabled,
    }))
}

async fn state_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let sim = app_state.sim.lock();
    match serde_json::to_string(&sim.game_state) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        ),
        Err(err) => {
            tracing::error!("state serialization failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

async fn stats_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    Json(serde_json::json!(sim.game_state.stats))
}

async fn history_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    Json(serde_json::json!(sim.game_state.history))
}

/// The selected building together with its resolved attribute set.
async fn selection_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let payload = sim.game_state.selected.as_ref().and_then(|id| {
        let building = sim.game_state.buildings.get(id)?;
        let def = sim.content.building(building.kind);
        let props = effective_props(def, building.level);
        Some(serde_json::json!({
            "building": building,
            "props": props,
            "max_level": def.max_level(),
            "next_upgrade": def.next_upgrade(building.level),
        }))
    });
    Json(serde_json::json!({ "selection": payload }))
}

// ---------------------------------------------------------------------------
// Action handlers
// ---------------------------------------------------------------------------

async fn place_handler(
    State(app_state): State<AppState>,
    Json(req): Json<PlaceRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut sim = app_state.sim.lock();
    let mut events = Vec::new();
    let crate::state::SimState {
        ref mut game_state,
        ref content,
        ..
    } = *sim;
    let result = place_building(
        game_state,
        content,
        req.kind,
        req.x,
        req.z,
        Provenance::Player,
        &mut events,
    );
    drop(sim);
    let _ = app_state.event_tx.send(events);
    match result {
        Ok(id) => (StatusCode::OK, Json(serde_json::json!({"building_id": id}))),
        Err(err) => reject(&err),
    }
}

async fn demolish_handler(
    State(app_state): State<AppState>,
    Json(req): Json<DemolishRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut sim = app_state.sim.lock();
    let mut events = Vec::new();
    let crate::state::SimState {
        ref mut game_state,
        ref content,
        ..
    } = *sim;
    let result = demolish_building(game_state, content, req.x, req.z, &mut events);
    drop(sim);
    let _ = app_state.event_tx.send(events);
    match result {
        Ok(refund) => (StatusCode::OK, Json(serde_json::json!({"refund": refund}))),
        Err(err) => reject(&err),
    }
}

async fn upgrade_handler(
    State(app_state): State<AppState>,
    Json(req): Json<UpgradeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut sim = app_state.sim.lock();
    let mut events = Vec::new();
    let id = BuildingId(req.building_id);
    let crate::state::SimState {
        ref mut game_state,
        ref content,
        ..
    } = *sim;
    let result = upgrade_building(game_state, content, &id, Provenance::Player, &mut events);
    drop(sim);
    let _ = app_state.event_tx.send(events);
    match result {
        Ok(level) => (StatusCode::OK, Json(serde_json::json!({"level": level}))),
        Err(err) => reject(&err),
    }
}

async fn select_handler(
    State(app_state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut sim = app_state.sim.lock();
    let id = req.building_id.map(BuildingId);
    match select_building(&mut sim.game_state, id.as_ref()) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"selected": sim.game_state.selected})),
        ),
        Err(err) => reject(&err),
    }
}

// ---------------------------------------------------------------------------
// Control handlers
// ---------------------------------------------------------------------------

async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

async fn autonomy_handler(
    State(app_state): State<AppState>,
    Json(req): Json<AutonomyRequest>,
) -> Json<serde_json::Value> {
    let mut sim = app_state.sim.lock();
    city_control::set_autonomy(&mut sim.game_state, req.enabled);
    Json(serde_json::json!({"autonomy": req.enabled}))
}

async fn save_handler(State(app_state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let Some(path) = app_state.snapshot_path.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "no snapshot path configured"})),
        );
    };

    let sim = app_state.sim.lock();
    let state = sim.game_state.clone();
    drop(sim);

    match city_world::save_snapshot(&path, &state, None) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "path": path.display().to_string(),
                "month": state.stats.month,
            })),
        ),
        Err(err) => {
            tracing::error!("snapshot save failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "save failed"})),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Event stream
// ---------------------------------------------------------------------------

async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.event_tx.subscribe();
    let sim = app_state.sim.clone();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(events) if !events.is_empty() => {
                            let data = serde_json::to_string(&events).unwrap_or_default();
                            yield Ok(Event::default().data(data));
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                () = tokio::time::sleep(Duration::from_secs(5)) => {
                    let month = sim.lock().game_state.stats.month;
                    let heartbeat = serde_json::json!({"heartbeat": true, "month": month});
                    yield Ok(Event::default().data(heartbeat.to_string()));
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
