//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::session::MAX_PLAYERS;
use crate::game::RoomInfo;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins (comma-separated, `*` for any)
fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    cors.allow_origin(allowed_origins).allow_credentials(true)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    queue_size: usize,
    active_rooms: usize,
    rooms: Vec<RoomInfo>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.matchmaking.stats();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        queue_size: stats.queue_size,
        active_rooms: stats.active_rooms,
        rooms: stats.rooms,
    })
}

// ============================================================================
// Server info
// ============================================================================

#[derive(Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
    tick_rate: u32,
    max_players: usize,
    max_rooms: usize,
}

async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        tick_rate: state.config.game.tick_rate,
        max_players: MAX_PLAYERS,
        max_rooms: state.config.matchmaking.max_rooms,
    })
}
