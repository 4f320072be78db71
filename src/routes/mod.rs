// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::models::PushEvent;
use crate::worker::LatestUpdate;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) events_tx: broadcast::Sender<PushEvent>,
    pub(crate) latest: LatestUpdate,
    pub(crate) ws_clients: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    events_tx: broadcast::Sender<PushEvent>,
    latest: LatestUpdate,
    ws_clients: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let static_dir = config.server.static_dir.clone();
    let state = AppState {
        events_tx,
        latest,
        ws_clients,
        config,
    };
    let router = Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/latest", get(http::latest_handler)) // GET /api/latest
        .route("/ws/network", get(ws::ws_network)); // WS /ws/network
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.route("/", get(http::root_handler)), // GET /
    };
    router
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
