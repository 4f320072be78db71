// GET handlers: banner, version, latest update

use axum::{extract::State, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

pub(super) const ROOT_BANNER: &str = "netwatch: live network telemetry on /ws/network";

pub(super) async fn root_handler() -> &'static str {
    ROOT_BANNER
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/latest: most recent update, or `null` before the first successful sample.
pub(super) async fn latest_handler(State(state): State<AppState>) -> impl IntoResponse {
    let latest = state.latest.read().await.clone();
    axum::Json(latest)
}
