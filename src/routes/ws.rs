// WebSocket handler and event stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::PushEvent;
use crate::version::service_info;
use crate::worker::LatestUpdate;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the ws client count on drop (connect = +1, drop = -1).
struct WsClientGuard(Arc<AtomicUsize>);

impl Drop for WsClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_network(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.events_tx.clone();
    let latest = state.latest.clone();
    let conn_count = state.ws_clients.clone();
    let poll_interval_millis = state.config.monitoring.poll_interval_millis;
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) =
            stream_network(socket, &mut rx, latest, conn_count, poll_interval_millis).await
        {
            tracing::info!("Network stream error: {}", e);
        }
    })
}

/// Sends one event as a JSON text frame. False when the client is gone or too slow.
async fn send_event(socket: &mut WebSocket, event: &PushEvent) -> anyhow::Result<bool> {
    let json = serde_json::to_string(event)?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}

async fn stream_network(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<PushEvent>,
    latest: LatestUpdate,
    conn_count: Arc<AtomicUsize>,
    poll_interval_millis: u64,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsClientGuard(conn_count);
    tracing::info!("Client connected to network stream");

    let welcome = PushEvent::Info(service_info(poll_interval_millis));
    if !send_event(&mut socket, &welcome).await? {
        return Ok(());
    }
    let current = latest.read().await.clone();
    if let Some(update) = current
        && !send_event(&mut socket, &PushEvent::Update(update)).await?
    {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/network client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from network stream");
    Ok(())
}
