// Alert delivery capability

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::models::{Alert, PushEvent};

/// Receives alerts as the sampler produces them. Must not block.
pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: Alert);
}

/// Pushes alerts onto the subscriber broadcast channel next to updates.
#[derive(Clone)]
pub struct BroadcastAlertSink {
    tx: broadcast::Sender<PushEvent>,
    alerts_total: Arc<AtomicU64>,
}

impl BroadcastAlertSink {
    pub fn new(tx: broadcast::Sender<PushEvent>) -> Self {
        Self {
            tx,
            alerts_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of alerts emitted so far (for stats logging).
    pub fn alerts_total(&self) -> Arc<AtomicU64> {
        self.alerts_total.clone()
    }
}

impl AlertSink for BroadcastAlertSink {
    fn emit(&self, alert: Alert) {
        tracing::info!(kind = %alert.kind, message = %alert.message, "alert");
        self.alerts_total.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(PushEvent::Alert(alert)).is_err() {
            tracing::debug!(operation = "broadcast_alert", "No subscribers for alert");
        }
    }
}
