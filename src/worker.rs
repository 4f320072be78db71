// Background sampling worker.
// Owns the sampler, so cycles run strictly one after another; late ticks are skipped, not queued.

use crate::models::{NetworkUpdate, PushEvent};
use crate::provider::SystemInfoProvider;
use crate::sampler::{AlertSink, Sampler};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" logging (avoid logging every tick when no one is on /ws/network)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Most recent successful update, served to late joiners.
pub type LatestUpdate = Arc<RwLock<Option<NetworkUpdate>>>;

/// Sampler, channels, and shutdown for the worker.
pub struct WorkerDeps<P, S> {
    pub sampler: Sampler<P, S>,
    pub tx: broadcast::Sender<PushEvent>,
    pub latest: LatestUpdate,
    pub ws_clients: Arc<AtomicUsize>,
    /// Alerts emitted by the sampler's sink; only read for stats logging.
    pub alerts_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and logging config.
pub struct WorkerConfig {
    pub poll_interval_millis: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
    /// Warn when this many samples in a row have failed (and on every further multiple).
    pub failure_warn_threshold: u32,
}

#[derive(Debug, Default)]
struct SampleCounters {
    ok: u64,
    failed: u64,
    skipped: u64,
    consecutive_failures: u32,
}

impl SampleCounters {
    fn record_ok(&mut self) -> Option<u32> {
        self.ok += 1;
        let recovered_after = (self.consecutive_failures > 0).then_some(self.consecutive_failures);
        self.consecutive_failures = 0;
        recovered_after
    }

    /// Returns true when the consecutive-failure count hits a multiple of `threshold`.
    fn record_failure(&mut self, threshold: u32) -> bool {
        self.failed += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        threshold > 0 && self.consecutive_failures % threshold == 0
    }
}

/// Spawns the sampling loop. The sampler is handed back when the loop stops on shutdown.
pub fn spawn<P, S>(
    deps: WorkerDeps<P, S>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<Sampler<P, S>>
where
    P: SystemInfoProvider + 'static,
    S: AlertSink + 'static,
{
    let WorkerDeps {
        mut sampler,
        tx,
        latest,
        ws_clients,
        alerts_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        poll_interval_millis,
        stats_log_interval_secs,
        failure_warn_threshold,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
    let worker_span = tracing::debug_span!("worker", poll_interval_millis);

    let run = async move {
        let mut tick = interval(Duration::from_millis(poll_interval_millis));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut counters = SampleCounters::default();
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match sampler.sample().await {
                        Ok(update) => {
                            if let Some(n) = counters.record_ok() {
                                tracing::info!(failed_samples = n, "sampling recovered");
                            }
                            *latest.write().await = Some(update.clone());
                            if tx.send(PushEvent::Update(update)).is_err() {
                                let should_warn = last_no_receivers_warn
                                    .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                                if should_warn {
                                    tracing::debug!(
                                        operation = "broadcast_update",
                                        "No active WebSocket clients; broadcast channel has no receivers"
                                    );
                                    last_no_receivers_warn = Some(Instant::now());
                                }
                            }
                        }
                        Err(e) if e.is_degenerate_timing() => {
                            counters.skipped += 1;
                            tracing::debug!(error = %e, operation = "sample", "sample skipped");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "sample", "sample failed; skipping tick");
                            if counters.record_failure(failure_warn_threshold) {
                                tracing::warn!(
                                    consecutive_failures = counters.consecutive_failures,
                                    "network telemetry unavailable for several consecutive ticks"
                                );
                            }
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = ws_clients.load(Ordering::Relaxed),
                        samples_ok = counters.ok,
                        samples_failed = counters.failed,
                        samples_skipped = counters.skipped,
                        alerts_total = alerts_total.load(Ordering::Relaxed),
                        known_apps = sampler.known_apps().len(),
                        known_hosts = sampler.known_hosts().len(),
                        "app stats"
                    );
                }
            }
        }
        sampler
    };
    tokio::spawn(run.instrument(worker_span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_warning_fires_on_threshold_multiples() {
        let mut c = SampleCounters::default();
        let fired: Vec<bool> = (0..6).map(|_| c.record_failure(3)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
        assert_eq!(c.failed, 6);
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let mut c = SampleCounters::default();
        assert_eq!(c.record_ok(), None);
        c.record_failure(5);
        c.record_failure(5);
        assert_eq!(c.record_ok(), Some(2));
        assert_eq!(c.consecutive_failures, 0);
        assert_eq!(c.ok, 2);
    }
}
