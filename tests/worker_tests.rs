// Worker integration: spawn sampler loop on a fake provider, observe broadcast events, shutdown

mod common;

use common::*;
use netwatch::models::{AlertKind, PushEvent};
use netwatch::sampler::{Sampler, SamplerPolicy};
use netwatch::worker::{LatestUpdate, WorkerConfig, WorkerDeps, spawn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, timeout};

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_millis: 20,
        stats_log_interval_secs: 3600,
        failure_warn_threshold: 3,
    }
}

struct Harness {
    provider: FakeProvider,
    rx: broadcast::Receiver<PushEvent>,
    latest: LatestUpdate,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<Sampler<FakeProvider, RecordingSink>>,
    sink: RecordingSink,
}

fn start(configure: impl FnOnce(&mut FakeState)) -> Harness {
    let provider = FakeProvider::new();
    provider.set(|s| {
        s.clock_step_millis = 1000;
        configure(s);
    });
    let sink = RecordingSink::new();
    let sampler = Sampler::new(provider.clone(), sink.clone(), SamplerPolicy::default());
    let (tx, rx) = broadcast::channel(64);
    let latest: LatestUpdate = Arc::new(RwLock::new(None));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = spawn(
        WorkerDeps {
            sampler,
            tx,
            latest: latest.clone(),
            ws_clients: Arc::new(AtomicUsize::new(0)),
            alerts_total: Arc::new(AtomicU64::new(0)),
            shutdown_rx,
        },
        worker_config(),
    );
    Harness {
        provider,
        rx,
        latest,
        shutdown_tx,
        handle,
        sink,
    }
}

#[tokio::test]
async fn worker_broadcasts_updates_and_hands_back_sampler() {
    let mut h = start(|s| {
        s.rx = 1000;
        s.tx = 1000;
        s.connections = vec![established(Some("chrome"), "93.184.216.34", 443)];
    });

    let first = timeout(Duration::from_secs(3), h.rx.recv())
        .await
        .expect("first update in time")
        .expect("channel open");
    match first {
        PushEvent::Update(update) => {
            assert_eq!(update.rx_sec, 0.0);
            assert_eq!(update.connections.len(), 1);
        }
        other => panic!("expected update, got {:?}", other),
    }
    assert!(h.latest.read().await.is_some());

    let _ = h.shutdown_tx.send(());
    let sampler = h.handle.await.unwrap();
    assert!(sampler.is_warmed_up());
    assert!(sampler.known_apps().contains("chrome"));
    assert!(h.sink.take().is_empty());
}

#[tokio::test]
async fn worker_alert_reaches_sink_after_warm_up() {
    let mut h = start(|_| {});
    timeout(Duration::from_secs(3), h.rx.recv())
        .await
        .expect("warm-up update in time")
        .expect("channel open");

    h.provider
        .set(|s| s.connections = vec![established(Some("curl"), "151.101.1.69", 443)]);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    let mut alerts = Vec::new();
    while alerts.is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for alert"
        );
        let _ = timeout(Duration::from_millis(200), h.rx.recv()).await;
        alerts = h.sink.take();
    }
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::NewApp);

    let _ = h.shutdown_tx.send(());
    h.handle.await.unwrap();
}

#[tokio::test]
async fn failing_provider_produces_no_updates() {
    let mut h = start(|s| s.fail_connections = true);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(matches!(
        h.rx.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
    assert!(h.latest.read().await.is_none());

    let _ = h.shutdown_tx.send(());
    let sampler = h.handle.await.unwrap();
    assert!(!sampler.is_warmed_up());
}
