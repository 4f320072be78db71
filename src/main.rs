use anyhow::Result;
use netwatch::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (tx, _) =
        broadcast::channel::<models::PushEvent>(app_config.publishing.broadcast_capacity);

    let sink = sampler::BroadcastAlertSink::new(tx.clone());
    let alerts_total = sink.alerts_total();
    let sampler = sampler::Sampler::new(
        sysinfo_repo::SysinfoRepo::new(),
        sink,
        app_config.sampler_policy(),
    );

    let latest: worker::LatestUpdate = Arc::new(RwLock::new(None));
    let ws_clients = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            sampler,
            tx: tx.clone(),
            latest: latest.clone(),
            ws_clients: ws_clients.clone(),
            alerts_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            poll_interval_millis: app_config.monitoring.poll_interval_millis,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
            failure_warn_threshold: app_config.monitoring.failure_warn_threshold,
        },
    );

    let app = routes::app(tx, latest, ws_clients, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            if let Ok(sampler) = worker_handle.await {
                tracing::info!(
                    known_apps = sampler.known_apps().len(),
                    known_hosts = sampler.known_hosts().len(),
                    "Worker stopped"
                );
            }
        }
    }

    Ok(())
}
