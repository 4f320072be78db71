// Host network telemetry via sysinfo (counters, interfaces) and /proc (sockets)

mod linux;

use crate::models::{CounterReading, InterfaceConfig, InterfaceCounters, RawConnection};
use crate::provider::SystemInfoProvider;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use sysinfo::Networks;
use tracing::instrument;

pub struct SysinfoRepo {
    // Counters and interfaces are fetched concurrently, so each owns its own list.
    counter_networks: Arc<Mutex<Networks>>,
    interface_networks: Arc<Mutex<Networks>>,
    resolv_conf: PathBuf,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        Self::with_resolv_conf(linux::RESOLV_CONF)
    }

    /// Reads DNS servers from `path` instead of the system resolver config.
    pub fn with_resolv_conf(path: impl Into<PathBuf>) -> Self {
        Self {
            counter_networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            interface_networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            resolv_conf: path.into(),
        }
    }
}

/// Fails instead of waiting when a refresh abandoned by a timed-out fetch still holds the lock.
fn lock_networks(networks: &Mutex<Networks>) -> anyhow::Result<MutexGuard<'_, Networks>> {
    match networks.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => {
            anyhow::bail!("sysinfo networks busy: previous refresh still running")
        }
        Err(TryLockError::Poisoned(e)) => anyhow::bail!("sysinfo networks lock poisoned: {}", e),
    }
}

impl SystemInfoProvider for SysinfoRepo {
    /// Cumulative counters of every non-loopback interface.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "current_counters"))]
    async fn current_counters(&self) -> anyhow::Result<CounterReading> {
        let networks = self.counter_networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = lock_networks(&networks)?;
            networks_guard.refresh(true);
            let interfaces: Vec<InterfaceCounters> = networks_guard
                .list()
                .iter()
                .filter(|(_, data)| !data.ip_networks().iter().any(|n| n.addr.is_loopback()))
                .map(|(name, data)| InterfaceCounters {
                    name: name.clone(),
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                })
                .collect();
            let taken_at_millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .map_err(|e| anyhow::anyhow!("system time error: {}", e))?;
            Ok(CounterReading {
                interfaces,
                taken_at_millis,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "current_connections"))]
    async fn current_connections(&self) -> anyhow::Result<Vec<RawConnection>> {
        tokio::task::spawn_blocking(linux::list_connections)
            .await
            .map_err(|e| anyhow::anyhow!("procfs task join: {}", e))?
    }

    /// Interfaces with their addresses; resolvers are host-wide, so each carries the same list.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "current_interfaces"))]
    async fn current_interfaces(&self) -> anyhow::Result<Vec<InterfaceConfig>> {
        let networks = self.interface_networks.clone();
        let resolv_conf = self.resolv_conf.clone();
        tokio::task::spawn_blocking(move || {
            let dns_servers = linux::read_nameservers(&resolv_conf)?;
            let mut networks_guard = lock_networks(&networks)?;
            networks_guard.refresh(true);
            Ok(networks_guard
                .list()
                .iter()
                .map(|(name, data)| InterfaceConfig {
                    name: name.clone(),
                    mac_address: data.mac_address().to_string(),
                    addresses: data
                        .ip_networks()
                        .iter()
                        .map(|n| n.addr.to_string())
                        .collect(),
                    dns_servers: dns_servers.clone(),
                })
                .collect())
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_networks_lock_fails_fast() {
        let networks = Mutex::new(Networks::new());
        let held = networks.lock().unwrap();
        let err = lock_networks(&networks).unwrap_err();
        assert!(err.to_string().contains("busy"));
        drop(held);
        assert!(lock_networks(&networks).is_ok());
    }
}
