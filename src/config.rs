use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::sampler::{DEFAULT_EXCLUDED_PREFIXES, SamplerPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 0 binds an ephemeral port; the bound address is logged at startup.
    pub port: u16,
    pub host: String,
    /// Directory served for every non-API path (e.g. a dashboard build). Unset: plain banner at `/`.
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of events kept in the broadcast channel for /ws/network (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub poll_interval_millis: u64,
    /// Bound on one cycle's provider fetches; a hung fetch counts as a failed sample.
    pub sample_timeout_ms: u64,
    /// How often to log app stats (ws clients, samples, alerts) at INFO level.
    pub stats_log_interval_secs: u64,
    /// Consecutive failed samples before a WARN about the provider being down.
    pub failure_warn_threshold: u32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval_millis: 2000,
            sample_timeout_ms: 1500,
            stats_log_interval_secs: 60,
            failure_warn_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Remote address prefixes skipped by new-host detection.
    pub excluded_prefixes: Vec<String>,
    pub alert_on_new_host: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            alert_on_new_host: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn sampler_policy(&self) -> SamplerPolicy {
        SamplerPolicy {
            excluded_prefixes: self.alerts.excluded_prefixes.clone(),
            alert_on_new_host: self.alerts.alert_on_new_host,
            fetch_timeout: Duration::from_millis(self.monitoring.sample_timeout_ms),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        if let Some(dir) = &self.server.static_dir {
            anyhow::ensure!(!dir.is_empty(), "server.static_dir must be non-empty when set");
        }
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.poll_interval_millis > 0,
            "monitoring.poll_interval_millis must be > 0, got {}",
            self.monitoring.poll_interval_millis
        );
        anyhow::ensure!(
            self.monitoring.sample_timeout_ms > 0,
            "monitoring.sample_timeout_ms must be > 0, got {}",
            self.monitoring.sample_timeout_ms
        );
        anyhow::ensure!(
            self.monitoring.sample_timeout_ms <= self.monitoring.poll_interval_millis,
            "monitoring.sample_timeout_ms ({}) must not exceed monitoring.poll_interval_millis ({})",
            self.monitoring.sample_timeout_ms,
            self.monitoring.poll_interval_millis
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.failure_warn_threshold > 0,
            "monitoring.failure_warn_threshold must be > 0, got {}",
            self.monitoring.failure_warn_threshold
        );
        anyhow::ensure!(
            self.alerts.excluded_prefixes.iter().all(|p| !p.is_empty()),
            "alerts.excluded_prefixes must not contain empty entries"
        );
        Ok(())
    }
}
