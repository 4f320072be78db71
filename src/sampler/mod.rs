// Telemetry sampler: turns consecutive provider snapshots into rates, a connection list and
// one-shot alerts. One owned instance per process; `sample` takes `&mut self` so cycles never
// interleave.

mod dns;
mod error;
mod identity;
mod rate;
mod sink;

pub use dns::DnsState;
pub use error::SampleError;
pub use identity::{IdentitySet, is_excluded_host};
pub use sink::{AlertSink, BroadcastAlertSink};

use std::time::Duration;
use tracing::instrument;

use crate::models::{
    Alert, ConnectionRecord, ConnectionState, CounterReading, CounterSnapshot, InterfaceConfig,
    NetworkUpdate, RateResult, RawConnection,
};
use crate::provider::SystemInfoProvider;

/// Remote address prefixes never considered for new-host detection.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 3] = ["127.", "10.", "192.168."];

/// Upper bound for one cycle's provider fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct SamplerPolicy {
    pub excluded_prefixes: Vec<String>,
    /// Emit `NewHost` for first-seen remote hosts. When false they are only recorded.
    pub alert_on_new_host: bool,
    pub fetch_timeout: Duration,
}

impl Default for SamplerPolicy {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            alert_on_new_host: false,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

pub struct Sampler<P, S> {
    provider: P,
    sink: S,
    policy: SamplerPolicy,
    /// Previous counters; `None` until the first successful sample (warm-up).
    baseline: Option<CounterSnapshot>,
    known_apps: IdentitySet,
    known_hosts: IdentitySet,
    dns: DnsState,
}

impl<P, S> Sampler<P, S>
where
    P: SystemInfoProvider,
    S: AlertSink,
{
    pub fn new(provider: P, sink: S, policy: SamplerPolicy) -> Self {
        Self {
            provider,
            sink,
            policy,
            baseline: None,
            known_apps: IdentitySet::new(),
            known_hosts: IdentitySet::new(),
            dns: DnsState::new(),
        }
    }

    /// One cycle: fetch, diff against the baselines, push alerts to the sink, return the update.
    ///
    /// Fetch failures, timeouts and malformed counters leave every baseline untouched. A
    /// degenerate timestamp advances the counter baseline only and skips the rest of the cycle.
    #[instrument(skip(self), fields(operation = "sample"))]
    pub async fn sample(&mut self) -> Result<NetworkUpdate, SampleError> {
        let (reading, connections, interfaces) = self.fetch().await?;
        let current = rate::snapshot_from_reading(&reading)?;

        let warm_up = self.baseline.is_none();
        let rates = match self.baseline {
            None => Ok(RateResult::ZERO),
            Some(prev) => rate::compute_rate(&prev, &current),
        };
        if rates.is_ok() || rates.as_ref().is_err_and(SampleError::is_degenerate_timing) {
            self.baseline = Some(current);
        }
        let rates = rates?;

        let mut alerts = Vec::new();
        let connections = self.classify(connections, warm_up, &mut alerts);
        let servers = DnsState::servers_in(&interfaces);
        alerts.extend(self.dns.observe(servers, warm_up));

        for alert in alerts {
            self.sink.emit(alert);
        }

        Ok(NetworkUpdate {
            rx_sec: rates.rx_bytes_per_sec,
            tx_sec: rates.tx_bytes_per_sec,
            connections,
        })
    }

    async fn fetch(
        &self,
    ) -> Result<(CounterReading, Vec<RawConnection>, Vec<InterfaceConfig>), SampleError> {
        let provider = &self.provider;
        let all = async {
            tokio::try_join!(
                async {
                    provider
                        .current_counters()
                        .await
                        .map_err(|e| SampleError::provider("current_counters", e))
                },
                async {
                    provider
                        .current_connections()
                        .await
                        .map_err(|e| SampleError::provider("current_connections", e))
                },
                async {
                    provider
                        .current_interfaces()
                        .await
                        .map_err(|e| SampleError::provider("current_interfaces", e))
                },
            )
        };
        match tokio::time::timeout(self.policy.fetch_timeout, all).await {
            Ok(result) => result,
            Err(_) => Err(SampleError::ProviderUnavailable {
                operation: "fetch",
                reason: format!(
                    "timed out after {} ms",
                    self.policy.fetch_timeout.as_millis()
                ),
            }),
        }
    }

    /// Keeps established connections and records their apps and remote hosts.
    fn classify(
        &mut self,
        connections: Vec<RawConnection>,
        warm_up: bool,
        alerts: &mut Vec<Alert>,
    ) -> Vec<ConnectionRecord> {
        let mut records = Vec::new();
        for raw in connections {
            if raw.state != ConnectionState::Established {
                continue;
            }
            let record = ConnectionRecord::from_raw(raw);

            if record.has_known_process() && self.known_apps.observe(&record.process_name, warm_up)
            {
                alerts.push(Alert::new_app(&record.process_name));
            }

            if let Some(addr) = record.peer_address.as_deref()
                && !is_excluded_host(addr, &self.policy.excluded_prefixes)
                && self.known_hosts.observe(addr, warm_up)
            {
                if self.policy.alert_on_new_host {
                    alerts.push(Alert::new_host(addr));
                } else {
                    tracing::debug!(host = addr, "new remote host recorded");
                }
            }

            records.push(record);
        }
        records
    }

    pub fn is_warmed_up(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<&CounterSnapshot> {
        self.baseline.as_ref()
    }

    pub fn known_apps(&self) -> &IdentitySet {
        &self.known_apps
    }

    pub fn known_hosts(&self) -> &IdentitySet {
        &self.known_hosts
    }

    pub fn dns(&self) -> &DnsState {
        &self.dns
    }
}
