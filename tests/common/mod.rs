// Shared test helpers: scripted provider and recording alert sink

#![allow(dead_code)]

use netwatch::models::*;
use netwatch::provider::SystemInfoProvider;
use netwatch::sampler::{AlertSink, Sampler, SamplerPolicy};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake provider reports on the next fetch.
#[derive(Debug, Default)]
pub struct FakeState {
    pub rx: u64,
    pub tx: u64,
    pub at_millis: u64,
    /// Added to `at_millis` after every counter read (0 = frozen clock).
    pub clock_step_millis: u64,
    pub no_interfaces: bool,
    pub connections: Vec<RawConnection>,
    pub dns: Vec<String>,
    pub fail_counters: bool,
    pub fail_connections: bool,
    pub fail_interfaces: bool,
    pub delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn delay(&self) -> Option<Duration> {
        self.state.lock().unwrap().delay
    }
}

impl SystemInfoProvider for FakeProvider {
    async fn current_counters(&self) -> anyhow::Result<CounterReading> {
        if let Some(d) = self.delay() {
            tokio::time::sleep(d).await;
        }
        let mut s = self.state.lock().unwrap();
        if s.fail_counters {
            anyhow::bail!("counters unavailable");
        }
        let interfaces = if s.no_interfaces {
            vec![]
        } else {
            vec![InterfaceCounters {
                name: "eth0".into(),
                rx_bytes: s.rx,
                tx_bytes: s.tx,
            }]
        };
        let reading = CounterReading {
            interfaces,
            taken_at_millis: s.at_millis,
        };
        let step = s.clock_step_millis;
        s.at_millis += step;
        Ok(reading)
    }

    async fn current_connections(&self) -> anyhow::Result<Vec<RawConnection>> {
        if let Some(d) = self.delay() {
            tokio::time::sleep(d).await;
        }
        let s = self.state.lock().unwrap();
        if s.fail_connections {
            anyhow::bail!("permission denied");
        }
        Ok(s.connections.clone())
    }

    async fn current_interfaces(&self) -> anyhow::Result<Vec<InterfaceConfig>> {
        if let Some(d) = self.delay() {
            tokio::time::sleep(d).await;
        }
        let s = self.state.lock().unwrap();
        if s.fail_interfaces {
            anyhow::bail!("interfaces unavailable");
        }
        Ok(vec![InterfaceConfig {
            name: "eth0".into(),
            mac_address: "00:11:22:33:44:55".into(),
            addresses: vec!["192.168.1.10".into()],
            dns_servers: s.dns.clone(),
        }])
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything emitted so far.
    pub fn take(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.alerts.lock().unwrap())
    }
}

impl AlertSink for RecordingSink {
    fn emit(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

pub fn established(process: Option<&str>, peer: &str, port: u16) -> RawConnection {
    RawConnection {
        state: ConnectionState::Established,
        process: process.map(str::to_string),
        pid: process.map(|_| 4242),
        peer_address: Some(peer.to_string()),
        peer_port: Some(port),
    }
}

pub fn listening(process: &str, port: u16) -> RawConnection {
    RawConnection {
        state: ConnectionState::Listen,
        process: Some(process.to_string()),
        pid: Some(1),
        peer_address: None,
        peer_port: Some(port),
    }
}

pub fn dns(servers: &[&str]) -> Vec<String> {
    servers.iter().map(|s| s.to_string()).collect()
}

pub fn test_sampler(
    policy: SamplerPolicy,
) -> (Sampler<FakeProvider, RecordingSink>, FakeProvider, RecordingSink) {
    let provider = FakeProvider::new();
    let sink = RecordingSink::new();
    let sampler = Sampler::new(provider.clone(), sink.clone(), policy);
    (sampler, provider, sink)
}
