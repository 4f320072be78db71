// Network interface counter and configuration models

use serde::{Deserialize, Serialize};

/// Cumulative byte counters for one interface, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One counter fetch: per-interface counters plus the wall-clock time they were read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReading {
    pub interfaces: Vec<InterfaceCounters>,
    pub taken_at_millis: u64,
}

/// Host-wide totals summed over every interface in a [`CounterReading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub total_rx_bytes: u64,
    pub total_tx_bytes: u64,
    pub taken_at_millis: u64,
}

/// Throughput derived from two consecutive counter snapshots. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResult {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

impl RateResult {
    pub const ZERO: RateResult = RateResult {
        rx_bytes_per_sec: 0.0,
        tx_bytes_per_sec: 0.0,
    };
}

/// Interface configuration relevant to the sampler (addresses and resolvers in effect).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceConfig {
    pub name: String,
    pub mac_address: String,
    pub addresses: Vec<String>,
    pub dns_servers: Vec<String>,
}
