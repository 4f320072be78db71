// Events pushed to subscribers: per-sample updates and alerts

use serde::{Deserialize, Serialize};

use super::ConnectionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "New App")]
    NewApp,
    #[serde(rename = "New Host")]
    NewHost,
    #[serde(rename = "DNS Change")]
    DnsChange,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NewApp => "New App",
            AlertKind::NewHost => "New Host",
            AlertKind::DnsChange => "DNS Change",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot alert; serializes as `{"type": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new_app(app: &str) -> Self {
        Self {
            kind: AlertKind::NewApp,
            message: format!("First network activity detected for: {}", app),
        }
    }

    pub fn new_host(addr: &str) -> Self {
        Self {
            kind: AlertKind::NewHost,
            message: format!("First connection to remote host: {}", addr),
        }
    }

    pub fn dns_change<S: AsRef<str>>(servers: &[S]) -> Self {
        let list: Vec<&str> = servers.iter().map(AsRef::as_ref).collect();
        Self {
            kind: AlertKind::DnsChange,
            message: format!("DNS Servers changed to: {}", list.join(", ")),
        }
    }
}

/// Result of one successful sample. Field names are part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkUpdate {
    pub rx_sec: f64,
    pub tx_sec: f64,
    pub connections: Vec<ConnectionRecord>,
}

/// Static service identity sent to each WebSocket client on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub poll_interval_millis: u64,
}

/// Envelope for everything on the push channel: `{"event": "update" | "alert" | "info", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum PushEvent {
    Info(ServiceInfo),
    Update(NetworkUpdate),
    Alert(Alert),
}
