// Socket connection models

use serde::{Deserialize, Serialize};

/// Process name used when a connection cannot be attributed to a process.
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// TCP connection state; serializes the way netstat prints it (e.g. "ESTABLISHED").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    #[serde(other)]
    Unknown,
}

/// A connection as listed by the provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConnection {
    pub state: ConnectionState,
    pub process: Option<String>,
    pub pid: Option<u32>,
    pub peer_address: Option<String>,
    pub peer_port: Option<u16>,
}

/// An established connection as pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub process_name: String,
    pub pid: Option<u32>,
    pub peer_address: Option<String>,
    pub peer_port: Option<u16>,
    pub state: ConnectionState,
}

impl ConnectionRecord {
    /// Builds a record, resolving a missing or blank process name to [`UNKNOWN_PROCESS`].
    pub fn from_raw(raw: RawConnection) -> Self {
        let process_name = raw
            .process
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_PROCESS.into());
        Self {
            process_name,
            pid: raw.pid,
            peer_address: raw.peer_address.filter(|a| !a.is_empty()),
            peer_port: raw.peer_port,
            state: raw.state,
        }
    }

    pub fn has_known_process(&self) -> bool {
        self.process_name != UNKNOWN_PROCESS
    }
}
