// Domain models: counters, connections, interface config, push events

mod connection;
mod event;
mod network;

pub use connection::{ConnectionRecord, ConnectionState, RawConnection, UNKNOWN_PROCESS};
pub use event::{Alert, AlertKind, NetworkUpdate, PushEvent, ServiceInfo};
pub use network::{
    CounterReading, CounterSnapshot, InterfaceConfig, InterfaceCounters, RateResult,
};
