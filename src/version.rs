// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Service identity sent to clients on connect.
pub fn service_info(poll_interval_millis: u64) -> crate::models::ServiceInfo {
    crate::models::ServiceInfo {
        name: NAME.into(),
        version: VERSION.into(),
        poll_interval_millis,
    }
}
