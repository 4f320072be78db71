// System information capability consumed by the sampler.

use std::future::Future;

use crate::models::{CounterReading, InterfaceConfig, RawConnection};

/// Source of the three raw snapshots one sample cycle needs.
///
/// Calls are independent and may run concurrently. Any of them may fail (permission error,
/// platform unsupported, ...); the sampler treats a failure of any one as a failed cycle.
pub trait SystemInfoProvider: Send + Sync {
    /// Cumulative per-interface byte counters, stamped with the wall-clock time of the read.
    fn current_counters(&self) -> impl Future<Output = anyhow::Result<CounterReading>> + Send;

    /// Every socket connection the host currently knows about, in any state.
    fn current_connections(
        &self,
    ) -> impl Future<Output = anyhow::Result<Vec<RawConnection>>> + Send;

    /// Interface configuration, including the DNS servers in effect for each interface.
    fn current_interfaces(
        &self,
    ) -> impl Future<Output = anyhow::Result<Vec<InterfaceConfig>>> + Send;
}
