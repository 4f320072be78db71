// Counter totals and throughput between two snapshots

use super::SampleError;
use crate::models::{CounterReading, CounterSnapshot, RateResult};

/// Sums per-interface counters into host totals.
pub(crate) fn snapshot_from_reading(
    reading: &CounterReading,
) -> Result<CounterSnapshot, SampleError> {
    if reading.interfaces.is_empty() {
        return Err(SampleError::MalformedSnapshot(
            "no interface counters reported".into(),
        ));
    }
    let mut total_rx: u64 = 0;
    let mut total_tx: u64 = 0;
    for iface in &reading.interfaces {
        total_rx = total_rx.checked_add(iface.rx_bytes).ok_or_else(|| {
            SampleError::MalformedSnapshot(format!("rx counter overflow at {}", iface.name))
        })?;
        total_tx = total_tx.checked_add(iface.tx_bytes).ok_or_else(|| {
            SampleError::MalformedSnapshot(format!("tx counter overflow at {}", iface.name))
        })?;
    }
    Ok(CounterSnapshot {
        total_rx_bytes: total_rx,
        total_tx_bytes: total_tx,
        taken_at_millis: reading.taken_at_millis,
    })
}

/// Bytes per second from `prev` to `current`, floored at zero so a counter reset reads as idle.
pub(crate) fn compute_rate(
    prev: &CounterSnapshot,
    current: &CounterSnapshot,
) -> Result<RateResult, SampleError> {
    let elapsed_ms = i64::try_from(
        i128::from(current.taken_at_millis) - i128::from(prev.taken_at_millis),
    )
    .map_err(|_| {
        SampleError::MalformedSnapshot(format!(
            "timestamp gap out of range: {} -> {} ms",
            prev.taken_at_millis, current.taken_at_millis
        ))
    })?;
    if elapsed_ms <= 0 {
        return Err(SampleError::DegenerateTiming { elapsed_ms });
    }
    let dt_secs = elapsed_ms as f64 / 1000.0;
    let rx = (current.total_rx_bytes as f64 - prev.total_rx_bytes as f64) / dt_secs;
    let tx = (current.total_tx_bytes as f64 - prev.total_tx_bytes as f64) / dt_secs;
    Ok(RateResult {
        rx_bytes_per_sec: rx.max(0.0),
        tx_bytes_per_sec: tx.max(0.0),
    })
}
