// Why a sample cycle produced no update

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// A provider fetch failed or timed out. Nothing was mutated.
    #[error("provider unavailable ({operation}): {reason}")]
    ProviderUnavailable {
        operation: &'static str,
        reason: String,
    },
    /// No time (or negative time) elapsed since the previous counters. Only the counter
    /// baseline advanced.
    #[error("degenerate timing: {elapsed_ms} ms since previous sample")]
    DegenerateTiming { elapsed_ms: i64 },
    /// The provider answered with data that cannot be interpreted. Nothing was mutated.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl SampleError {
    pub(crate) fn provider(operation: &'static str, err: anyhow::Error) -> Self {
        SampleError::ProviderUnavailable {
            operation,
            reason: format!("{:#}", err),
        }
    }

    pub fn is_degenerate_timing(&self) -> bool {
        matches!(self, SampleError::DegenerateTiming { .. })
    }
}
