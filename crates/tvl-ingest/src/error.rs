//! Ingestion error types.

use thiserror::Error;

/// Errors that can occur while storing a new TVL value.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A jump confirmed against two independent baselines. The caller is
    /// expected to stop ingesting the protocol.
    #[error("TVL for {protocol} has {factor}x ({change}) within one hour, disabling it")]
    SpikeRejected {
        protocol: String,
        factor: f64,
        change: String,
    },

    #[error("state store error: {0}")]
    State(#[from] tvl_state::StateError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    pub fn is_fatal_anomaly(&self) -> bool {
        matches!(self, IngestError::SpikeRejected { .. })
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
