//! Error types for the TVL record store.
//!
//! Bucket record failures name the partition and timestamp involved;
//! registry and database-level failures carry only the backend message.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    /// A bucket record could not be stored under `partition` at `timestamp`.
    #[error("failed to store {partition} at {timestamp}: {message}")]
    RecordWrite {
        partition: String,
        timestamp: u64,
        message: String,
    },

    /// The bytes stored under `partition` at `timestamp` are not a record.
    #[error("corrupt record in {partition} at {timestamp}: {message}")]
    CorruptRecord {
        partition: String,
        timestamp: u64,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}
