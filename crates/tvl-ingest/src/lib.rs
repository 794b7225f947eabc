//! tvl-ingest — validation and storage of freshly computed TVL values.
//!
//! Each call to [`Ingestor::store_new_tvl`] reads recent history for the
//! protocol, rejects or reports suspicious jumps, and writes the value into
//! the hourly bucket and, on the first write of a UTC day, the daily bucket.
//!
//! # Architecture
//!
//! ```text
//! Ingestor::store_new_tvl()
//!   ├── BaselineSelector::fire()   → six concurrent lookups (locator)
//!   ├── PendingBaselines::join()   ← join point
//!   ├── AnomalyGuard::check()      → accept / report / reject
//!   └── DualResolutionWriter       → hourly put ∥ daily put
//! ```

pub mod baseline;
pub mod error;
pub mod guard;
pub mod ingest;
pub mod locator;
pub mod report;
pub mod writer;

pub use baseline::{BaselineSelector, Baselines, PendingBaselines};
pub use error::{IngestError, IngestResult};
pub use guard::{AnomalyGuard, Verdict};
pub use ingest::Ingestor;
pub use locator::{PendingLookup, Target, find_closest};
pub use report::{AnomalyReporter, MemoryReporter, Report, TracingReporter};
pub use writer::{DualResolutionWriter, WritePlan};
