//! Closest-record lookups issued as independent blocking tasks.
//!
//! A lookup starts running as soon as it is spawned; the returned
//! [`PendingLookup`] is awaited only where its value is consumed, so several
//! lookups against the same store proceed in parallel.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::trace;
use tvl_core::{BucketKey, Lookup};
use tvl_state::{StateResult, TvlStore};

use crate::error::IngestResult;

/// What a lookup searches for inside a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Newest record.
    Latest,
    /// Greatest timestamp `<= timestamp`, or nearest within `tolerance`.
    Closest {
        timestamp: u64,
        tolerance: Option<u64>,
    },
}

/// An in-flight lookup.
pub struct PendingLookup {
    key: BucketKey,
    target: Target,
    handle: JoinHandle<StateResult<Lookup>>,
}

impl PendingLookup {
    /// Start a lookup on the blocking pool.
    pub fn spawn<S: TvlStore>(store: &Arc<S>, key: BucketKey, target: Target) -> Self {
        let store = Arc::clone(store);
        let task_key = key.clone();
        let handle = tokio::task::spawn_blocking(move || match target {
            Target::Latest => store.latest(&task_key),
            Target::Closest {
                timestamp,
                tolerance,
            } => store.find_closest(&task_key, timestamp, tolerance),
        });
        Self {
            key,
            target,
            handle,
        }
    }

    /// Wait for the lookup to finish.
    pub async fn resolve(self) -> IngestResult<Lookup> {
        let lookup = self.handle.await??;
        trace!(
            key = %self.key,
            target = ?self.target,
            found = ?lookup.timestamp(),
            "lookup resolved"
        );
        Ok(lookup)
    }
}

/// Find the record closest to `target` in one step.
pub async fn find_closest<S: TvlStore>(
    store: &Arc<S>,
    key: BucketKey,
    target: u64,
    tolerance: Option<u64>,
) -> IngestResult<Lookup> {
    PendingLookup::spawn(
        store,
        key,
        Target::Closest {
            timestamp: target,
            tolerance,
        },
    )
    .resolve()
    .await
}
