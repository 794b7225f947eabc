//! The store-client capability injected into the ingestion core.

use tvl_core::{BucketKey, BucketRecord, Lookup};

use crate::error::StateResult;

/// Read/write primitives over bucket partitions.
///
/// Calls are blocking; async callers run them on the blocking pool so that
/// independent lookups can proceed in parallel.
pub trait TvlStore: Send + Sync + 'static {
    /// Newest record of the partition.
    fn latest(&self, key: &BucketKey) -> StateResult<Lookup>;

    /// Record closest to `target`.
    ///
    /// Without `tolerance`, the record with the greatest timestamp that is
    /// `<= target`. With `tolerance`, the record within
    /// `[target - tolerance, target + tolerance]` nearest to `target`,
    /// the earlier one on a tie.
    fn find_closest(
        &self,
        key: &BucketKey,
        target: u64,
        tolerance: Option<u64>,
    ) -> StateResult<Lookup>;

    /// Record stored at exactly `timestamp`.
    fn get(&self, key: &BucketKey, timestamp: u64) -> StateResult<Option<BucketRecord>>;

    /// Up to `limit` records, newest first.
    fn list(&self, key: &BucketKey, limit: usize) -> StateResult<Vec<BucketRecord>>;

    /// Insert or replace the record at `record.timestamp`.
    fn put(&self, key: &BucketKey, record: &BucketRecord) -> StateResult<()>;
}
