//! StateStore — redb-backed persistence for TVL bucket records.
//!
//! Implements [`TvlStore`] over the `tvl_records` table and keeps the
//! disabled-protocol registry. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;
use tvl_core::{BucketKey, BucketRecord, DisabledProtocol, Lookup};

use crate::client::TvlStore;
use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RECORDS).map_err(map_err!(Table))?;
        txn.open_table(DISABLED).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Disabled registry ──────────────────────────────────────────

    /// Mark a protocol as disabled, replacing any earlier entry.
    pub fn disable(&self, entry: &DisabledProtocol) -> StateResult<()> {
        let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DISABLED).map_err(map_err!(Table))?;
            table
                .insert(entry.protocol_id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(protocol_id = %entry.protocol_id, "protocol disabled");
        Ok(())
    }

    /// Get the disabled entry for a protocol, if any.
    pub fn get_disabled(&self, protocol_id: &str) -> StateResult<Option<DisabledProtocol>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DISABLED).map_err(map_err!(Table))?;
        match table.get(protocol_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let entry: DisabledProtocol =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// List all disabled protocols.
    pub fn list_disabled(&self) -> StateResult<Vec<DisabledProtocol>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DISABLED).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let disabled: DisabledProtocol =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(disabled);
        }
        Ok(results)
    }

    /// Re-enable a protocol. Returns true if it was disabled.
    pub fn enable(&self, protocol_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(DISABLED).map_err(map_err!(Table))?;
            existed = table.remove(protocol_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%protocol_id, existed, "protocol enabled");
        Ok(existed)
    }
}

impl TvlStore for StateStore {
    fn latest(&self, key: &BucketKey) -> StateResult<Lookup> {
        self.find_closest(key, u64::MAX, None)
    }

    fn find_closest(
        &self,
        key: &BucketKey,
        target: u64,
        tolerance: Option<u64>,
    ) -> StateResult<Lookup> {
        let partition = key.partition();
        let p = partition.as_str();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;

        let (lo, hi) = match tolerance {
            Some(tol) => (target.saturating_sub(tol), target.saturating_add(tol)),
            None => (0u64, target),
        };
        let mut range = table.range((p, lo)..=(p, hi)).map_err(map_err!(Read))?;

        let best = match tolerance {
            None => match range.next_back() {
                Some(entry) => {
                    let (k, value) = entry.map_err(map_err!(Read))?;
                    return Ok(Lookup::Found(decode(p, k.value().1, value.value())?));
                }
                None => None,
            },
            Some(_) => {
                let mut timestamps = Vec::new();
                for entry in range {
                    let (k, _) = entry.map_err(map_err!(Read))?;
                    timestamps.push(k.value().1);
                }
                pick_closest(timestamps, target)
            }
        };

        let Some(timestamp) = best else {
            return Ok(Lookup::NotFound);
        };
        match table.get((p, timestamp)).map_err(map_err!(Read))? {
            Some(guard) => Ok(Lookup::Found(decode(p, timestamp, guard.value())?)),
            None => Ok(Lookup::NotFound),
        }
    }

    fn get(&self, key: &BucketKey, timestamp: u64) -> StateResult<Option<BucketRecord>> {
        let partition = key.partition();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
        match table
            .get((partition.as_str(), timestamp))
            .map_err(map_err!(Read))?
        {
            Some(guard) => Ok(Some(decode(&partition, timestamp, guard.value())?)),
            None => Ok(None),
        }
    }

    fn list(&self, key: &BucketKey, limit: usize) -> StateResult<Vec<BucketRecord>> {
        let partition = key.partition();
        let p = partition.as_str();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range((p, 0u64)..=(p, u64::MAX))
            .map_err(map_err!(Read))?
            .rev()
            .take(limit)
        {
            let (k, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(p, k.value().1, value.value())?);
        }
        Ok(results)
    }

    fn put(&self, key: &BucketKey, record: &BucketRecord) -> StateResult<()> {
        let partition = key.partition();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
            table
                .insert((partition.as_str(), record.timestamp), value.as_slice())
                .map_err(|e| record_write_error(&partition, record.timestamp, e))?;
        }
        txn.commit().map_err(|e| record_write_error(&partition, record.timestamp, e))?;
        debug!(%partition, timestamp = record.timestamp, "bucket record stored");
        Ok(())
    }
}

fn record_write_error(partition: &str, timestamp: u64, e: impl std::fmt::Display) -> StateError {
    StateError::RecordWrite {
        partition: partition.to_string(),
        timestamp,
        message: e.to_string(),
    }
}

fn decode(partition: &str, timestamp: u64, bytes: &[u8]) -> StateResult<BucketRecord> {
    serde_json::from_slice(bytes).map_err(|e| StateError::CorruptRecord {
        partition: partition.to_string(),
        timestamp,
        message: e.to_string(),
    })
}

/// Pick the timestamp nearest to `target`. On equal distance the earlier
/// timestamp wins, given ascending input.
pub fn pick_closest(timestamps: impl IntoIterator<Item = u64>, target: u64) -> Option<u64> {
    let mut best: Option<(u64, u64)> = None;
    for ts in timestamps {
        let distance = ts.abs_diff(target);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((ts, distance)),
        }
    }
    best.map(|(ts, _)| ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvl_core::{PreviousTvl, TvlMeasurement};

    fn record(timestamp: u64, tvl: f64) -> BucketRecord {
        BucketRecord::new(timestamp, TvlMeasurement::new(tvl))
    }

    fn seeded(key: &BucketKey, points: &[(u64, f64)]) -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        for &(ts, tvl) in points {
            store.put(key, &record(ts, tvl)).unwrap();
        }
        store
    }

    // ── Closest lookups ────────────────────────────────────────────

    #[test]
    fn latest_returns_newest_record() {
        let key = BucketKey::hourly("aave");
        let store = seeded(&key, &[(1000, 1.0), (5000, 5.0), (3000, 3.0)]);

        assert_eq!(store.latest(&key).unwrap().timestamp(), Some(5000));
    }

    #[test]
    fn latest_on_empty_partition_is_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        assert_eq!(store.latest(&BucketKey::hourly("nope")).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn closest_without_tolerance_is_at_or_before_target() {
        let key = BucketKey::hourly("aave");
        let store = seeded(&key, &[(1000, 1.0), (2000, 2.0), (3000, 3.0)]);

        assert_eq!(store.find_closest(&key, 2999, None).unwrap().timestamp(), Some(2000));
        assert_eq!(store.find_closest(&key, 3000, None).unwrap().timestamp(), Some(3000));
        assert_eq!(store.find_closest(&key, 999, None).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn closest_with_tolerance_prefers_nearest_either_side() {
        let key = BucketKey::daily("aave");
        let store = seeded(&key, &[(1000, 1.0), (2100, 2.0), (5000, 5.0)]);

        // 2100 is 100 after, 1000 is 1000 before.
        let found = store.find_closest(&key, 2000, Some(1500)).unwrap();
        assert_eq!(found.timestamp(), Some(2100));
        assert_eq!(found.total(), 2.0);

        // Nothing within 100s of 4000.
        assert_eq!(store.find_closest(&key, 4000, Some(100)).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn closest_with_tolerance_tie_goes_to_earlier() {
        let key = BucketKey::daily("aave");
        let store = seeded(&key, &[(1000, 1.0), (3000, 3.0)]);

        assert_eq!(store.find_closest(&key, 2000, Some(1000)).unwrap().timestamp(), Some(1000));
    }

    #[test]
    fn tolerance_window_saturates_at_zero() {
        let key = BucketKey::daily("aave");
        let store = seeded(&key, &[(10, 1.0)]);

        assert_eq!(store.find_closest(&key, 50, Some(100)).unwrap().timestamp(), Some(10));
    }

    #[test]
    fn partitions_are_isolated() {
        let store = StateStore::open_in_memory().unwrap();
        store.put(&BucketKey::hourly("aave"), &record(1000, 1.0)).unwrap();
        store.put(&BucketKey::daily("aave"), &record(2000, 2.0)).unwrap();
        store.put(&BucketKey::hourly("aave-v2"), &record(3000, 3.0)).unwrap();

        assert_eq!(store.latest(&BucketKey::hourly("aave")).unwrap().timestamp(), Some(1000));
        assert_eq!(store.latest(&BucketKey::daily("aave")).unwrap().timestamp(), Some(2000));
        assert_eq!(store.latest(&BucketKey::daily("aave-v2")).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn pick_closest_edge_cases() {
        assert_eq!(pick_closest([], 10), None);
        assert_eq!(pick_closest([7], 10), Some(7));
        assert_eq!(pick_closest([5, 15], 10), Some(5));
        assert_eq!(pick_closest([5, 14], 10), Some(14));
    }

    // ── Put / get ──────────────────────────────────────────────────

    #[test]
    fn put_and_get_by_exact_timestamp() {
        let key = BucketKey::hourly("aave");
        let store = StateStore::open_in_memory().unwrap();
        let rec = BucketRecord {
            timestamp: 7200,
            tvl: TvlMeasurement::new(250.0).with_entry("ethereum", 200.0),
            previous: Some(PreviousTvl {
                prev_1_hour: 100.0,
                prev_1_day: 0.0,
                prev_1_week: 120.0,
            }),
        };

        store.put(&key, &rec).unwrap();

        assert_eq!(store.get(&key, 7200).unwrap(), Some(rec));
        assert_eq!(store.get(&key, 7201).unwrap(), None);
    }

    #[test]
    fn put_replaces_same_timestamp() {
        let key = BucketKey::daily("aave");
        let store = StateStore::open_in_memory().unwrap();
        store.put(&key, &record(86400, 1.0)).unwrap();
        store.put(&key, &record(86400, 2.0)).unwrap();

        assert_eq!(store.list(&key, 10).unwrap().len(), 1);
        assert_eq!(store.get(&key, 86400).unwrap().unwrap().tvl.total, 2.0);
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let key = BucketKey::hourly("aave");
        let store = seeded(&key, &[(1000, 1.0), (2000, 2.0), (3000, 3.0)]);

        let all: Vec<u64> = store.list(&key, 10).unwrap().iter().map(|r| r.timestamp).collect();
        assert_eq!(all, vec![3000, 2000, 1000]);
        assert_eq!(store.list(&key, 2).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_record_names_its_location() {
        let store = StateStore::open_in_memory().unwrap();
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(RECORDS).unwrap();
            table.insert(("hourlyTvl#aave", 1000u64), b"not json".as_slice()).unwrap();
        }
        txn.commit().unwrap();

        let err = store.get(&BucketKey::hourly("aave"), 1000).unwrap_err();
        match err {
            StateError::CorruptRecord {
                partition,
                timestamp,
                ..
            } => {
                assert_eq!(partition, "hourlyTvl#aave");
                assert_eq!(timestamp, 1000);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            store.latest(&BucketKey::hourly("aave")),
            Err(StateError::CorruptRecord { .. })
        ));
    }

    // ── Disabled registry ──────────────────────────────────────────

    #[test]
    fn disable_and_enable() {
        let store = StateStore::open_in_memory().unwrap();
        let entry = DisabledProtocol {
            protocol_id: "aave".to_string(),
            reason: "spike".to_string(),
            disabled_at: 1000,
        };

        store.disable(&entry).unwrap();
        assert_eq!(store.get_disabled("aave").unwrap(), Some(entry));
        assert_eq!(store.list_disabled().unwrap().len(), 1);

        assert!(store.enable("aave").unwrap());
        assert!(!store.enable("aave").unwrap());
        assert!(store.get_disabled("aave").unwrap().is_none());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");
        let key = BucketKey::hourly("aave");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put(&key, &record(3600, 42.0)).unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let latest = store.latest(&key).unwrap();
        assert_eq!(latest.total(), 42.0);
    }
}
