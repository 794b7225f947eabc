//! Dual-resolution writer — hourly record always, daily record on the first
//! write of a UTC day.
//!
//! The two puts are independent upserts. If one fails the other may still
//! land; a missing daily record is written by the next ingestion of the day
//! because the first-write check reads the daily bucket again.

use std::sync::Arc;

use tracing::debug;
use tvl_core::calendar::{same_day, start_of_day};
use tvl_core::{BucketKey, BucketRecord, Lookup, PreviousTvl, TvlMeasurement};
use tvl_state::TvlStore;

use crate::error::IngestResult;

/// Records to persist for one ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePlan {
    pub hourly: BucketRecord,
    pub daily: Option<BucketRecord>,
}

impl WritePlan {
    /// `prior_daily` must be the newest daily record at or before
    /// `timestamp`, as read before this ingestion started.
    pub fn new(
        timestamp: u64,
        tvl: &TvlMeasurement,
        previous: Option<PreviousTvl>,
        prior_daily: &Lookup,
    ) -> Self {
        let hourly = BucketRecord {
            timestamp,
            tvl: tvl.clone(),
            previous,
        };
        let first_of_day = prior_daily
            .timestamp()
            .is_none_or(|last| !same_day(last, timestamp));
        let daily = first_of_day
            .then(|| BucketRecord::new(start_of_day(timestamp), tvl.clone()));
        Self { hourly, daily }
    }
}

pub struct DualResolutionWriter<S> {
    store: Arc<S>,
}

impl<S: TvlStore> DualResolutionWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Issue both puts concurrently and wait for both.
    pub async fn commit(&self, protocol_id: &str, plan: WritePlan) -> IngestResult<()> {
        let hourly_key = BucketKey::hourly(protocol_id);
        let store = Arc::clone(&self.store);
        let hourly_record = plan.hourly;
        let hourly = tokio::task::spawn_blocking(move || store.put(&hourly_key, &hourly_record));

        let daily = plan.daily.map(|record| {
            let daily_key = BucketKey::daily(protocol_id);
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || store.put(&daily_key, &record))
        });
        let wrote_daily = daily.is_some();

        hourly.await??;
        if let Some(daily) = daily {
            daily.await??;
        }

        debug!(%protocol_id, wrote_daily, "tvl records committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvl_core::calendar::SECONDS_PER_DAY;
    use tvl_state::StateStore;

    // 2024-03-15T13:45:10Z
    const NOW: u64 = 1_710_510_310;

    fn daily_at(timestamp: u64) -> Lookup {
        Lookup::Found(BucketRecord::new(timestamp, TvlMeasurement::new(1.0)))
    }

    #[test]
    fn first_write_ever_includes_daily() {
        let plan = WritePlan::new(NOW, &TvlMeasurement::new(5.0), None, &Lookup::NotFound);
        let daily = plan.daily.unwrap();
        assert_eq!(daily.timestamp, start_of_day(NOW));
        assert_eq!(daily.tvl.total, 5.0);
        assert!(daily.previous.is_none());
    }

    #[test]
    fn new_day_includes_daily() {
        let yesterday = start_of_day(NOW) - SECONDS_PER_DAY;
        let plan = WritePlan::new(NOW, &TvlMeasurement::new(5.0), None, &daily_at(yesterday));
        assert!(plan.daily.is_some());
    }

    #[test]
    fn same_day_skips_daily() {
        let plan = WritePlan::new(
            NOW,
            &TvlMeasurement::new(5.0),
            None,
            &daily_at(start_of_day(NOW)),
        );
        assert!(plan.daily.is_none());
    }

    #[test]
    fn day_boundary_uses_calendar_not_elapsed_time() {
        // Last daily record one second before midnight: a new day.
        let midnight = start_of_day(NOW) + SECONDS_PER_DAY;
        let plan = WritePlan::new(
            midnight,
            &TvlMeasurement::new(5.0),
            None,
            &daily_at(midnight - 1),
        );
        assert!(plan.daily.is_some());
    }

    #[test]
    fn previous_fields_only_on_hourly() {
        let previous = PreviousTvl {
            prev_1_hour: 1.0,
            prev_1_day: 2.0,
            prev_1_week: 3.0,
        };
        let plan = WritePlan::new(
            NOW,
            &TvlMeasurement::new(5.0),
            Some(previous),
            &Lookup::NotFound,
        );
        assert_eq!(plan.hourly.previous, Some(previous));
        assert_eq!(plan.hourly.timestamp, NOW);
        assert!(plan.daily.unwrap().previous.is_none());
    }

    #[tokio::test]
    async fn commit_writes_both_buckets() {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        let writer = DualResolutionWriter::new(Arc::clone(&store));
        let tvl = TvlMeasurement::new(5.0).with_entry("ethereum", 5.0);

        writer
            .commit("aave", WritePlan::new(NOW, &tvl, None, &Lookup::NotFound))
            .await
            .unwrap();

        let hourly = store.get(&BucketKey::hourly("aave"), NOW).unwrap().unwrap();
        assert_eq!(hourly.tvl, tvl);
        let daily = store
            .get(&BucketKey::daily("aave"), start_of_day(NOW))
            .unwrap()
            .unwrap();
        assert_eq!(daily.tvl, tvl);
    }
}
