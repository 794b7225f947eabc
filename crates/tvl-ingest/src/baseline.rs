//! Baseline selection — the historical values an incoming TVL is judged
//! against and the derived previous-period fields stored with it.
//!
//! Six lookups are fired at once and joined before anything is consumed:
//!
//! | field          | partition | target               |
//! |----------------|-----------|----------------------|
//! | `last_hourly`  | hourly    | newest record        |
//! | `hourly_day`   | hourly    | `<= ts - 1 day`      |
//! | `hourly_week`  | hourly    | `<= ts - 1 week`     |
//! | `daily_day`    | daily     | `ts - 1 day ± tol`   |
//! | `daily_week`   | daily     | `ts - 1 week ± tol`  |
//! | `prior_daily`  | daily     | `<= ts`              |
//!
//! The daily-bucket values are a sanity check on the hourly ones: an hourly
//! baseline more than `discard_ratio` times its daily counterpart is most
//! likely an unreported spike and is stored as zero instead.

use std::sync::Arc;

use tvl_core::calendar::{SECONDS_PER_DAY, SECONDS_PER_WEEK};
use tvl_core::config::BaselineConfig;
use tvl_core::{BucketKey, Lookup, PreviousTvl};
use tvl_state::TvlStore;

use crate::error::IngestResult;
use crate::locator::{PendingLookup, Target};

/// Issues the baseline lookups for an incoming value.
pub struct BaselineSelector<S> {
    store: Arc<S>,
    daily_tolerance_secs: u64,
}

impl<S: TvlStore> BaselineSelector<S> {
    pub fn new(store: Arc<S>, config: &BaselineConfig) -> Self {
        Self {
            store,
            daily_tolerance_secs: config.daily_tolerance_secs,
        }
    }

    /// Start all lookups for `protocol_id` at `timestamp`. Nothing is awaited.
    pub fn fire(&self, protocol_id: &str, timestamp: u64) -> PendingBaselines {
        let hourly = BucketKey::hourly(protocol_id);
        let daily = BucketKey::daily(protocol_id);
        let day_ago = timestamp.saturating_sub(SECONDS_PER_DAY);
        let week_ago = timestamp.saturating_sub(SECONDS_PER_WEEK);
        let tolerance = Some(self.daily_tolerance_secs);

        let at_or_before = |timestamp| Target::Closest {
            timestamp,
            tolerance: None,
        };
        let around = |timestamp| Target::Closest {
            timestamp,
            tolerance,
        };

        PendingBaselines {
            last_hourly: PendingLookup::spawn(&self.store, hourly.clone(), Target::Latest),
            hourly_day: PendingLookup::spawn(&self.store, hourly.clone(), at_or_before(day_ago)),
            hourly_week: PendingLookup::spawn(&self.store, hourly, at_or_before(week_ago)),
            daily_day: PendingLookup::spawn(&self.store, daily.clone(), around(day_ago)),
            daily_week: PendingLookup::spawn(&self.store, daily.clone(), around(week_ago)),
            prior_daily: PendingLookup::spawn(&self.store, daily, at_or_before(timestamp)),
        }
    }
}

/// Lookups in flight.
pub struct PendingBaselines {
    last_hourly: PendingLookup,
    hourly_day: PendingLookup,
    hourly_week: PendingLookup,
    daily_day: PendingLookup,
    daily_week: PendingLookup,
    prior_daily: PendingLookup,
}

impl PendingBaselines {
    /// Wait for every lookup. The first failure is returned.
    pub async fn join(self) -> IngestResult<Baselines> {
        Ok(Baselines {
            last_hourly: self.last_hourly.resolve().await?,
            hourly_day: self.hourly_day.resolve().await?,
            hourly_week: self.hourly_week.resolve().await?,
            daily_day: self.daily_day.resolve().await?,
            daily_week: self.daily_week.resolve().await?,
            prior_daily: self.prior_daily.resolve().await?,
        })
    }
}

/// Resolved lookups, as read before this ingestion wrote anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Baselines {
    pub last_hourly: Lookup,
    pub hourly_day: Lookup,
    pub hourly_week: Lookup,
    pub daily_day: Lookup,
    pub daily_week: Lookup,
    /// Newest daily record at or before the incoming timestamp.
    pub prior_daily: Lookup,
}

impl Baselines {
    /// Derived previous-period fields, with inflated hourly baselines zeroed.
    pub fn previous(&self, discard_ratio: f64) -> PreviousTvl {
        PreviousTvl {
            prev_1_hour: self.last_hourly.total(),
            prev_1_day: discard_if_inflated(
                self.hourly_day.total(),
                self.daily_day.total(),
                discard_ratio,
            ),
            prev_1_week: discard_if_inflated(
                self.hourly_week.total(),
                self.daily_week.total(),
                discard_ratio,
            ),
        }
    }
}

/// `0.0` when both values are known and `hourly > ratio * daily`.
pub fn discard_if_inflated(hourly: f64, daily: f64, ratio: f64) -> f64 {
    if hourly != 0.0 && daily != 0.0 && hourly > daily * ratio {
        0.0
    } else {
        hourly
    }
}
