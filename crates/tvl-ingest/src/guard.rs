//! Anomaly guard — two-tier spike detection on incoming TVL values.
//!
//! A jump above `report_multiplier` × the last hourly value is reported.
//! It is rejected only when it also exceeds `reject_multiplier` × both the
//! last hourly value and an older cross-check baseline (a week back, else a
//! day back). With no older history the cross-check falls back to a baseline
//! so large that the reject path cannot trigger.

use tvl_core::config::GuardConfig;
use tvl_core::{Lookup, Protocol, humanize_number};

/// Outcome of a spike check.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept,
    /// Suspicious but stored; `message` goes to the reporting channel.
    Report { message: String },
    /// Confirmed spike; nothing may be stored. `change` reads `old to new`.
    Reject { change: String },
}

#[derive(Debug, Clone)]
pub struct AnomalyGuard {
    report_multiplier: f64,
    reject_multiplier: f64,
    fallback_baseline: f64,
}

impl AnomalyGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            report_multiplier: config.report_multiplier,
            reject_multiplier: config.reject_multiplier,
            fallback_baseline: config.fallback_baseline,
        }
    }

    pub fn reject_multiplier(&self) -> f64 {
        self.reject_multiplier
    }

    /// Judge `incoming` against the newest hourly record and the raw
    /// week-old and day-old hourly records.
    pub fn check(
        &self,
        protocol: &Protocol,
        incoming: f64,
        last_hourly: &Lookup,
        hourly_week: &Lookup,
        hourly_day: &Lookup,
    ) -> Verdict {
        let last = last_hourly.total();
        if last == 0.0 || incoming <= last * self.report_multiplier {
            return Verdict::Accept;
        }

        let change = format!(
            "{} to {}",
            humanize_number(last),
            humanize_number(incoming)
        );
        let cross_check = self.cross_check_baseline(hourly_week, hourly_day);

        if incoming > last * self.reject_multiplier
            && incoming > cross_check * self.reject_multiplier
        {
            Verdict::Reject { change }
        } else {
            Verdict::Report {
                message: format!(
                    "TVL for {} has >{}x ({change})",
                    protocol.name, self.report_multiplier
                ),
            }
        }
    }

    /// Presence decides the fallback, not the value: a stored zero is used.
    fn cross_check_baseline(&self, hourly_week: &Lookup, hourly_day: &Lookup) -> f64 {
        if hourly_week.is_found() {
            hourly_week.total()
        } else if hourly_day.is_found() {
            hourly_day.total()
        } else {
            self.fallback_baseline
        }
    }
}
