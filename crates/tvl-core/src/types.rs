//! Shared types used across the TVL crates.
//!
//! A [`BucketRecord`] is the persisted unit. Records live in one of two
//! partitions per protocol (hourly, daily) and are ordered by their unix
//! timestamp inside that partition.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a tracked protocol.
pub type ProtocolId = String;

/// Descriptor of a tracked protocol. Owned by an external registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Protocol {
    pub id: ProtocolId,
    pub name: String,
}

impl Protocol {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ── Measurement ───────────────────────────────────────────────────

/// A freshly computed TVL value: the canonical total plus per-label amounts.
///
/// The breakdown is opaque to the ingestion core; only `total` is inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TvlMeasurement {
    #[serde(rename = "tvl")]
    pub total: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, f64>,
}

impl TvlMeasurement {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            breakdown: BTreeMap::new(),
        }
    }

    /// Attach a labelled amount (chain, token, category...).
    pub fn with_entry(mut self, label: impl Into<String>, amount: f64) -> Self {
        self.breakdown.insert(label.into(), amount);
        self
    }
}

// ── Buckets ───────────────────────────────────────────────────────

/// Time granularity of a bucket partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Hourly,
    Daily,
}

impl BucketKind {
    fn prefix(self) -> &'static str {
        match self {
            BucketKind::Hourly => "hourlyTvl",
            BucketKind::Daily => "dailyTvl",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKind::Hourly => f.write_str("hourly"),
            BucketKind::Daily => f.write_str("daily"),
        }
    }
}

/// Partition key of a bucket: one per (kind, protocol).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub kind: BucketKind,
    pub protocol_id: ProtocolId,
}

impl BucketKey {
    pub fn hourly(protocol_id: impl Into<String>) -> Self {
        Self {
            kind: BucketKind::Hourly,
            protocol_id: protocol_id.into(),
        }
    }

    pub fn daily(protocol_id: impl Into<String>) -> Self {
        Self {
            kind: BucketKind::Daily,
            protocol_id: protocol_id.into(),
        }
    }

    /// Partition string used as the first component of the table key,
    /// e.g. `hourlyTvl#aave`.
    pub fn partition(&self) -> String {
        format!("{}#{}", self.kind.prefix(), self.protocol_id)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.partition())
    }
}

/// Values of the same series one hour, one day and one week earlier.
///
/// `0.0` means either "no data" or "discarded as unreliable"; readers must
/// not try to tell the two apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PreviousTvl {
    #[serde(rename = "tvlPrev1Hour")]
    pub prev_1_hour: f64,
    #[serde(rename = "tvlPrev1Day")]
    pub prev_1_day: f64,
    #[serde(rename = "tvlPrev1Week")]
    pub prev_1_week: f64,
}

/// A stored record. Created on write, replaced by a later write to the
/// same timestamp, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketRecord {
    /// Sort key: unix timestamp in seconds.
    pub timestamp: u64,
    pub tvl: TvlMeasurement,
    /// Only present on hourly records written with previous-data storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PreviousTvl>,
}

impl BucketRecord {
    pub fn new(timestamp: u64, tvl: TvlMeasurement) -> Self {
        Self {
            timestamp,
            tvl,
            previous: None,
        }
    }
}

/// Outcome of a store lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(BucketRecord),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Total TVL of the record, `0.0` when nothing was found.
    pub fn total(&self) -> f64 {
        match self {
            Lookup::Found(record) => record.tvl.total,
            Lookup::NotFound => 0.0,
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Lookup::Found(record) => Some(record.timestamp),
            Lookup::NotFound => None,
        }
    }
}

impl From<Option<BucketRecord>> for Lookup {
    fn from(record: Option<BucketRecord>) -> Self {
        record.map_or(Lookup::NotFound, Lookup::Found)
    }
}

// ── Registry ──────────────────────────────────────────────────────

/// A protocol taken out of ingestion after a rejected spike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisabledProtocol {
    pub protocol_id: ProtocolId,
    pub reason: String,
    /// Unix timestamp (seconds) when it was disabled.
    pub disabled_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_strings() {
        assert_eq!(BucketKey::hourly("aave").partition(), "hourlyTvl#aave");
        assert_eq!(BucketKey::daily("aave").partition(), "dailyTvl#aave");
    }

    #[test]
    fn measurement_json_uses_tvl_field() {
        let m = TvlMeasurement::new(1500.0).with_entry("ethereum", 1000.0);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["tvl"], 1500.0);
        assert_eq!(json["breakdown"]["ethereum"], 1000.0);

        let parsed: TvlMeasurement = serde_json::from_str(r#"{"tvl": 42.0}"#).unwrap();
        assert_eq!(parsed, TvlMeasurement::new(42.0));
    }

    #[test]
    fn previous_fields_are_omitted_when_absent() {
        let record = BucketRecord::new(3600, TvlMeasurement::new(1.0));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("previous"));

        let with_prev = BucketRecord {
            previous: Some(PreviousTvl {
                prev_1_hour: 1.0,
                prev_1_day: 0.0,
                prev_1_week: 3.0,
            }),
            ..record
        };
        let json = serde_json::to_string(&with_prev).unwrap();
        assert!(json.contains("tvlPrev1Hour"));
        assert!(json.contains("tvlPrev1Week"));
    }

    #[test]
    fn missing_lookup_reads_as_zero() {
        let missing = Lookup::NotFound;
        assert_eq!(missing.total(), 0.0);
        assert_eq!(missing.timestamp(), None);
        assert!(!missing.is_found());

        let found = Lookup::from(Some(BucketRecord::new(7200, TvlMeasurement::new(0.0))));
        assert!(found.is_found());
        assert_eq!(found.total(), 0.0);
        assert_eq!(found.timestamp(), Some(7200));
    }
}
