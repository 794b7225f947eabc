//! tvl.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::calendar::SECONDS_PER_DAY;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TvlConfig {
    pub store: StoreConfig,
    pub guard: GuardConfig,
    pub baselines: BaselineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the redb database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/tvl/tvl.redb"),
        }
    }
}

/// Spike thresholds applied to incoming values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Jump over the last hourly value that triggers deeper checks.
    pub report_multiplier: f64,
    /// Jump that, confirmed by the cross-check baseline, rejects the write.
    pub reject_multiplier: f64,
    /// Cross-check baseline used when no hourly history exists.
    pub fallback_baseline: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            report_multiplier: 2.0,
            reject_multiplier: 5.0,
            fallback_baseline: 10e9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BaselineConfig {
    /// Hourly baselines above `discard_ratio` times their daily counterpart
    /// are stored as zero.
    pub discard_ratio: f64,
    /// Search window around daily-bucket targets.
    pub daily_tolerance_secs: u64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            discard_ratio: 2.0,
            daily_tolerance_secs: SECONDS_PER_DAY,
        }
    }
}

impl TvlConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TvlConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Defaults with the store placed under `data_dir`.
    pub fn scaffold(data_dir: &Path) -> Self {
        TvlConfig {
            store: StoreConfig {
                path: data_dir.join("tvl.redb"),
            },
            ..Default::default()
        }
    }
}
