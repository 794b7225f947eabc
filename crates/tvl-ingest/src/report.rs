//! Reporting channel for soft anomalies.

use std::sync::Mutex;

use tracing::warn;

/// Fire-and-forget sink for anomaly messages. Delivery is not guaranteed.
pub trait AnomalyReporter: Send + Sync {
    fn report(&self, message: &str, protocol_name: &str);
}

/// Emits reports as `warn`-level tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl AnomalyReporter for TracingReporter {
    fn report(&self, message: &str, protocol_name: &str) {
        warn!(protocol = %protocol_name, "{message}");
    }
}

/// A report captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    pub protocol_name: String,
}

/// Keeps reports in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AnomalyReporter for MemoryReporter {
    fn report(&self, message: &str, protocol_name: &str) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Report {
                message: message.to_string(),
                protocol_name: protocol_name.to_string(),
            });
    }
}
