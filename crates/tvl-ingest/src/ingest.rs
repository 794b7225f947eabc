//! Ingestor — entry point tying baseline selection, spike detection and
//! bucket writes together.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tvl_core::{Protocol, TvlConfig, TvlMeasurement};
use tvl_state::TvlStore;

use crate::baseline::BaselineSelector;
use crate::error::{IngestError, IngestResult};
use crate::guard::{AnomalyGuard, Verdict};
use crate::report::AnomalyReporter;
use crate::writer::{DualResolutionWriter, WritePlan};

/// Validates and stores TVL values. Build once per process and share.
pub struct Ingestor<S> {
    selector: BaselineSelector<S>,
    guard: AnomalyGuard,
    writer: DualResolutionWriter<S>,
    reporter: Arc<dyn AnomalyReporter>,
    discard_ratio: f64,
}

impl<S: TvlStore> Ingestor<S> {
    pub fn new(store: Arc<S>, reporter: Arc<dyn AnomalyReporter>, config: &TvlConfig) -> Self {
        Self {
            selector: BaselineSelector::new(Arc::clone(&store), &config.baselines),
            guard: AnomalyGuard::new(&config.guard),
            writer: DualResolutionWriter::new(store),
            reporter,
            discard_ratio: config.baselines.discard_ratio,
        }
    }

    /// Store `tvl` for `protocol` at `timestamp` (unix seconds).
    ///
    /// With `store_previous_data` the value is checked against history and
    /// the hourly record carries previous-hour/day/week fields. A first write
    /// for a new protocol should pass `false`.
    ///
    /// Returns [`IngestError::SpikeRejected`] without writing anything when
    /// the jump is confirmed by two baselines.
    pub async fn store_new_tvl(
        &self,
        protocol: &Protocol,
        timestamp: u64,
        tvl: &TvlMeasurement,
        store_previous_data: bool,
    ) -> IngestResult<()> {
        let baselines = self.selector.fire(&protocol.id, timestamp).join().await?;

        if store_previous_data {
            let verdict = self.guard.check(
                protocol,
                tvl.total,
                &baselines.last_hourly,
                &baselines.hourly_week,
                &baselines.hourly_day,
            );
            match verdict {
                Verdict::Accept => {}
                Verdict::Report { message } => {
                    self.reporter.report(&message, &protocol.name);
                }
                Verdict::Reject { change } => {
                    warn!(
                        protocol_id = %protocol.id,
                        timestamp,
                        %change,
                        "tvl spike rejected"
                    );
                    return Err(IngestError::SpikeRejected {
                        protocol: protocol.name.clone(),
                        factor: self.guard.reject_multiplier(),
                        change,
                    });
                }
            }
        }

        let previous = store_previous_data.then(|| baselines.previous(self.discard_ratio));
        let plan = WritePlan::new(timestamp, tvl, previous, &baselines.prior_daily);
        debug!(
            protocol_id = %protocol.id,
            timestamp,
            daily = plan.daily.is_some(),
            ?previous,
            "writing tvl"
        );
        self.writer.commit(&protocol.id, plan).await?;

        info!(protocol_id = %protocol.id, timestamp, tvl = tvl.total, "tvl stored");
        Ok(())
    }
}
