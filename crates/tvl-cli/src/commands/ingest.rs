use std::sync::Arc;

use tvl_core::calendar::epoch_secs;
use tvl_core::{DisabledProtocol, Protocol, TvlConfig, TvlMeasurement};
use tvl_ingest::{Ingestor, TracingReporter};

use super::open_store;

pub async fn store(
    config: &TvlConfig,
    protocol_id: String,
    protocol_name: String,
    timestamp: Option<u64>,
    tvl: &str,
    store_previous_data: bool,
) -> anyhow::Result<()> {
    let state = open_store(config)?;
    if let Some(disabled) = state.get_disabled(&protocol_id)? {
        anyhow::bail!(
            "protocol {} is disabled since {}: {}",
            disabled.protocol_id,
            disabled.disabled_at,
            disabled.reason
        );
    }

    let protocol = Protocol::new(protocol_id, protocol_name);
    let tvl = parse_tvl(tvl)?;
    let timestamp = timestamp.unwrap_or_else(epoch_secs);

    let ingestor = Ingestor::new(Arc::new(state.clone()), Arc::new(TracingReporter), config);
    match ingestor
        .store_new_tvl(&protocol, timestamp, &tvl, store_previous_data)
        .await
    {
        Ok(()) => {
            println!("✓ Stored {} for {} at {timestamp}", tvl.total, protocol.name);
            Ok(())
        }
        Err(e) if e.is_fatal_anomaly() => {
            state.disable(&DisabledProtocol {
                protocol_id: protocol.id.clone(),
                reason: e.to_string(),
                disabled_at: epoch_secs(),
            })?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Accept a bare number or a JSON measurement object.
fn parse_tvl(input: &str) -> anyhow::Result<TvlMeasurement> {
    if let Ok(total) = input.trim().parse::<f64>() {
        return Ok(TvlMeasurement::new(total));
    }
    Ok(serde_json::from_str(input)?)
}
