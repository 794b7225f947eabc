use tvl_core::{BucketKey, BucketKind, TvlConfig};
use tvl_state::TvlStore;

use super::open_store;

pub fn show(
    config: &TvlConfig,
    protocol_id: &str,
    kind: BucketKind,
    limit: usize,
) -> anyhow::Result<()> {
    let state = open_store(config)?;
    let key = BucketKey {
        kind,
        protocol_id: protocol_id.to_string(),
    };
    let records = state.list(&key, limit)?;
    if records.is_empty() {
        eprintln!("no {kind} records for {protocol_id}");
    }
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
