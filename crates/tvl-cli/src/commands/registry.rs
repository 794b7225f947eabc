use tvl_core::TvlConfig;

use super::open_store;

pub fn enable(config: &TvlConfig, protocol_id: &str) -> anyhow::Result<()> {
    let state = open_store(config)?;
    if state.enable(protocol_id)? {
        println!("✓ Enabled {protocol_id}");
    } else {
        println!("{protocol_id} was not disabled");
    }
    Ok(())
}

pub fn list(config: &TvlConfig) -> anyhow::Result<()> {
    let state = open_store(config)?;
    let disabled = state.list_disabled()?;
    println!("{}", serde_json::to_string_pretty(&disabled)?);
    Ok(())
}
