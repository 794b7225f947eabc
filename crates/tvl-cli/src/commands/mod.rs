pub mod ingest;
pub mod inspect;
pub mod registry;

use std::path::{Path, PathBuf};

use tracing::debug;
use tvl_core::TvlConfig;
use tvl_state::StateStore;

pub fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<TvlConfig> {
    let mut config = match path {
        Some(path) => TvlConfig::from_file(path)?,
        None => TvlConfig::default(),
    };
    if let Some(db) = db {
        config.store.path = db;
    }
    Ok(config)
}

/// Open the configured database, creating its directory if needed.
pub fn open_store(config: &TvlConfig) -> anyhow::Result<StateStore> {
    let path = &config.store.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let state = StateStore::open(path)?;
    debug!(path = ?path, "state store opened");
    Ok(state)
}

pub fn init_config(path: &Path, data_dir: &Path) -> anyhow::Result<()> {
    let config = TvlConfig::scaffold(data_dir);
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}
