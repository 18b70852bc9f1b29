//! Shared plumbing for the alchemy table binary.

use alchemy_core::AlchemyConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub mod scenario;

pub use scenario::{AIR_MARKER, DemoScript, FIRE_MARKER, RunSummary, run};

/// Load engine configuration from a JSON file, or fall back to defaults.
///
/// Keys missing from the file keep their default values.
pub fn load_config(path: Option<&Path>) -> Result<AlchemyConfig> {
    let Some(path) = path else {
        return Ok(AlchemyConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: AlchemyConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("config file {} is invalid", path.display()))?;
    Ok(config)
}
