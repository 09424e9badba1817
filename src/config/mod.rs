//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// The configuration written by `musicbox init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../musicbox.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<MusicBoxConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {:?}", path))?;
    let config: MusicBoxConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
