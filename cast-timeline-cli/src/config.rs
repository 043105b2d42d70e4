//! Scenario loading and parsing
//!
//! A scenario file is a TOML rendition of a snapshot (timeline, enemy, actors
//! with their skills, cast events) plus an optional `[output]` table.

use anyhow::{Context, Result};
use cast_timeline_engine::{Snapshot, TimelineState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from a scenario .toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(flatten)]
    pub scenario: Snapshot,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Query times for the stats section
    #[serde(default)]
    pub sample_times: Vec<f64>,
    /// Only report stats for this actor
    pub focus_actor: Option<String>,
    /// Include lane numbers in the instance table
    #[serde(default)]
    pub show_lanes: bool,
    /// Print the snapshot token after the report
    #[serde(default)]
    pub emit_token: bool,
}

impl AppConfig {
    /// Build the engine state described by this scenario
    pub fn to_state(&self) -> Result<TimelineState> {
        self.scenario
            .clone()
            .into_state()
            .context("Scenario is not a valid timeline state")
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;

    Ok(config)
}
