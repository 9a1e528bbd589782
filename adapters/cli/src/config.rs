//! TOML configuration shared by every subcommand.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use rompilot_collision::TileEncoding;
use rompilot_system_navigation::NavConfig;
use serde::Deserialize;

/// Navigation tunables and tile tables loaded from one file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PilotConfig {
    /// `[navigation]` table.
    pub(crate) navigation: NavConfig,
    /// `[tiles.overworld]` and `[tiles.dungeon]` tables.
    pub(crate) tiles: TileEncoding,
}

impl PilotConfig {
    /// Parses and validates configuration text.
    pub(crate) fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config
            .navigation
            .validate()
            .context("invalid [navigation] table")?;
        Ok(config)
    }

    /// Loads `path`, or the built-in defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("failed to load {}", path.display()))
    }
}
