//! Tunables of the navigation session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Retry ceilings and frame budgets for one navigation session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavConfig {
    /// Replans allowed after failed attempts before the session gives up.
    pub max_replans: u32,
    /// Planning cycles that may fail transiently (blocked start, stale map,
    /// unavailable region) before the session gives up.
    pub max_planning_retries: u32,
    /// Frames a single attempt may hold its direction.
    pub frame_budget: u32,
    /// Frames driven between two position samples within one attempt.
    pub frames_per_poll: u32,
    /// Tiles of padding read around the player and the target.
    pub region_margin: u32,
}

impl NavConfig {
    /// Rejects configurations that would stall an attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_budget == 0 {
            return Err(ConfigError::ZeroFrameBudget);
        }
        if self.frames_per_poll == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_replans: 3,
            max_planning_retries: 3,
            frame_budget: 32,
            frames_per_poll: 8,
            region_margin: 8,
        }
    }
}

/// Invalid [`NavConfig`] values.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `frame_budget` was zero.
    #[error("frame_budget must be at least one frame")]
    ZeroFrameBudget,
    /// `frames_per_poll` was zero.
    #[error("frames_per_poll must be at least one frame")]
    ZeroPollInterval,
}
