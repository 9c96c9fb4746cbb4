//! Data-driven session tuning
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::platform::ContentHandle;
use crate::sim::{GameState, RainSchedule};

/// Losing when a ball drops out of the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallLoseConfig {
    pub enabled: bool,
    /// A ball whose y is below this fails the level
    pub lose_y: f32,
}

impl Default for FallLoseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lose_y: LOSE_Y,
        }
    }
}

/// Level ordering and progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// Persist the last loaded index
    pub save_progress: bool,
    /// Wrap to `default_start_index` after the last level
    pub loop_at_end: bool,
    /// Where a fresh install (and a wrap) starts
    pub default_start_index: usize,
    /// Index that plays as the looping demo
    pub demo_index: Option<usize>,
    /// First real level, loaded when leaving the demo
    pub first_real_index: usize,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            save_progress: true,
            loop_at_end: true,
            default_start_index: 0,
            demo_index: Some(0),
            first_real_index: 1,
        }
    }
}

/// Scripted demo hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Time the hand takes to reach each target
    pub hand_travel_seconds: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            hand_travel_seconds: DEMO_HAND_TRAVEL,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// State reported before the first level loads (Gameplay or Demo).
    /// Every load then picks Demo or Gameplay from `levels.demo_index`.
    pub initial_state: GameState,
    /// Grace period after the rain stops
    pub survive_extra_time: f32,
    pub fall_lose: FallLoseConfig,
    pub rain: RainSchedule,
    /// Enemy content spawned by the rain; no rain without it
    pub enemy_content: Option<ContentHandle>,
    pub levels: LevelsConfig,
    /// Hold a pending Win until every spawned enemy is gone
    pub require_clear_field: bool,
    pub demo: DemoConfig,
    /// Seed for rain spawn positions
    pub rng_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_state: GameState::Gameplay,
            survive_extra_time: SURVIVE_EXTRA_TIME,
            fall_lose: FallLoseConfig::default(),
            rain: RainSchedule::default(),
            enemy_content: None,
            levels: LevelsConfig::default(),
            require_clear_field: false,
            demo: DemoConfig::default(),
            rng_seed: 0x5eed,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.initial_state, GameState::Gameplay | GameState::Demo) {
            return Err(ConfigError::InvalidInitialState(self.initial_state));
        }
        if self.survive_extra_time < 0.0 || self.survive_extra_time.is_nan() {
            return Err(ConfigError::NegativeGracePeriod(self.survive_extra_time));
        }
        self.rain.validate()
    }
}
