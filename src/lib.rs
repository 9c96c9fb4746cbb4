//! Hide Ball - tap blocks away, then keep the balls alive through the rain
//!
//! Core modules:
//! - `sim`: Deterministic session core (state machine, level lifecycle, rain, outcome)
//! - `platform`: Collaborator traits (world, presentation) plus a headless world
//! - `persistence`: Last-played level and intro flag storage
//! - `audio`: Sound cues and haptics gating
//! - `config` / `settings`: Data-driven tuning and player preferences

pub mod audio;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use audio::{AudioManager, AudioSink, SoundCue};
pub use config::SessionConfig;
pub use error::{ConfigError, LevelError, PersistenceError};
pub use settings::Settings;
pub use sim::{GameState, GameStateMachine, Host};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (the game targets 60 fps)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Wait after the rain stops before a Win (or demo replay) is declared
    pub const SURVIVE_EXTRA_TIME: f32 = 3.0;
    /// A ball below this height counts as lost
    pub const LOSE_Y: f32 = -5.0;

    /// Rain defaults
    pub const RAIN_INTERVAL: f32 = 0.1;
    pub const RAIN_DURATION: f32 = 5.0;
    pub const RAIN_MIN_X: f32 = -2.0;
    pub const RAIN_MAX_X: f32 = 2.0;
    pub const RAIN_SPAWN_Y: f32 = 6.0;

    /// Time the demo hand spends moving to its next target
    pub const DEMO_HAND_TRAVEL: f32 = 0.5;
    /// Default pause after each demo click
    pub const DEMO_WAIT_AFTER_CLICK: f32 = 0.4;

    /// Slack when comparing timer deadlines against the simulation clock
    pub const TIME_EPSILON: f64 = 1e-6;
}
