//! Deterministic session core
//!
//! All orchestration logic lives here. This module must stay deterministic:
//! - Simulated time only (timers advance from `tick`, never the wall clock)
//! - Seeded RNG only
//! - Rendering, physics and UI reached only through `platform` traits

pub mod catalog;
pub mod clock;
pub mod demo;
pub mod level;
pub mod machine;
pub mod outcome;
pub mod rain;
pub mod schedule;
pub mod state;

pub use catalog::{LevelCatalog, LevelEntry};
pub use clock::FixedStep;
pub use demo::DemoDriver;
pub use level::{LevelEvent, LevelLifecycleManager, NextLevel};
pub use machine::{Button, GameStateMachine, Host};
pub use outcome::{LevelSession, SessionOutcomeEvaluator, Verdict};
pub use rain::{EnemyRainController, RainSchedule, RainStart, RainState, RainStep, SpawnBounds};
pub use schedule::{Due, Scheduler, TaskHandle};
pub use state::{GameState, SessionTimer};
