//! Game state and timer payloads

use serde::{Deserialize, Serialize};

/// Which gameplay rules currently apply. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Looping presentation: never wins, never fails
    Demo,
    /// Active play
    Gameplay,
    /// Time frozen, overlay shown
    Pause,
    /// Level survived
    Win,
    /// A ball was hit or lost
    Fail,
}

impl GameState {
    /// States that accept block-fallen notifications
    pub fn is_live(self) -> bool {
        matches!(self, GameState::Gameplay | GameState::Demo)
    }

    /// Win and Fail end the session until a restart
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Win | GameState::Fail)
    }

    /// Simulation time scale while in this state
    pub fn time_scale(self) -> f32 {
        match self {
            GameState::Gameplay | GameState::Demo => 1.0,
            GameState::Pause | GameState::Win | GameState::Fail => 0.0,
        }
    }
}

/// Payload of every timed wait the session schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    /// Next rain spawn (or completion)
    RainStep,
    /// Grace period after the rain; Win if nothing hit
    GraceExpired,
    /// Grace period after the demo rain; replay the demo level
    DemoReplay,
    /// Next scripted demo click
    DemoStep(usize),
}
