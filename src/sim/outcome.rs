//! Per-level counters and win/fail reconciliation

use super::schedule::{Scheduler, TaskHandle};
use super::state::{GameState, SessionTimer};
use crate::platform::{BallHandle, LevelContents};

/// Counters for the level currently in play. Rebuilt on every load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSession {
    pub index: usize,
    pub total_blocks: usize,
    pub fallen_blocks: usize,
    /// Sticky within the session
    pub ball_hit: bool,
    /// Sticky within the session
    pub rain_finished: bool,
    /// Set once the block threshold triggered rain
    pub rain_started: bool,
    /// Snapshot at load; entries may be destroyed later and are skipped
    pub active_balls: Vec<BallHandle>,
    /// Rain enemies spawned and not yet despawned
    pub live_hazards: u32,
}

impl LevelSession {
    pub fn new(index: usize, contents: &LevelContents) -> Self {
        Self {
            index,
            total_blocks: contents.block_count,
            active_balls: contents.balls.clone(),
            ..Self::default()
        }
    }

    pub fn all_fallen(&self) -> bool {
        self.fallen_blocks >= self.total_blocks
    }

    /// Count one fallen block. Returns `true` on the call that should start the rain.
    pub fn record_fallen(&mut self) -> bool {
        if self.fallen_blocks < self.total_blocks {
            self.fallen_blocks += 1;
        }
        self.arm_rain_if_complete()
    }

    /// `true` exactly once per session, the first time every block is down.
    /// Zero-block levels arm immediately.
    pub fn arm_rain_if_complete(&mut self) -> bool {
        if self.all_fallen() && !self.rain_started {
            self.rain_started = true;
            true
        } else {
            false
        }
    }
}

/// What a fired grace timer (or a cleared field) resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    /// Demo grace expired; reload the demo level
    Replay,
    /// Win is due but enemies are still alive
    Deferred,
    None,
}

/// Turns rain completion and hazard hits into a single outcome
#[derive(Debug)]
pub struct SessionOutcomeEvaluator {
    survive_extra_time: f32,
    require_clear_field: bool,
    grace: Option<TaskHandle>,
    awaiting_clear: bool,
}

impl SessionOutcomeEvaluator {
    pub fn new(survive_extra_time: f32, require_clear_field: bool) -> Self {
        Self {
            survive_extra_time,
            require_clear_field,
            grace: None,
            awaiting_clear: false,
        }
    }

    /// A grace or demo-replay wait is outstanding
    pub fn grace_pending(&self) -> bool {
        self.grace.is_some()
    }

    pub fn awaiting_clear(&self) -> bool {
        self.awaiting_clear
    }

    /// Drop any pending outcome (level reload, Win/Fail entry)
    pub fn cancel(&mut self, timers: &mut Scheduler<SessionTimer>) {
        if let Some(handle) = self.grace.take() {
            timers.cancel(handle);
        }
        self.awaiting_clear = false;
    }

    pub fn on_rain_finished(
        &mut self,
        state: GameState,
        session: &mut LevelSession,
        timers: &mut Scheduler<SessionTimer>,
    ) {
        session.rain_finished = true;
        let payload = match state {
            GameState::Gameplay if !session.ball_hit => SessionTimer::GraceExpired,
            GameState::Demo => SessionTimer::DemoReplay,
            _ => {
                log::debug!("[Outcome] Rain finished in {state:?}, no grace wait");
                return;
            }
        };
        self.cancel(timers);
        self.grace = Some(timers.schedule_in(self.survive_extra_time, payload));
        log::info!(
            "[Outcome] Rain finished, grace {:.2}s ({payload:?})",
            self.survive_extra_time
        );
    }

    /// `GraceExpired` fired
    pub fn on_grace_expired(&mut self, state: GameState, session: &LevelSession) -> Verdict {
        self.grace = None;
        if state != GameState::Gameplay || session.ball_hit {
            return Verdict::None;
        }
        if self.require_clear_field && session.live_hazards > 0 {
            log::info!(
                "[Outcome] Survived, waiting for {} enemies to clear",
                session.live_hazards
            );
            self.awaiting_clear = true;
            return Verdict::Deferred;
        }
        Verdict::Win
    }

    /// `DemoReplay` fired
    pub fn on_demo_replay_due(&mut self, state: GameState) -> Verdict {
        self.grace = None;
        if state == GameState::Demo {
            Verdict::Replay
        } else {
            Verdict::None
        }
    }

    /// A hit during the grace wait cancels the pending outcome
    pub fn on_hazard_hit(&mut self, timers: &mut Scheduler<SessionTimer>) {
        if self.grace.is_some() || self.awaiting_clear {
            log::info!("[Outcome] Hit during grace period, pending outcome cancelled");
        }
        self.cancel(timers);
    }

    /// Releases a deferred Win once no enemies remain. Called on every
    /// despawn and on resume; the deferral survives a pause.
    pub fn on_field_cleared(&mut self, state: GameState, session: &LevelSession) -> Verdict {
        if !self.awaiting_clear
            || session.live_hazards > 0
            || session.ball_hit
            || state != GameState::Gameplay
        {
            return Verdict::None;
        }
        self.awaiting_clear = false;
        Verdict::Win
    }
}
