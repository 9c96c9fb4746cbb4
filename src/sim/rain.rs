//! Enemy rain: a fixed-interval spawn wave over a fixed duration
//!
//! The controller never owns the enemies it spawns; they go straight into the
//! world's runtime container, which the level lifecycle clears on every load.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::schedule::{Scheduler, TaskHandle};
use super::state::SessionTimer;
use crate::consts::*;
use crate::error::ConfigError;
use crate::platform::{ContentHandle, EnemyHandle, World};

/// Horizontal spawn strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub spawn_y: f32,
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            min_x: RAIN_MIN_X,
            max_x: RAIN_MAX_X,
            spawn_y: RAIN_SPAWN_Y,
        }
    }
}

/// Timing and placement of one wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainSchedule {
    pub interval_seconds: f32,
    pub duration_seconds: f32,
    pub bounds: SpawnBounds,
}

impl Default for RainSchedule {
    fn default() -> Self {
        Self {
            interval_seconds: RAIN_INTERVAL,
            duration_seconds: RAIN_DURATION,
            bounds: SpawnBounds::default(),
        }
    }
}

impl RainSchedule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds <= 0.0 || self.interval_seconds.is_nan() {
            return Err(ConfigError::InvalidInterval(self.interval_seconds));
        }
        if self.duration_seconds < 0.0 || self.duration_seconds.is_nan() {
            return Err(ConfigError::NegativeDuration(self.duration_seconds));
        }
        if self.bounds.min_x > self.bounds.max_x {
            return Err(ConfigError::InvertedSpawnBounds {
                min_x: self.bounds.min_x,
                max_x: self.bounds.max_x,
            });
        }
        Ok(())
    }

    /// Enemies spawned by one wave: `ceil(duration / interval)`
    pub fn spawn_count(&self) -> u32 {
        if self.duration_seconds <= 0.0 || self.interval_seconds <= 0.0 {
            return 0;
        }
        let ratio = f64::from(self.duration_seconds) / f64::from(self.interval_seconds);
        // 5.0 / 0.1 lands a hair above 50 in floating point; that is still 50 spawns
        let nearest = ratio.round();
        let count = if (ratio - nearest).abs() < 1e-4 {
            nearest
        } else {
            ratio.ceil()
        };
        count as u32
    }
}

/// Rain controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainState {
    Idle,
    Raining,
}

/// Outcome of `start_rain`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainStart {
    Started,
    /// A wave is already in flight; nothing changed
    AlreadyRaining,
    /// No enemy content configured; nothing changed
    NoSpawnContent,
}

/// Outcome of one rain timer step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainStep {
    Spawned(EnemyHandle),
    /// The wave is over; reported exactly once per wave
    Finished,
    /// Stale timer (controller was reset)
    Ignored,
}

pub struct EnemyRainController {
    state: RainState,
    enemy_content: Option<ContentHandle>,
    schedule: RainSchedule,
    spawned: u32,
    target: u32,
    pending: Option<TaskHandle>,
    rng: Pcg32,
    reported_missing: bool,
}

impl EnemyRainController {
    pub fn new(enemy_content: Option<ContentHandle>, seed: u64) -> Self {
        Self {
            state: RainState::Idle,
            enemy_content,
            schedule: RainSchedule::default(),
            spawned: 0,
            target: 0,
            pending: None,
            rng: Pcg32::seed_from_u64(seed),
            reported_missing: false,
        }
    }

    pub fn state(&self) -> RainState {
        self.state
    }

    pub fn is_raining(&self) -> bool {
        self.state == RainState::Raining
    }

    /// Enemies spawned by the current (or last) wave
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Begin a wave. The first spawn happens on the next timer pop.
    pub fn start_rain(
        &mut self,
        schedule: &RainSchedule,
        timers: &mut Scheduler<SessionTimer>,
    ) -> RainStart {
        if self.state == RainState::Raining {
            log::debug!("[EnemyRain] Already raining");
            return RainStart::AlreadyRaining;
        }
        if self.enemy_content.is_none() {
            if !self.reported_missing {
                log::error!("[EnemyRain] No enemy content configured, rain disabled");
                self.reported_missing = true;
            }
            return RainStart::NoSpawnContent;
        }

        self.state = RainState::Raining;
        self.schedule = *schedule;
        self.spawned = 0;
        self.target = schedule.spawn_count();
        self.pending = Some(timers.schedule_in(0.0, SessionTimer::RainStep));
        log::info!(
            "[EnemyRain] Start: {} enemies over {:.2}s",
            self.target,
            schedule.duration_seconds
        );
        RainStart::Started
    }

    /// Handle a `RainStep` timer that fell due at `deadline`
    pub fn on_step(
        &mut self,
        deadline: f64,
        world: &mut dyn World,
        timers: &mut Scheduler<SessionTimer>,
    ) -> RainStep {
        if self.state != RainState::Raining {
            return RainStep::Ignored;
        }
        let Some(content) = self.enemy_content else {
            return RainStep::Ignored;
        };

        if self.spawned < self.target {
            let b = self.schedule.bounds;
            let x = if b.min_x < b.max_x {
                self.rng.random_range(b.min_x..=b.max_x)
            } else {
                b.min_x
            };
            let enemy = world.spawn_enemy(content, Vec2::new(x, b.spawn_y));
            self.spawned += 1;
            log::debug!(
                "[EnemyRain] Spawn {}/{} at x={x:.2}",
                self.spawned,
                self.target
            );
            // Chain from the deadline, not the pop time, so frame size never drifts the wave
            let next = deadline + f64::from(self.schedule.interval_seconds);
            self.pending = Some(timers.schedule_at(next, SessionTimer::RainStep));
            RainStep::Spawned(enemy)
        } else {
            self.state = RainState::Idle;
            self.pending = None;
            log::info!("[EnemyRain] Finished after {} spawns", self.spawned);
            RainStep::Finished
        }
    }

    /// Cancel any in-flight wave without reporting completion
    pub fn reset_spawner(&mut self, timers: &mut Scheduler<SessionTimer>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
        if self.state == RainState::Raining {
            log::debug!("[EnemyRain] Reset mid-rain");
        }
        self.state = RainState::Idle;
        self.spawned = 0;
        self.target = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessWorld, WorldCall};
    use proptest::prelude::*;

    const ENEMY: ContentHandle = ContentHandle(99);

    fn schedule(interval: f32, duration: f32) -> RainSchedule {
        RainSchedule {
            interval_seconds: interval,
            duration_seconds: duration,
            bounds: SpawnBounds::default(),
        }
    }

    /// Run the timers in `dt` steps; returns (time, step) for every non-ignored step
    fn run(
        rain: &mut EnemyRainController,
        world: &mut HeadlessWorld,
        timers: &mut Scheduler<SessionTimer>,
        seconds: f32,
        dt: f32,
    ) -> Vec<(f64, RainStep)> {
        let mut out = Vec::new();
        let ticks = (seconds / dt).round() as u32;
        for _ in 0..ticks {
            timers.advance(dt);
            while let Some(due) = timers.pop_due() {
                let step = rain.on_step(due.deadline, world, timers);
                if step != RainStep::Ignored {
                    out.push((due.deadline, step));
                }
            }
        }
        out
    }

    #[test]
    fn test_spawn_count() {
        assert_eq!(schedule(1.0, 5.0).spawn_count(), 5);
        assert_eq!(schedule(0.1, 5.0).spawn_count(), 50);
        assert_eq!(schedule(2.0, 5.0).spawn_count(), 3);
        assert_eq!(schedule(1.0, 0.0).spawn_count(), 0);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut rain = EnemyRainController::new(Some(ENEMY), 1);
        let mut world = HeadlessWorld::new();
        let probe = world.probe();
        let mut timers = Scheduler::new();
        assert_eq!(rain.start_rain(&schedule(1.0, 0.0), &mut timers), RainStart::Started);

        let steps = run(&mut rain, &mut world, &mut timers, 1.0 / 60.0, 1.0 / 60.0);
        assert_eq!(steps, vec![(0.0, RainStep::Finished)]);
        assert_eq!(probe.spawned_total(), 0);
        assert_eq!(rain.state(), RainState::Idle);
    }

    #[test]
    fn test_five_second_wave_spawns_five() {
        let mut rain = EnemyRainController::new(Some(ENEMY), 7);
        let mut world = HeadlessWorld::new();
        let probe = world.probe();
        let mut timers = Scheduler::new();
        rain.start_rain(&schedule(1.0, 5.0), &mut timers);

        let steps = run(&mut rain, &mut world, &mut timers, 6.0, 0.05);
        let spawn_times: Vec<f64> = steps
            .iter()
            .filter(|(_, s)| matches!(s, RainStep::Spawned(_)))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(spawn_times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(steps.last().map(|(t, s)| (*t, *s)), Some((5.0, RainStep::Finished)));
        assert_eq!(probe.spawned_total(), 5);

        let b = SpawnBounds::default();
        for call in probe.calls() {
            if let WorldCall::SpawnEnemy(pos) = call {
                assert!(pos.x >= b.min_x && pos.x <= b.max_x);
                assert_eq!(pos.y, b.spawn_y);
            }
        }
    }

    #[test]
    fn test_start_while_raining_is_noop() {
        let mut rain = EnemyRainController::new(Some(ENEMY), 1);
        let mut timers = Scheduler::new();
        rain.start_rain(&schedule(1.0, 5.0), &mut timers);
        assert_eq!(
            rain.start_rain(&schedule(1.0, 5.0), &mut timers),
            RainStart::AlreadyRaining
        );
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_missing_content_never_starts() {
        let mut rain = EnemyRainController::new(None, 1);
        let mut timers = Scheduler::new();
        assert_eq!(
            rain.start_rain(&schedule(1.0, 5.0), &mut timers),
            RainStart::NoSpawnContent
        );
        assert_eq!(rain.state(), RainState::Idle);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_reset_cancels_without_completion() {
        let mut rain = EnemyRainController::new(Some(ENEMY), 1);
        let mut world = HeadlessWorld::new();
        let mut timers = Scheduler::new();
        rain.start_rain(&schedule(1.0, 5.0), &mut timers);
        let before = run(&mut rain, &mut world, &mut timers, 2.5, 0.1);
        assert_eq!(before.len(), 3);

        rain.reset_spawner(&mut timers);
        assert_eq!(rain.state(), RainState::Idle);
        assert!(timers.is_empty());
        let after = run(&mut rain, &mut world, &mut timers, 10.0, 0.1);
        assert!(after.is_empty());
    }

    proptest! {
        #[test]
        fn prop_wave_matches_schedule(
            interval in 0.05f32..2.0,
            duration in 0.0f32..6.0,
            min_x in -10.0f32..0.0,
            width in 0.0f32..10.0,
            seed in any::<u64>(),
        ) {
            let sched = RainSchedule {
                interval_seconds: interval,
                duration_seconds: duration,
                bounds: SpawnBounds { min_x, max_x: min_x + width, spawn_y: 3.0 },
            };
            let mut rain = EnemyRainController::new(Some(ENEMY), seed);
            let mut world = HeadlessWorld::new();
            let probe = world.probe();
            let mut timers = Scheduler::new();
            rain.start_rain(&sched, &mut timers);

            let steps = run(&mut rain, &mut world, &mut timers, duration + interval * 2.0 + 0.5, 0.02);
            let finished = steps.iter().filter(|(_, s)| *s == RainStep::Finished).count();
            prop_assert_eq!(finished, 1);
            prop_assert_eq!(probe.spawned_total() as u32, sched.spawn_count());
            for (t, s) in &steps {
                if matches!(s, RainStep::Spawned(_)) {
                    // No trailing spawn at or past the duration boundary
                    prop_assert!(*t < f64::from(duration) + 1e-3);
                }
            }
            for (_, pos) in probe.enemies() {
                prop_assert!(pos.x >= sched.bounds.min_x && pos.x <= sched.bounds.max_x);
                prop_assert_eq!(pos.y, 3.0);
            }
        }
    }
}
