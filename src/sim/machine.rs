//! Game state machine
//!
//! Top-level controller for one play session. Owns the current `GameState`,
//! the `LevelSession` counters and every timer, and is the only place that
//! talks to presentation and audio.
//!
//! Driving it:
//! - `start()` once, then `tick(SIM_DT)` per fixed step
//! - block/hazard/enemy notifications from the interaction layer as they happen
//! - `press(Button)` (or the individual actions) for UI input

use std::path::PathBuf;

use super::catalog::LevelCatalog;
use super::demo::DemoDriver;
use super::level::{LevelEvent, LevelLifecycleManager, NextLevel};
use super::outcome::{LevelSession, SessionOutcomeEvaluator, Verdict};
use super::rain::{EnemyRainController, RainStart, RainState, RainStep};
use super::schedule::{Due, Scheduler};
use super::state::{GameState, SessionTimer};
use crate::audio::{AudioManager, SoundCue};
use crate::config::SessionConfig;
use crate::error::{ConfigError, LevelError};
use crate::persistence::ProgressStore;
use crate::platform::{ClickOutcome, ContactKind, InstanceHandle, Presentation, World};
use crate::settings::Settings;

/// Collaborators the session talks to
pub struct Host {
    pub world: Box<dyn World>,
    pub presentation: Box<dyn Presentation>,
    pub audio: AudioManager,
    pub store: Box<dyn ProgressStore>,
    /// Where toggled settings are written; `None` keeps them in memory
    pub settings_path: Option<PathBuf>,
}

/// UI buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Pause,
    Resume,
    Replay,
    Next,
    /// Leave the demo for the first real level
    Play,
    /// Back to the default start level
    RollBack,
}

pub struct GameStateMachine {
    config: SessionConfig,
    state: GameState,
    /// False until the first state entry ran its side effects
    entered: bool,
    time_scale: f32,
    levels: LevelLifecycleManager,
    session: Option<LevelSession>,
    rain: EnemyRainController,
    outcome: SessionOutcomeEvaluator,
    demo: DemoDriver,
    timers: Scheduler<SessionTimer>,
    host: Host,
}

impl GameStateMachine {
    /// Validate the configuration and wire up the session. Nothing is loaded until `start`.
    pub fn new(
        config: SessionConfig,
        catalog: LevelCatalog,
        host: Host,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if catalog.is_empty() {
            log::error!("[GameStateMachine] Level catalog is empty");
            return Err(LevelError::EmptyCatalog.into());
        }
        if config.enemy_content.is_none() {
            log::warn!("[GameStateMachine] No enemy content configured, levels will not rain");
        }

        let state = config.initial_state;
        Ok(Self {
            levels: LevelLifecycleManager::new(catalog, config.levels.clone()),
            rain: EnemyRainController::new(config.enemy_content, config.rng_seed),
            outcome: SessionOutcomeEvaluator::new(
                config.survive_extra_time,
                config.require_clear_field,
            ),
            demo: DemoDriver::new(config.demo.hand_travel_seconds),
            timers: Scheduler::new(),
            session: None,
            time_scale: state.time_scale(),
            entered: false,
            state,
            config,
            host,
        })
    }

    /// Load the startup level and start the music
    pub fn start(&mut self) -> Result<usize, LevelError> {
        self.host.audio.play_music();
        let result = self
            .levels
            .start(self.host.world.as_mut(), self.host.store.as_mut());
        self.process_level_events();
        result
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Counters of the level in play
    pub fn session(&self) -> Option<&LevelSession> {
        self.session.as_ref()
    }

    pub fn current_level_index(&self) -> Option<usize> {
        self.levels.current_index()
    }

    pub fn current_instance(&self) -> Option<InstanceHandle> {
        self.levels.current_instance()
    }

    pub fn levels(&self) -> &LevelLifecycleManager {
        &self.levels
    }

    pub fn rain_state(&self) -> RainState {
        self.rain.state()
    }

    /// Scaled simulation time since the session was created
    pub fn now(&self) -> f64 {
        self.timers.now()
    }

    /// Timers still outstanding
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.host.store.as_ref()
    }

    pub fn settings(&self) -> Settings {
        self.host.audio.settings()
    }

    pub fn set_sound(&mut self, on: bool) {
        self.host.audio.set_sound(on);
        self.save_settings();
    }

    pub fn set_music(&mut self, on: bool) {
        self.host.audio.set_music(on);
        self.save_settings();
    }

    pub fn set_vibration(&mut self, on: bool) {
        self.host.audio.set_vibration(on);
        self.save_settings();
    }

    fn save_settings(&self) {
        let Some(path) = self.host.settings_path.as_deref() else {
            return;
        };
        if let Err(e) = self.host.audio.settings().save(path) {
            log::error!("[GameStateMachine] Failed to save settings {}: {e}", path.display());
        }
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Advance one fixed step: fall-out check, then due timers in deadline order
    pub fn tick(&mut self, dt: f32) {
        if self.state == GameState::Gameplay {
            self.check_fall_out();
        }

        let scaled = dt * self.time_scale;
        if scaled <= 0.0 {
            return;
        }
        self.timers.advance(scaled);

        while let Some(due) = self.timers.pop_due() {
            self.dispatch(due);
            // A handler froze time (Win/Fail); later timers wait for the next session
            if self.time_scale == 0.0 {
                break;
            }
        }
    }

    fn dispatch(&mut self, due: Due<SessionTimer>) {
        match due.payload {
            SessionTimer::RainStep => {
                let step = self.rain.on_step(
                    due.deadline,
                    self.host.world.as_mut(),
                    &mut self.timers,
                );
                match step {
                    RainStep::Spawned(_) => {
                        if let Some(session) = self.session.as_mut() {
                            session.live_hazards += 1;
                        }
                    }
                    RainStep::Finished => self.on_rain_finished(),
                    RainStep::Ignored => {}
                }
            }
            SessionTimer::GraceExpired => {
                let Some(session) = self.session.as_ref() else {
                    return;
                };
                match self.outcome.on_grace_expired(self.state, session) {
                    Verdict::Win => {
                        log::info!("[GameStateMachine] Survived the rain");
                        self.set_state(GameState::Win);
                    }
                    Verdict::Deferred | Verdict::Replay | Verdict::None => {}
                }
            }
            SessionTimer::DemoReplay => {
                if self.outcome.on_demo_replay_due(self.state) == Verdict::Replay {
                    log::info!("[GameStateMachine] Demo finished, replaying");
                    if let Err(e) = self.restart() {
                        log::error!("[GameStateMachine] Demo replay failed: {e}");
                    }
                }
            }
            SessionTimer::DemoStep(index) => {
                if self.state != GameState::Demo {
                    return;
                }
                let outcome =
                    self.demo
                        .on_step(index, self.host.world.as_mut(), &mut self.timers);
                if outcome == Some(ClickOutcome::BlockFell) {
                    self.on_block_fallen();
                }
            }
        }
    }

    /// Balls below the lose line count as hit. Destroyed balls are skipped.
    fn check_fall_out(&mut self) {
        if !self.config.fall_lose.enabled {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let lose_y = self.config.fall_lose.lose_y;
        let world = self.host.world.as_ref();
        let fell = session
            .active_balls
            .iter()
            .filter_map(|&ball| world.ball_position(ball).map(|pos| (ball, pos)))
            .find(|(_, pos)| pos.y < lose_y);

        if let Some((ball, pos)) = fell {
            log::info!(
                "[GameStateMachine] Ball {:?} fell below {lose_y} (y = {:.2})",
                ball,
                pos.y
            );
            self.on_hazard_hit();
        }
    }

    fn on_rain_finished(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.outcome
            .on_rain_finished(self.state, session, &mut self.timers);
    }

    fn start_rain(&mut self) {
        match self.rain.start_rain(&self.config.rain, &mut self.timers) {
            RainStart::Started => log::info!("[GameStateMachine] All blocks down, rain begins"),
            RainStart::AlreadyRaining | RainStart::NoSpawnContent => {}
        }
    }

    // ------------------------------------------------------------------
    // Notifications from the interaction layer
    // ------------------------------------------------------------------

    /// A block finished its click and is falling
    pub fn on_block_fallen(&mut self) {
        if !self.state.is_live() {
            log::debug!("[GameStateMachine] Block fell in {:?}, ignored", self.state);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.host.audio.play(SoundCue::BlockClick);
        let trigger = session.record_fallen();
        log::debug!(
            "[GameStateMachine] Blocks fallen {}/{}",
            session.fallen_blocks,
            session.total_blocks
        );
        if trigger {
            self.start_rain();
        }
    }

    /// A protected ball was hit (or fell out). Fails the level from Gameplay or Pause.
    pub fn on_hazard_hit(&mut self) {
        match self.state {
            GameState::Gameplay | GameState::Pause => {}
            GameState::Demo | GameState::Win | GameState::Fail => {
                log::debug!("[GameStateMachine] Hazard hit in {:?}, ignored", self.state);
                return;
            }
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.ball_hit = true;
        self.outcome.on_hazard_hit(&mut self.timers);
        self.set_state(GameState::Fail);
    }

    /// A rain enemy left the field
    pub fn on_enemy_despawned(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.live_hazards = session.live_hazards.saturating_sub(1);
        if self.outcome.on_field_cleared(self.state, session) == Verdict::Win {
            log::info!("[GameStateMachine] Field cleared");
            self.set_state(GameState::Win);
        }
    }

    /// An enemy touched something. Touching a ball is a hazard hit.
    pub fn on_enemy_contact(&mut self, kind: ContactKind) {
        match kind {
            ContactKind::Ball => {
                self.host.audio.play(SoundCue::EnemyHitBall);
                self.on_hazard_hit();
            }
            ContactKind::Block => self.host.audio.play(SoundCue::EnemyHitBlock),
            ContactKind::Other => self.host.audio.play(SoundCue::MergeBall),
        }
    }

    pub fn on_ball_clicked(&mut self) {
        if self.state.is_live() {
            self.host.audio.play(SoundCue::BallClick);
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    pub fn request_pause(&mut self) {
        if self.state == GameState::Gameplay {
            self.set_state(GameState::Pause);
        } else {
            log::debug!("[GameStateMachine] Pause ignored in {:?}", self.state);
        }
    }

    pub fn request_resume(&mut self) {
        if self.state == GameState::Pause {
            self.set_state(GameState::Gameplay);
            // The field may have cleared while paused
            let cleared = self
                .session
                .as_ref()
                .map(|session| self.outcome.on_field_cleared(self.state, session));
            if cleared == Some(Verdict::Win) {
                log::info!("[GameStateMachine] Field cleared during pause");
                self.set_state(GameState::Win);
            }
        } else {
            log::debug!("[GameStateMachine] Resume ignored in {:?}", self.state);
        }
    }

    /// Reload the current level; `None` if nothing has loaded yet
    pub fn restart(&mut self) -> Result<Option<usize>, LevelError> {
        let result = self
            .levels
            .replay(self.host.world.as_mut(), self.host.store.as_mut());
        self.process_level_events();
        result
    }

    pub fn next_level(&mut self) -> Result<NextLevel, LevelError> {
        let result = self
            .levels
            .next_level(self.host.world.as_mut(), self.host.store.as_mut());
        self.process_level_events();
        result
    }

    pub fn load_level(&mut self, index: usize) -> Result<usize, LevelError> {
        let result = self
            .levels
            .load_level(index, self.host.world.as_mut(), self.host.store.as_mut());
        self.process_level_events();
        result
    }

    pub fn load_level_by_id(&mut self, id: &str) -> Result<usize, LevelError> {
        let result = self
            .levels
            .load_level_by_id(id, self.host.world.as_mut(), self.host.store.as_mut());
        self.process_level_events();
        result
    }

    /// Leave the demo: remember the intro was seen and load the first real level
    pub fn start_real_game(&mut self) -> Result<usize, LevelError> {
        self.host.store.set_seen_intro(true);
        self.load_level(self.config.levels.first_real_index)
    }

    pub fn roll_back(&mut self) -> Result<usize, LevelError> {
        self.load_level(self.config.levels.default_start_index)
    }

    /// UI button: click cue, then the matching action
    pub fn press(&mut self, button: Button) -> Result<(), LevelError> {
        self.host.audio.play(SoundCue::Button);
        match button {
            Button::Pause => self.request_pause(),
            Button::Resume => self.request_resume(),
            Button::Replay => {
                self.restart()?;
            }
            Button::Next => {
                if self.next_level()? == NextLevel::EndOfContent {
                    log::info!("[GameStateMachine] No more levels");
                }
            }
            Button::Play => {
                self.start_real_game()?;
            }
            Button::RollBack => {
                self.roll_back()?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Level events and state entry
    // ------------------------------------------------------------------

    fn process_level_events(&mut self) {
        while let Some(event) = self.levels.pop_event() {
            match event {
                LevelEvent::Unloaded { index } => {
                    log::info!("[GameStateMachine] Level {index} unloaded");
                }
                LevelEvent::Loaded { instance, index } => self.setup_level(instance, index),
            }
        }
    }

    /// Fresh session for a just-loaded level. Every wait from the previous one is dropped.
    fn setup_level(&mut self, instance: InstanceHandle, index: usize) {
        self.rain.reset_spawner(&mut self.timers);
        self.outcome.cancel(&mut self.timers);
        self.demo.cancel(&mut self.timers);
        self.timers.clear();

        let contents = self.host.world.level_contents(instance);
        let is_demo = self.config.levels.demo_index == Some(index);
        self.session = Some(LevelSession::new(index, &contents));
        log::info!(
            "[GameStateMachine] Level {index} ready: {} blocks, {} balls{}",
            contents.block_count,
            contents.balls.len(),
            if is_demo { " (demo)" } else { "" }
        );

        if is_demo {
            self.set_state(GameState::Demo);
            self.demo.begin(contents.demo_steps, &mut self.timers);
        } else {
            self.set_state(GameState::Gameplay);
            self.host.presentation.show_level_banner(index);
        }

        let zero_blocks = self
            .session
            .as_mut()
            .is_some_and(LevelSession::arm_rain_if_complete);
        if zero_blocks {
            self.start_rain();
        }
    }

    /// Transition and run the entry side effects. Re-entering the current state does nothing.
    fn set_state(&mut self, next: GameState) {
        if self.entered && self.state == next {
            log::debug!("[GameStateMachine] Already in {next:?}");
            return;
        }
        let previous = self.state;
        self.state = next;
        self.entered = true;
        self.time_scale = next.time_scale();
        log::info!("[GameStateMachine] {previous:?} -> {next:?}");

        if previous == GameState::Demo && next != GameState::Demo {
            self.demo.cancel(&mut self.timers);
        }

        match next {
            GameState::Gameplay => self.host.presentation.show_gameplay_surface(),
            GameState::Pause => self.host.presentation.show_pause_overlay(),
            GameState::Demo => self.host.presentation.show_demo_surface(),
            GameState::Win => {
                self.outcome.cancel(&mut self.timers);
                self.host.presentation.show_win_surface();
                self.host.audio.play(SoundCue::Win);
            }
            GameState::Fail => {
                self.outcome.cancel(&mut self.timers);
                self.host.presentation.show_fail_surface();
                self.host.audio.play(SoundCue::Lose);
                self.host.audio.vibrate();
            }
        }
    }
}
