//! Hide Ball headless harness
//!
//! Plays the demo, then every real level with the in-memory world, clicking
//! blocks as a player would and logging each outcome.
//!
//! Usage: `hide-ball [config.json] [save.json]`

#[cfg(not(target_arch = "wasm32"))]
mod harness {
    use std::error::Error;
    use std::path::{Path, PathBuf};

    use glam::Vec2;
    use hide_ball::audio::NullAudio;
    use hide_ball::persistence::{JsonFileStore, MemoryStore, ProgressStore};
    use hide_ball::platform::{
        ContentHandle, HeadlessWorld, LevelTemplate, RecordingPresentation, TemplateTarget,
        WorldProbe,
    };
    use hide_ball::sim::{
        Button, FixedStep, GameState, GameStateMachine, Host, LevelCatalog, LevelEntry,
        NextLevel,
    };
    use hide_ball::{AudioManager, SessionConfig, Settings};

    const DEMO_CONTENT: ContentHandle = ContentHandle(1);
    const ENEMY_CONTENT: ContentHandle = ContentHandle(100);
    /// Level whose ball the harness knocks off the board
    const FALL_LEVEL: usize = 3;
    /// Frame time fed to the fixed-step clock (a 30 Hz display)
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Give up on a level after this much simulated time
    const LEVEL_TIMEOUT: f32 = 60.0;

    fn catalog() -> Result<LevelCatalog, hide_ball::LevelError> {
        LevelCatalog::new(vec![
            LevelEntry::new("demo", DEMO_CONTENT),
            LevelEntry::new("level_1", ContentHandle(2)),
            LevelEntry::new("level_2", ContentHandle(3)),
            LevelEntry::new("level_3", ContentHandle(4)),
        ])
    }

    fn world() -> HeadlessWorld {
        HeadlessWorld::new()
            .with_template(
                DEMO_CONTENT,
                LevelTemplate::new(2, vec![Vec2::new(0.0, 1.0)]).with_demo_script(vec![
                    (TemplateTarget::Block(0), 0.3),
                    (TemplateTarget::Block(1), 0.3),
                    (TemplateTarget::Ball(0), 0.0),
                ]),
            )
            .with_template(
                ContentHandle(2),
                LevelTemplate::new(3, vec![Vec2::new(-1.0, 0.5), Vec2::new(1.0, 0.5)]),
            )
            .with_template(ContentHandle(3), LevelTemplate::new(0, vec![Vec2::ZERO]))
            .with_template(
                ContentHandle(4),
                LevelTemplate::new(2, vec![Vec2::new(0.0, 2.0)]),
            )
    }

    fn config(path: Option<&Path>) -> Result<SessionConfig, hide_ball::ConfigError> {
        match path {
            Some(path) => SessionConfig::load(path),
            None => Ok(SessionConfig {
                enemy_content: Some(ENEMY_CONTENT),
                ..SessionConfig::default()
            }),
        }
    }

    /// Feed frames until the session reaches `until` or `seconds` elapse
    fn run_frames(
        machine: &mut GameStateMachine,
        clock: &mut FixedStep,
        seconds: f32,
        until: impl Fn(GameState) -> bool,
    ) {
        let mut elapsed = 0.0;
        while elapsed < seconds && !until(machine.state()) {
            clock.step(FRAME_DT, |dt| machine.tick(dt));
            elapsed += FRAME_DT;
        }
    }

    fn play_level(
        machine: &mut GameStateMachine,
        clock: &mut FixedStep,
        probe: &WorldProbe,
    ) -> GameState {
        let index = machine.current_level_index().unwrap_or_default();
        for block in probe.blocks() {
            run_frames(machine, clock, 0.25, GameState::is_terminal);
            if probe.click_block(block) {
                machine.on_block_fallen();
            }
        }
        if index == FALL_LEVEL {
            let lose_y = machine.config().fall_lose.lose_y;
            for ball in probe.balls() {
                probe.set_ball_position(ball, Vec2::new(0.0, lose_y - 1.0));
            }
        }
        run_frames(machine, clock, LEVEL_TIMEOUT, GameState::is_terminal);
        machine.state()
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
        let config = config(args.first().map(PathBuf::as_path))?;
        let save_path = args.get(1);

        let settings = match save_path {
            Some(path) => Settings::load(&path.with_file_name("settings.json")),
            None => Settings::default(),
        };
        let store: Box<dyn ProgressStore> = match save_path {
            Some(path) => Box::new(JsonFileStore::open(path)),
            None => Box::new(MemoryStore::new()),
        };

        let world = world();
        let probe = world.probe();
        let host = Host {
            world: Box::new(world),
            presentation: Box::new(RecordingPresentation::new()),
            audio: AudioManager::new(Box::new(NullAudio), settings),
            store,
            settings_path: save_path.map(|path| path.with_file_name("settings.json")),
        };
        let mut machine = GameStateMachine::new(config, catalog()?, host)?;
        let mut clock = FixedStep::new();

        machine.start()?;
        if machine.state() == GameState::Demo {
            log::info!("Watching the demo");
            run_frames(&mut machine, &mut clock, 5.0, |s| s != GameState::Demo);
            machine.press(Button::Play)?;
        }

        let demo_index = machine.levels().config().demo_index;
        let mut played = 0;
        loop {
            let index = machine.current_level_index().unwrap_or_default();
            let outcome = play_level(&mut machine, &mut clock, &probe);
            played += 1;
            log::info!(
                "Level {index}: {outcome:?} at t={:.2}s ({} enemies spawned)",
                machine.now(),
                probe.spawned_total()
            );
            if outcome == GameState::Fail {
                machine.press(Button::Replay)?;
                let retry = play_level(&mut machine, &mut clock, &probe);
                log::info!("Level {index} retry: {retry:?}");
            }
            match machine.next_level()? {
                NextLevel::EndOfContent => break,
                NextLevel::Loaded(next) if Some(next) == demo_index => {
                    log::info!("Wrapped back to the demo");
                    break;
                }
                NextLevel::Loaded(_) => {}
            }
        }

        log::info!("Session over after {played} levels");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Hide Ball (headless) starting...");

    if let Err(e) = harness::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
