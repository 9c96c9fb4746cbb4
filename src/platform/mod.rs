//! Platform abstraction layer
//!
//! The session core never touches rendering, physics or UI directly. It talks
//! to the host through:
//! - `World`: level content instantiation, enemy spawning, ball positions
//! - `Presentation`: one call per state entry plus the level banner
//!
//! `headless` provides deterministic in-memory implementations of both.

pub mod headless;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use headless::{
    HeadlessWorld, LevelTemplate, RecordingPresentation, Surface, TemplateTarget, WorldCall,
    WorldProbe,
};

/// Opaque reference to instantiable content (a level layout or enemy prefab)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHandle(pub u32);

/// A live instance of level content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(pub u32);

/// A protected ball inside a level instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallHandle(pub u32);

/// A clickable block inside a level instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub u32);

/// A spawned enemy (owned by the world's runtime container)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyHandle(pub u32);

/// Something the demo hand can click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Block(BlockHandle),
    Ball(BallHandle),
}

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A block started falling
    BlockFell,
    /// A ball was activated (physics on)
    BallActivated,
    /// Target already clicked or gone
    Ignored,
}

/// One step of a demo level's scripted hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoStep {
    pub target: ClickTarget,
    /// Pause after the click before moving on (seconds)
    pub wait_after_click: f32,
}

/// What an enemy touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Ball,
    Block,
    Other,
}

/// Snapshot of a freshly instantiated level
#[derive(Debug, Clone, Default)]
pub struct LevelContents {
    /// Number of clickable blocks that must fall before the rain
    pub block_count: usize,
    /// Balls to protect, in level order
    pub balls: Vec<BallHandle>,
    /// Scripted clicks (demo levels only)
    pub demo_steps: Vec<DemoStep>,
}

/// Content instantiation and the physics-owned state the core samples
pub trait World {
    /// Instantiate level content under the level root, naming the instance
    fn instantiate(&mut self, content: ContentHandle, name: &str) -> InstanceHandle;

    /// Destroy a level instance and everything under it
    fn destroy(&mut self, instance: InstanceHandle);

    /// Describe the blocks, balls and demo script of an instance
    fn level_contents(&self, instance: InstanceHandle) -> LevelContents;

    /// Destroy runtime-spawned objects (enemies, transient effects); returns how many
    fn clear_runtime(&mut self) -> usize;

    /// Spawn one enemy into the runtime container
    fn spawn_enemy(&mut self, content: ContentHandle, pos: Vec2) -> EnemyHandle;

    /// Current position of a ball, or `None` once it has been destroyed
    fn ball_position(&self, ball: BallHandle) -> Option<Vec2>;

    /// Perform a scripted click
    fn demo_click(&mut self, target: ClickTarget) -> ClickOutcome;
}

/// UI surfaces, one call per state entry
pub trait Presentation {
    fn show_gameplay_surface(&mut self);
    fn show_pause_overlay(&mut self);
    fn show_win_surface(&mut self);
    fn show_fail_surface(&mut self);
    fn show_demo_surface(&mut self);
    /// Level number banner, shown on non-demo loads
    fn show_level_banner(&mut self, index: usize);
}
