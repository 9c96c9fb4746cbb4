//! Deterministic in-memory world and presentation
//!
//! Used by the native harness and by tests. Balls do not move on their own;
//! callers place them through a `WorldProbe`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use glam::Vec2;

use super::{
    BallHandle, BlockHandle, ClickOutcome, ClickTarget, ContentHandle, DemoStep, EnemyHandle,
    InstanceHandle, LevelContents, Presentation, World,
};

/// Demo click target expressed as an index into a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTarget {
    Block(usize),
    Ball(usize),
}

/// Layout of one level's content
#[derive(Debug, Clone, Default)]
pub struct LevelTemplate {
    pub blocks: usize,
    /// Initial ball positions
    pub balls: Vec<Vec2>,
    /// Scripted demo clicks with the wait after each
    pub demo_script: Vec<(TemplateTarget, f32)>,
}

impl LevelTemplate {
    pub fn new(blocks: usize, balls: Vec<Vec2>) -> Self {
        Self {
            blocks,
            balls,
            demo_script: Vec::new(),
        }
    }

    pub fn with_demo_script(mut self, script: Vec<(TemplateTarget, f32)>) -> Self {
        self.demo_script = script;
        self
    }
}

/// Every mutating call the core made, in order
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCall {
    Instantiate { content: ContentHandle, name: String },
    Destroy(InstanceHandle),
    ClearRuntime(usize),
    SpawnEnemy(Vec2),
    DemoClick(ClickTarget),
}

#[derive(Debug)]
struct Instance {
    handle: InstanceHandle,
    blocks: Vec<BlockHandle>,
    fallen: BTreeSet<BlockHandle>,
    balls: Vec<BallHandle>,
    activated: BTreeSet<BallHandle>,
    demo_steps: Vec<DemoStep>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    templates: HashMap<ContentHandle, LevelTemplate>,
    next_handle: u32,
    instances: Vec<Instance>,
    ball_positions: BTreeMap<BallHandle, Vec2>,
    enemies: BTreeMap<EnemyHandle, Vec2>,
    calls: Vec<WorldCall>,
    spawned_total: usize,
}

impl HeadlessState {
    fn alloc(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// In-memory `World`
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    inner: Rc<RefCell<HeadlessState>>,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the template instantiated for `content`
    pub fn with_template(self, content: ContentHandle, template: LevelTemplate) -> Self {
        self.inner.borrow_mut().templates.insert(content, template);
        self
    }

    /// Shared view for inspecting and driving the world after it is handed off
    pub fn probe(&self) -> WorldProbe {
        WorldProbe {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl World for HeadlessWorld {
    fn instantiate(&mut self, content: ContentHandle, name: &str) -> InstanceHandle {
        let mut st = self.inner.borrow_mut();
        let template = st.templates.get(&content).cloned().unwrap_or_default();
        let handle = InstanceHandle(st.alloc());

        let blocks: Vec<BlockHandle> = (0..template.blocks)
            .map(|_| BlockHandle(st.alloc()))
            .collect();
        let mut balls = Vec::with_capacity(template.balls.len());
        for pos in &template.balls {
            let ball = BallHandle(st.alloc());
            st.ball_positions.insert(ball, *pos);
            balls.push(ball);
        }
        let demo_steps = template
            .demo_script
            .iter()
            .filter_map(|&(target, wait_after_click)| {
                let target = match target {
                    TemplateTarget::Block(i) => ClickTarget::Block(*blocks.get(i)?),
                    TemplateTarget::Ball(i) => ClickTarget::Ball(*balls.get(i)?),
                };
                Some(DemoStep {
                    target,
                    wait_after_click,
                })
            })
            .collect();

        st.instances.push(Instance {
            handle,
            blocks,
            fallen: BTreeSet::new(),
            balls,
            activated: BTreeSet::new(),
            demo_steps,
        });
        st.calls.push(WorldCall::Instantiate {
            content,
            name: name.to_string(),
        });
        handle
    }

    fn destroy(&mut self, instance: InstanceHandle) {
        let mut st = self.inner.borrow_mut();
        if let Some(pos) = st.instances.iter().position(|i| i.handle == instance) {
            let removed = st.instances.remove(pos);
            for ball in removed.balls {
                st.ball_positions.remove(&ball);
            }
        }
        st.calls.push(WorldCall::Destroy(instance));
    }

    fn level_contents(&self, instance: InstanceHandle) -> LevelContents {
        let st = self.inner.borrow();
        st.instances
            .iter()
            .find(|i| i.handle == instance)
            .map(|i| LevelContents {
                block_count: i.blocks.len(),
                balls: i.balls.clone(),
                demo_steps: i.demo_steps.clone(),
            })
            .unwrap_or_default()
    }

    fn clear_runtime(&mut self) -> usize {
        let mut st = self.inner.borrow_mut();
        let cleared = st.enemies.len();
        st.enemies.clear();
        st.calls.push(WorldCall::ClearRuntime(cleared));
        cleared
    }

    fn spawn_enemy(&mut self, _content: ContentHandle, pos: Vec2) -> EnemyHandle {
        let mut st = self.inner.borrow_mut();
        let handle = EnemyHandle(st.alloc());
        st.enemies.insert(handle, pos);
        st.spawned_total += 1;
        st.calls.push(WorldCall::SpawnEnemy(pos));
        handle
    }

    fn ball_position(&self, ball: BallHandle) -> Option<Vec2> {
        self.inner.borrow().ball_positions.get(&ball).copied()
    }

    fn demo_click(&mut self, target: ClickTarget) -> ClickOutcome {
        let mut st = self.inner.borrow_mut();
        st.calls.push(WorldCall::DemoClick(target));
        let Some(instance) = st.instances.last_mut() else {
            return ClickOutcome::Ignored;
        };
        match target {
            ClickTarget::Block(block) => {
                if instance.blocks.contains(&block) && instance.fallen.insert(block) {
                    ClickOutcome::BlockFell
                } else {
                    ClickOutcome::Ignored
                }
            }
            ClickTarget::Ball(ball) => {
                if instance.balls.contains(&ball) && instance.activated.insert(ball) {
                    ClickOutcome::BallActivated
                } else {
                    ClickOutcome::Ignored
                }
            }
        }
    }
}

/// Handle for driving a `HeadlessWorld` from outside the session
#[derive(Debug, Clone)]
pub struct WorldProbe {
    inner: Rc<RefCell<HeadlessState>>,
}

impl WorldProbe {
    /// Balls of the most recently instantiated level
    pub fn balls(&self) -> Vec<BallHandle> {
        self.inner
            .borrow()
            .instances
            .last()
            .map(|i| i.balls.clone())
            .unwrap_or_default()
    }

    /// Blocks of the most recently instantiated level
    pub fn blocks(&self) -> Vec<BlockHandle> {
        self.inner
            .borrow()
            .instances
            .last()
            .map(|i| i.blocks.clone())
            .unwrap_or_default()
    }

    /// Click a block as the player would; `true` if it started falling
    pub fn click_block(&self, block: BlockHandle) -> bool {
        let mut st = self.inner.borrow_mut();
        st.instances
            .last_mut()
            .map(|i| i.blocks.contains(&block) && i.fallen.insert(block))
            .unwrap_or(false)
    }

    pub fn set_ball_position(&self, ball: BallHandle, pos: Vec2) {
        let mut st = self.inner.borrow_mut();
        if let Some(p) = st.ball_positions.get_mut(&ball) {
            *p = pos;
        }
    }

    /// Destroy a ball without touching the level
    pub fn destroy_ball(&self, ball: BallHandle) {
        self.inner.borrow_mut().ball_positions.remove(&ball);
    }

    /// Live enemies and their spawn positions
    pub fn enemies(&self) -> Vec<(EnemyHandle, Vec2)> {
        self.inner
            .borrow()
            .enemies
            .iter()
            .map(|(h, p)| (*h, *p))
            .collect()
    }

    /// Remove an enemy as if it fell off screen; `true` if it was alive
    pub fn despawn_enemy(&self, enemy: EnemyHandle) -> bool {
        self.inner.borrow_mut().enemies.remove(&enemy).is_some()
    }

    /// Enemies spawned over the world's lifetime
    pub fn spawned_total(&self) -> usize {
        self.inner.borrow().spawned_total
    }

    pub fn live_instances(&self) -> usize {
        self.inner.borrow().instances.len()
    }

    pub fn calls(&self) -> Vec<WorldCall> {
        self.inner.borrow().calls.clone()
    }
}

/// Presentation call, recorded in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Gameplay,
    Pause,
    Win,
    Fail,
    Demo,
    LevelBanner(usize),
}

/// `Presentation` that logs and records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    shown: Rc<RefCell<Vec<Surface>>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything shown so far (shared with clones)
    pub fn shown(&self) -> Vec<Surface> {
        self.shown.borrow().clone()
    }

    fn push(&mut self, surface: Surface) {
        log::info!("[UI] {:?}", surface);
        self.shown.borrow_mut().push(surface);
    }
}

impl Presentation for RecordingPresentation {
    fn show_gameplay_surface(&mut self) {
        self.push(Surface::Gameplay);
    }

    fn show_pause_overlay(&mut self) {
        self.push(Surface::Pause);
    }

    fn show_win_surface(&mut self) {
        self.push(Surface::Win);
    }

    fn show_fail_surface(&mut self) {
        self.push(Surface::Fail);
    }

    fn show_demo_surface(&mut self) {
        self.push(Surface::Demo);
    }

    fn show_level_banner(&mut self, index: usize) {
        self.push(Surface::LevelBanner(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> HeadlessWorld {
        HeadlessWorld::new().with_template(
            ContentHandle(1),
            LevelTemplate::new(2, vec![Vec2::new(0.0, 1.0)])
                .with_demo_script(vec![(TemplateTarget::Block(1), 0.4), (TemplateTarget::Block(9), 0.4)]),
        )
    }

    #[test]
    fn test_instantiate_and_destroy() {
        let mut world = world();
        let probe = world.probe();
        let inst = world.instantiate(ContentHandle(1), "Level_0");
        let contents = world.level_contents(inst);
        assert_eq!(contents.block_count, 2);
        assert_eq!(contents.balls.len(), 1);
        // Out-of-range script targets are dropped
        assert_eq!(contents.demo_steps.len(), 1);
        assert_eq!(world.ball_position(contents.balls[0]), Some(Vec2::new(0.0, 1.0)));

        world.destroy(inst);
        assert_eq!(probe.live_instances(), 0);
        assert_eq!(world.ball_position(contents.balls[0]), None);
    }

    #[test]
    fn test_demo_click_only_once() {
        let mut world = world();
        let inst = world.instantiate(ContentHandle(1), "demo");
        let step = world.level_contents(inst).demo_steps[0];
        assert_eq!(world.demo_click(step.target), ClickOutcome::BlockFell);
        assert_eq!(world.demo_click(step.target), ClickOutcome::Ignored);
    }

    #[test]
    fn test_runtime_clear() {
        let mut world = world();
        let probe = world.probe();
        world.spawn_enemy(ContentHandle(9), Vec2::new(0.5, 6.0));
        world.spawn_enemy(ContentHandle(9), Vec2::new(-0.5, 6.0));
        assert_eq!(probe.enemies().len(), 2);
        assert_eq!(world.clear_runtime(), 2);
        assert!(probe.enemies().is_empty());
        assert_eq!(probe.spawned_total(), 2);
    }
}
