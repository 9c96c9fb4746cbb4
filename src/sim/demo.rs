//! Scripted hand for the demo level

use super::schedule::{Scheduler, TaskHandle};
use super::state::SessionTimer;
use crate::platform::{ClickOutcome, DemoStep, World};

/// Plays a demo level's click script on simulation time: travel, click, wait, repeat
#[derive(Debug, Default)]
pub struct DemoDriver {
    steps: Vec<DemoStep>,
    next: usize,
    hand_travel: f32,
    pending: Option<TaskHandle>,
}

impl DemoDriver {
    pub fn new(hand_travel: f32) -> Self {
        Self {
            hand_travel: hand_travel.max(0.0),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the script and schedule its first click
    pub fn begin(&mut self, steps: Vec<DemoStep>, timers: &mut Scheduler<SessionTimer>) {
        self.cancel(timers);
        self.steps = steps;
        if self.steps.is_empty() {
            return;
        }
        log::debug!("[Demo] Script of {} steps", self.steps.len());
        self.pending = Some(timers.schedule_in(self.hand_travel, SessionTimer::DemoStep(0)));
    }

    pub fn cancel(&mut self, timers: &mut Scheduler<SessionTimer>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
            log::debug!("[Demo] Script cancelled at step {}", self.next);
        }
        self.steps.clear();
        self.next = 0;
    }

    /// Perform step `index` and queue the next one
    pub fn on_step(
        &mut self,
        index: usize,
        world: &mut dyn World,
        timers: &mut Scheduler<SessionTimer>,
    ) -> Option<ClickOutcome> {
        if index != self.next {
            return None;
        }
        let step = *self.steps.get(index)?;
        self.pending = None;

        let outcome = world.demo_click(step.target);
        log::debug!("[Demo] Step {index}: {:?} -> {outcome:?}", step.target);
        self.next = index + 1;
        if self.next < self.steps.len() {
            let delay = step.wait_after_click.max(0.0) + self.hand_travel;
            self.pending = Some(timers.schedule_in(delay, SessionTimer::DemoStep(self.next)));
        }
        Some(outcome)
    }
}
