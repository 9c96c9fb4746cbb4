//! Fixed timestep accumulator

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Turns variable frame deltas into whole `SIM_DT` steps
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `step(SIM_DT)` as many times as the elapsed frame time allows.
    /// Returns the number of substeps taken.
    pub fn step(&mut self, frame_dt: f32, mut step: impl FnMut(f32)) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Leftover time not yet simulated
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_steps_only() {
        let mut clock = FixedStep::new();
        let mut n = 0;
        assert_eq!(clock.step(SIM_DT * 2.5, |_| n += 1), 2);
        assert_eq!(n, 2);
        assert!(clock.remainder() > 0.0 && clock.remainder() < SIM_DT);
    }

    #[test]
    fn test_huge_frame_is_clamped() {
        let mut clock = FixedStep::new();
        let steps = clock.step(10.0, |_| {});
        assert!(steps <= MAX_SUBSTEPS);
    }
}
