use std::fmt;

use crate::{
    dsp::mix::{pan_gains, PAN_MAX, PAN_MIN},
    effects::{AudioEffect, Levels},
};

/// Equal-power panner. Stereo input is summed to mono first.
pub struct Panner {
    position: i32,
    gains: (f32, f32),
    levels: Levels,
}

impl Panner {
    pub fn new() -> Self {
        Self {
            position: 0,
            gains: pan_gains(0),
            levels: Levels::insert(),
        }
    }

    /// Pan knob, -50 (hard right) ..= 50 (hard left).
    pub fn set_position(&mut self, knob: i32) {
        self.position = knob.clamp(PAN_MIN, PAN_MAX);
        self.gains = pan_gains(self.position);
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn gains(&self) -> (f32, f32) {
        self.gains
    }

    /// Place a mono sample in the stereo field.
    #[inline]
    pub fn pan(&self, input: f32) -> (f32, f32) {
        let level = self.levels.level;
        (input * self.gains.0 * level, input * self.gains.1 * level)
    }
}

impl Default for Panner {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for Panner {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.pan((left + right) * 0.5)
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }
}

impl fmt::Display for Panner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            0 => write!(f, "PAN C"),
            p if p > 0 => write!(f, "PAN L{}", p),
            p => write!(f, "PAN R{}", -p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_is_preserved_across_the_range() {
        let mut panner = Panner::new();
        for knob in PAN_MIN..=PAN_MAX {
            panner.set_position(knob);
            let (l, r) = panner.pan(1.0);
            assert!((l * l + r * r - 1.0).abs() < 1e-3, "knob {}", knob);
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        let mut panner = Panner::new();
        panner.set_position(-400);
        assert_eq!(panner.position(), PAN_MIN);
        let (l, r) = panner.pan(1.0);
        assert!(l.abs() < 1e-6);
        assert!((r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_input_is_summed() {
        let mut panner = Panner::new();
        panner.set_position(50);
        let (l, r) = panner.process(1.0, 0.0);
        assert!((l - 0.5).abs() < 1e-6);
        assert!(r.abs() < 1e-6);
    }

    #[test]
    fn test_display() {
        let mut panner = Panner::new();
        assert_eq!(panner.to_string(), "PAN C");
        panner.set_position(-20);
        assert_eq!(panner.to_string(), "PAN R20");
    }
}
