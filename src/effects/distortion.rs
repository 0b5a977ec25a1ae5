use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        curve::{clamp_knob, knob_fraction, tables, ParameterCurve},
        distortion::{
            atan_shape, crush_levels, hard_clip, quantize, soft_clip, soft_saturate, tanh_shape,
        },
    },
    effects::{AudioEffect, Levels},
};

/*
Distortion
==========

  drive   0..1000   pre-gain through the DRIVE table (1× at the bottom, 30× at
                    the top). Drive 0 takes the effect out of the path: the
                    output is the input, bit for bit, whatever the algorithm.

  tone    0..1000   per algorithm:
                      BitCrush      quantisation depth, 2^(2 + ⌊tone/50⌋) levels
                      HardClip      clip threshold (low tone = harder)
                      SoftSaturate  knee threshold
                      others        one-pole post filter (1000 = open)

Bit crush also reduces the sample rate: drive sets how many samples each
quantised value is held for.
*/

static DRIVE_CURVE: ParameterCurve = ParameterCurve::from_static(tables::DRIVE);

/// Longest sample-and-hold period for bit crush, in samples.
const MAX_CRUSH_HOLD: u32 = 32;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistortionType {
    Bypass,
    #[default]
    Tanh,
    Atan,
    HardClip,
    SoftClip,
    SoftSaturate,
    BitCrush,
}

impl DistortionType {
    pub const ALL: [DistortionType; 7] = [
        DistortionType::Bypass,
        DistortionType::Tanh,
        DistortionType::Atan,
        DistortionType::HardClip,
        DistortionType::SoftClip,
        DistortionType::SoftSaturate,
        DistortionType::BitCrush,
    ];

    /// Algorithm from a selector value, clamped to the first/last entry.
    pub fn from_index(index: i32) -> Self {
        let last = Self::ALL.len() as i32 - 1;
        Self::ALL[index.clamp(0, last) as usize]
    }

    fn label(self) -> &'static str {
        match self {
            DistortionType::Bypass => "byp",
            DistortionType::Tanh => "tanh",
            DistortionType::Atan => "atan",
            DistortionType::HardClip => "hard",
            DistortionType::SoftClip => "soft",
            DistortionType::SoftSaturate => "sat",
            DistortionType::BitCrush => "crsh",
        }
    }
}

pub struct Distortion {
    kind: DistortionType,
    drive: i32,
    tone: i32,
    pre_gain: f32,
    threshold: f32,
    tone_coeff: f32,
    crush_levels: f32,
    crush_hold: u32,

    hold_counter: [u32; 2],
    held: [f32; 2],
    tone_state: [f32; 2],

    levels: Levels,
}

impl Distortion {
    pub fn new() -> Self {
        let mut distortion = Self {
            kind: DistortionType::default(),
            drive: 0,
            tone: 1000,
            pre_gain: 1.0,
            threshold: 1.0,
            tone_coeff: 1.0,
            crush_levels: crush_levels(1000),
            crush_hold: 1,
            hold_counter: [0; 2],
            held: [0.0; 2],
            tone_state: [0.0; 2],
            levels: Levels::insert(),
        };
        distortion.set_drive(0);
        distortion.set_tone(1000);
        distortion
    }

    pub fn set_type(&mut self, kind: DistortionType) {
        if kind != self.kind {
            self.kind = kind;
            self.reset();
        }
    }

    pub fn kind(&self) -> DistortionType {
        self.kind
    }

    pub fn set_drive(&mut self, knob: i32) {
        self.drive = clamp_knob(knob);
        self.pre_gain = DRIVE_CURVE.evaluate(self.drive).max(1.0);
        self.crush_hold = 1 + (knob_fraction(self.drive) * (MAX_CRUSH_HOLD - 1) as f32) as u32;
    }

    pub fn drive(&self) -> i32 {
        self.drive
    }

    pub fn set_tone(&mut self, knob: i32) {
        self.tone = clamp_knob(knob);
        let fraction = knob_fraction(self.tone);
        self.crush_levels = crush_levels(self.tone);
        self.threshold = 0.1 + 0.9 * fraction;
        self.tone_coeff = 0.05 + 0.95 * fraction;
    }

    pub fn tone(&self) -> i32 {
        self.tone
    }

    pub fn crush_levels(&self) -> f32 {
        self.crush_levels
    }

    pub fn reset(&mut self) {
        self.hold_counter = [0; 2];
        self.held = [0.0; 2];
        self.tone_state = [0.0; 2];
    }

    /// Whether this stage currently changes the signal at all.
    pub fn is_active(&self) -> bool {
        self.drive > 0 && self.kind != DistortionType::Bypass
    }

    fn shape(&mut self, side: usize, x: f32) -> f32 {
        let g = self.pre_gain;
        let shaped = match self.kind {
            DistortionType::Bypass => x,
            DistortionType::Tanh => tanh_shape(x, g),
            DistortionType::Atan => atan_shape(x, g),
            DistortionType::SoftClip => soft_clip(x, g),
            DistortionType::HardClip => return hard_clip(x, g, self.threshold),
            DistortionType::SoftSaturate => return soft_saturate(x, g, self.threshold),
            DistortionType::BitCrush => return self.crush(side, x),
        };
        self.tone_state[side] += self.tone_coeff * (shaped - self.tone_state[side]);
        self.tone_state[side]
    }

    fn crush(&mut self, side: usize, x: f32) -> f32 {
        if self.hold_counter[side] == 0 {
            self.held[side] = quantize(x, self.crush_levels);
            self.hold_counter[side] = self.crush_hold;
        }
        self.hold_counter[side] -= 1;
        self.held[side]
    }

    #[inline]
    fn process_side(&mut self, side: usize, input: f32) -> f32 {
        if !self.is_active() {
            return input;
        }
        let shaped = self.shape(side, input);
        self.levels.apply(input, shaped)
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for Distortion {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process_side(0, left), self.process_side(1, right))
    }

    fn process_mono(&mut self, input: f32) -> f32 {
        self.process_side(0, input)
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    fn mute(&mut self) {
        self.reset();
    }
}

impl fmt::Display for Distortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DST {} d={} t={}",
            self.kind.label(),
            self.drive,
            self.tone
        )
    }
}
