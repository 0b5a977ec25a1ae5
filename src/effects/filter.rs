use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        curve::{clamp_bipolar, clamp_knob, knob_fraction, tables, ParameterCurve},
        filter::{FilterType, LadderFilter, SVFilter},
    },
    effects::{AudioEffect, Levels},
};

/*
Knob Filter
===========

The panel filter is a lowpass with two interchangeable cores:

  StateVariable   12 dB/oct TPT SVF, clean, resonance up to the edge of
                  self-oscillation.
  Ladder          24 dB/oct four-pole cascade with saturated feedback, darker
                  and thicker.
  Bypass          Input copied straight through.

Frequency is a 0..1000 knob passed through the CUTOFF_HZ table. An envelope
(or anything else) modulates it through a signed offset in knob units:

    effective = clamp(base + offset, 0, 1000)
    cutoff    = CUTOFF_HZ(effective)

so an offset of +500 opens a closed filter halfway up the table, regardless of
where the table puts that in Hz.


DJ Filter
=========

One knob, -1000..1000, two filters:

    -1000 ◀──────── lowpass closing ──── | ──── highpass opening ────────▶ +1000
                                      deadband
                                      (bypass)

Turning left lowers a lowpass from fully open, turning right raises a
highpass from fully closed. Around the centre both are out of the path.
With hard mute enabled, the last few percent of travel at either end cut the
signal completely.
*/

static CUTOFF_CURVE: ParameterCurve = ParameterCurve::from_static(tables::CUTOFF_HZ);

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Bypass,
    #[default]
    StateVariable,
    Ladder,
}

impl FilterMode {
    /// Mode from a selector value: 0 bypass, 1 state variable, 2 ladder.
    /// Anything else clamps to the nearest end.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 2) {
            0 => FilterMode::Bypass,
            1 => FilterMode::StateVariable,
            _ => FilterMode::Ladder,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FilterMode::Bypass => "byp",
            FilterMode::StateVariable => "svf",
            FilterMode::Ladder => "ldr",
        }
    }
}

/// Stereo knob-controlled lowpass. Mono users process through the left side.
pub struct Filter {
    sample_rate: f32,
    mode: FilterMode,
    frequency: i32,
    offset: i32,
    resonance: f32,
    cutoff_hz: f32,
    svf: [SVFilter; 2],
    ladder: [LadderFilter; 2],
    levels: Levels,
}

impl Filter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            mode: FilterMode::default(),
            frequency: 1000,
            offset: 0,
            resonance: 0.0,
            cutoff_hz: CUTOFF_CURVE.evaluate(1000),
            svf: [
                SVFilter::new(FilterType::LowPass, sample_rate),
                SVFilter::new(FilterType::LowPass, sample_rate),
            ],
            ladder: [LadderFilter::new(sample_rate), LadderFilter::new(sample_rate)],
            levels: Levels::insert(),
        };
        filter.update_cutoff();
        filter
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for svf in &mut self.svf {
            svf.init(sample_rate);
        }
        for ladder in &mut self.ladder {
            ladder.init(sample_rate);
        }
        self.update_cutoff();
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        if mode != self.mode {
            self.mode = mode;
            self.reset();
            self.update_cutoff();
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Base frequency knob, 0..=1000.
    pub fn set_frequency(&mut self, knob: i32) {
        let knob = clamp_knob(knob);
        if knob != self.frequency {
            self.frequency = knob;
            self.update_cutoff();
        }
    }

    /// Signed modulation offset in knob units, -1000..=1000.
    pub fn set_offset(&mut self, offset: i32) {
        let offset = clamp_bipolar(offset);
        if offset != self.offset {
            self.offset = offset;
            self.update_cutoff();
        }
    }

    /// 0.0..=1.0.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
        for svf in &mut self.svf {
            svf.set_resonance(self.resonance);
        }
        for ladder in &mut self.ladder {
            ladder.set_resonance(self.resonance);
        }
    }

    pub fn set_resonance_knob(&mut self, knob: i32) {
        self.set_resonance(knob_fraction(knob));
    }

    pub fn frequency(&self) -> i32 {
        self.frequency
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Cutoff currently in effect, after offset and clamping.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn effective_knob(&self) -> i32 {
        clamp_knob(self.frequency + self.offset)
    }

    pub fn reset(&mut self) {
        for svf in &mut self.svf {
            svf.reset();
        }
        for ladder in &mut self.ladder {
            ladder.reset();
        }
    }

    fn update_cutoff(&mut self) {
        let hz = CUTOFF_CURVE.evaluate(self.effective_knob());
        // Only the active core needs fresh coefficients; a mode switch
        // lands back here.
        match self.mode {
            FilterMode::Bypass => {}
            FilterMode::StateVariable => {
                for svf in &mut self.svf {
                    svf.set_cutoff(hz);
                }
            }
            FilterMode::Ladder => {
                for ladder in &mut self.ladder {
                    ladder.set_cutoff(hz);
                }
            }
        }
        self.cutoff_hz = match self.mode {
            FilterMode::StateVariable => self.svf[0].cutoff(),
            FilterMode::Ladder => self.ladder[0].cutoff(),
            FilterMode::Bypass => hz,
        };
    }

    #[inline]
    fn process_side(&mut self, side: usize, input: f32) -> f32 {
        let filtered = match self.mode {
            FilterMode::Bypass => input,
            FilterMode::StateVariable => self.svf[side].process(input),
            FilterMode::Ladder => self.ladder[side].process(input),
        };
        self.levels.apply(input, filtered)
    }
}

impl AudioEffect for Filter {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        if self.levels.is_muted() {
            return (0.0, 0.0);
        }
        (self.process_side(0, left), self.process_side(1, right))
    }

    fn process_mono(&mut self, input: f32) -> f32 {
        if self.levels.is_muted() {
            return 0.0;
        }
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

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FLT {} f={}{:+} {:.0}Hz q={:.2}",
            self.mode.label(),
            self.frequency,
            self.offset,
            self.cutoff_hz,
            self.resonance
        )
    }
}

/// Knob distance from centre that still counts as centred.
pub const DJ_DEADBAND: i32 = 20;

/// Knob distance from centre beyond which hard mute engages.
pub const DJ_MUTE_ZONE: i32 = 980;

/// Resonance used by both DJ filter sides unless changed.
pub const DJ_RESONANCE: f32 = 0.3;

/// Single-knob lowpass/highpass sweep.
pub struct DjFilter {
    knob: i32,
    hard_mute: bool,
    lowpass: [SVFilter; 2],
    highpass: [SVFilter; 2],
    levels: Levels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DjRegion {
    Open,
    Lowpass,
    Highpass,
    Muted,
}

impl DjFilter {
    pub fn new(sample_rate: f32) -> Self {
        let side = |filter_type| {
            let mut svf = SVFilter::new(filter_type, sample_rate);
            svf.set_resonance(DJ_RESONANCE);
            svf
        };
        Self {
            knob: 0,
            hard_mute: false,
            lowpass: [side(FilterType::LowPass), side(FilterType::LowPass)],
            highpass: [side(FilterType::HighPass), side(FilterType::HighPass)],
            levels: Levels::insert(),
        }
    }

    pub fn init(&mut self, sample_rate: f32) {
        for svf in self.lowpass.iter_mut().chain(self.highpass.iter_mut()) {
            svf.init(sample_rate);
        }
        self.apply_knob();
    }

    /// Sweep position, -1000..=1000.
    pub fn set_position(&mut self, knob: i32) {
        let knob = clamp_bipolar(knob);
        if knob == self.knob {
            return;
        }
        let before = self.region();
        self.knob = knob;
        if self.region() != before {
            self.reset();
        }
        self.apply_knob();
    }

    pub fn set_hard_mute(&mut self, enabled: bool) {
        self.hard_mute = enabled;
        self.apply_knob();
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        for svf in self.lowpass.iter_mut().chain(self.highpass.iter_mut()) {
            svf.set_resonance(resonance);
        }
    }

    pub fn position(&self) -> i32 {
        self.knob
    }

    pub fn resonance(&self) -> f32 {
        self.lowpass[0].resonance()
    }

    pub fn hard_mute(&self) -> bool {
        self.hard_mute
    }

    /// Cutoff of whichever side is active, `None` when bypassed or muted.
    pub fn cutoff_hz(&self) -> Option<f32> {
        match self.region() {
            DjRegion::Lowpass => Some(self.lowpass[0].cutoff()),
            DjRegion::Highpass => Some(self.highpass[0].cutoff()),
            DjRegion::Open | DjRegion::Muted => None,
        }
    }

    pub fn reset(&mut self) {
        for svf in self.lowpass.iter_mut().chain(self.highpass.iter_mut()) {
            svf.reset();
        }
    }

    fn region(&self) -> DjRegion {
        let distance = self.knob.abs();
        if self.hard_mute && distance >= DJ_MUTE_ZONE {
            DjRegion::Muted
        } else if distance <= DJ_DEADBAND {
            DjRegion::Open
        } else if self.knob < 0 {
            DjRegion::Lowpass
        } else {
            DjRegion::Highpass
        }
    }

    fn apply_knob(&mut self) {
        match self.region() {
            DjRegion::Lowpass => {
                let hz = CUTOFF_CURVE.evaluate(1000 + self.knob);
                for svf in &mut self.lowpass {
                    svf.set_cutoff(hz);
                }
            }
            DjRegion::Highpass => {
                let hz = CUTOFF_CURVE.evaluate(self.knob);
                for svf in &mut self.highpass {
                    svf.set_cutoff(hz);
                }
            }
            DjRegion::Open | DjRegion::Muted => {}
        }
    }

    #[inline]
    fn process_side(&mut self, side: usize, input: f32) -> f32 {
        let filtered = match self.region() {
            DjRegion::Open => input,
            DjRegion::Muted => 0.0,
            DjRegion::Lowpass => self.lowpass[side].process(input),
            DjRegion::Highpass => self.highpass[side].process(input),
        };
        self.levels.apply(input, filtered)
    }
}

impl AudioEffect for DjFilter {
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

impl fmt::Display for DjFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.region(), self.cutoff_hz()) {
            (DjRegion::Lowpass, Some(hz)) => write!(f, "DJ lp {} {:.0}Hz", self.knob, hz),
            (DjRegion::Highpass, Some(hz)) => write!(f, "DJ hp {} {:.0}Hz", self.knob, hz),
            (DjRegion::Muted, _) => write!(f, "DJ mute {}", self.knob),
            _ => write!(f, "DJ open {}", self.knob),
        }
    }
}
