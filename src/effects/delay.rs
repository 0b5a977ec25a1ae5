use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        curve::{clamp_knob, knob_fraction, tables, ParameterCurve},
        delay::DelayLine,
        filter::{FilterType, SVFilter},
    },
    effects::{AudioEffect, Levels},
};

/*
Delay
=====

Two mono lines of identical capacity, allocated once.

Stereo mode: each side feeds back into itself.

    L in ──(+)──▶ [line L] ──┬──▶ L out
            ▲                │
            └──── fb ◀───────┘          (same for R)

Ping-pong mode: the mono input enters the left line only and the lines feed
each other in a ring. The left line is heard on the right output and the
right line on the left, so each repeat alternates sides.

    in ──(+)──▶ [line L] ──┬──────────────▶ R out
          ▲                └── fb ──▶ [line R] ──┬──▶ L out
          └──────────── fb ◀─────────────────────┘

Time is a fraction of capacity, never below 5 %. Changing it clears both
lines rather than letting the read head sweep through stale audio.

The wet path runs through a highpass then a lowpass. Highpass knob 0 and
lowpass knob 1000 take the filters out of the path entirely.
*/

static FEEDBACK_CURVE: ParameterCurve = ParameterCurve::from_static(tables::DELAY_FEEDBACK);
static WET_CURVE: ParameterCurve = ParameterCurve::from_static(tables::DELAY_WET);
static CUTOFF_CURVE: ParameterCurve = ParameterCurve::from_static(tables::CUTOFF_HZ);

/// Feedback ceiling. At 1.0 the repeats never decay.
pub const MAX_FEEDBACK: f32 = 0.95;

/// Shortest delay as a fraction of the line capacity.
pub const MIN_TIME_FRACTION: f32 = 0.05;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct DelayConfig {
    /// Line length at time knob 1000, in seconds.
    pub max_seconds: f32,
    pub ping_pong: bool,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            max_seconds: 2.0,
            ping_pong: false,
        }
    }
}

pub struct Delay {
    lines: [DelayLine; 2],
    delay_samples: usize,
    time: i32,
    feedback: f32,
    ping_pong: bool,

    highpass_knob: i32,
    lowpass_knob: i32,
    highpass: [SVFilter; 2],
    lowpass: [SVFilter; 2],

    levels: Levels,
}

impl Delay {
    pub fn new(sample_rate: f32, config: &DelayConfig) -> Self {
        let capacity = (config.max_seconds.max(0.01) * sample_rate) as usize;
        let mut delay = Self {
            lines: [DelayLine::new(capacity), DelayLine::new(capacity)],
            delay_samples: 1,
            time: 500,
            feedback: 0.0,
            ping_pong: config.ping_pong,
            highpass_knob: 0,
            lowpass_knob: 1000,
            highpass: [
                SVFilter::new(FilterType::HighPass, sample_rate),
                SVFilter::new(FilterType::HighPass, sample_rate),
            ],
            lowpass: [
                SVFilter::new(FilterType::LowPass, sample_rate),
                SVFilter::new(FilterType::LowPass, sample_rate),
            ],
            // send effect: wet only
            levels: Levels {
                level: 1.0,
                wet: 0.0,
                dry: 0.0,
            },
        };
        delay.delay_samples = delay.time_to_samples(delay.time);
        delay
    }

    pub fn capacity(&self) -> usize {
        self.lines[0].capacity()
    }

    /// Delay time knob, 0..=1000, as a fraction of capacity.
    pub fn set_time(&mut self, knob: i32) {
        self.time = clamp_knob(knob);
        let samples = self.time_to_samples(self.time);
        if samples != self.delay_samples {
            self.delay_samples = samples;
            self.clear();
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Direct feedback control, clamped below 1.0.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_ping_pong(&mut self, enabled: bool) {
        if enabled != self.ping_pong {
            self.ping_pong = enabled;
            self.clear();
        }
    }

    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Wet highpass knob. 0 removes the filter from the path.
    pub fn set_highpass(&mut self, knob: i32) {
        self.highpass_knob = clamp_knob(knob);
        let hz = CUTOFF_CURVE.evaluate(self.highpass_knob);
        for svf in &mut self.highpass {
            svf.set_cutoff(hz);
        }
    }

    /// Wet lowpass knob. 1000 removes the filter from the path.
    pub fn set_lowpass(&mut self, knob: i32) {
        self.lowpass_knob = clamp_knob(knob);
        let hz = CUTOFF_CURVE.evaluate(self.lowpass_knob);
        for svf in &mut self.lowpass {
            svf.set_cutoff(hz);
        }
    }

    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        for svf in self.highpass.iter_mut().chain(self.lowpass.iter_mut()) {
            svf.reset();
        }
    }

    fn time_to_samples(&self, knob: i32) -> usize {
        let fraction = knob_fraction(knob).max(MIN_TIME_FRACTION);
        let max = self.capacity() - 1;
        ((fraction * max as f32) as usize).clamp(1, max)
    }

    #[inline]
    fn shape_wet(&mut self, side: usize, sample: f32) -> f32 {
        let mut out = sample;
        if self.highpass_knob > 0 {
            out = self.highpass[side].process(out);
        }
        if self.lowpass_knob < 1000 {
            out = self.lowpass[side].process(out);
        }
        out
    }
}

impl AudioEffect for Delay {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let d = self.delay_samples;
        let delayed_l = self.lines[0].read(d);
        let delayed_r = self.lines[1].read(d);

        let (wet_l, wet_r) = if self.ping_pong {
            let input = (left + right) * 0.5;
            self.lines[0].write(input + delayed_r * self.feedback);
            self.lines[1].write(delayed_l * self.feedback);
            (delayed_r, delayed_l)
        } else {
            self.lines[0].write(left + delayed_l * self.feedback);
            self.lines[1].write(right + delayed_r * self.feedback);
            (delayed_l, delayed_r)
        };

        let wet_l = self.shape_wet(0, wet_l);
        let wet_r = self.shape_wet(1, wet_r);
        (self.levels.apply(left, wet_l), self.levels.apply(right, wet_r))
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    /// One knob sets feedback and wet together.
    fn set_level(&mut self, knob: i32) {
        let knob = clamp_knob(knob);
        self.set_feedback(FEEDBACK_CURVE.evaluate(knob));
        self.levels.wet = WET_CURVE.evaluate(knob);
    }

    fn mute(&mut self) {
        self.clear();
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DLY {} t={} fb={:.2} wet={:.2}",
            if self.ping_pong { "pp" } else { "st" },
            self.time,
            self.feedback,
            self.levels.wet
        )
    }
}
