//! Reverb effect: stereo Schroeder core, envelope-gated input, tail filters.
//!
//! The input passes through a one-shot gate built from an [`Envelope`] whose
//! attack is the predelay length and whose gate is held open. After a
//! `trigger()` the reverb input swells in over the predelay instead of
//! slamming the tanks, and `mute()` closes the gate and empties the tail.
//!
//! One level knob walks four ranges (small, medium, large, wash), each with
//! its own dry/wet/feedback sub-range taken from the `REVERB_*` tables.

use std::fmt;

use crate::{
    dsp::{
        curve::{clamp_knob, knob_fraction, tables, ParameterCurve},
        envelope::{Envelope, EnvelopeConfig},
        filter::{FilterType, SVFilter},
        reverb::{StereoReverb, MAX_FEEDBACK},
    },
    effects::{AudioEffect, Levels},
};

static DRY_CURVE: ParameterCurve = ParameterCurve::from_static(tables::REVERB_DRY);
static WET_CURVE: ParameterCurve = ParameterCurve::from_static(tables::REVERB_WET);
static FEEDBACK_CURVE: ParameterCurve = ParameterCurve::from_static(tables::REVERB_FEEDBACK);
static CUTOFF_CURVE: ParameterCurve = ParameterCurve::from_static(tables::CUTOFF_HZ);

/// Predelay at knob 1000.
pub const MAX_PREDELAY_MS: f32 = 250.0;

const DAMPING: f32 = 0.2;

pub struct Reverb {
    sample_rate: f32,
    core: StereoReverb,
    predelay: Envelope,
    predelay_knob: i32,
    level_knob: i32,
    feedback: f32,
    send: bool,

    highpass_knob: i32,
    lowpass_knob: i32,
    highpass: [SVFilter; 2],
    lowpass: [SVFilter; 2],

    levels: Levels,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        let gate_config = EnvelopeConfig {
            taper_on_ms: 0.0,
            taper_off_ms: 0.0,
            ..EnvelopeConfig::default()
        };
        let mut predelay = Envelope::new(sample_rate, &gate_config);
        predelay.set_gate(true);

        let mut core = StereoReverb::new(sample_rate);
        core.set_damping(DAMPING);

        let mut reverb = Self {
            sample_rate,
            core,
            predelay,
            predelay_knob: 0,
            level_knob: 500,
            feedback: 0.0,
            send: false,
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
            levels: Levels::insert(),
        };
        reverb.set_predelay(0);
        reverb.set_level(500);
        reverb.predelay.trigger();
        reverb
    }

    /// Use as a send: output is the tail only, whatever the level knob says
    /// about dry.
    pub fn as_send(mut self) -> Self {
        self.send = true;
        self.levels.dry = 0.0;
        self
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.core.configure(sample_rate);
        self.predelay.init(sample_rate);
        self.predelay.set_taper_ticks(0, 0);
        for svf in self.highpass.iter_mut().chain(self.lowpass.iter_mut()) {
            svf.init(sample_rate);
        }
        self.set_predelay(self.predelay_knob);
        self.clear();
        self.predelay.trigger();
    }

    /// Predelay knob, 0..=1000 → 0..MAX_PREDELAY_MS.
    pub fn set_predelay(&mut self, knob: i32) {
        self.predelay_knob = clamp_knob(knob);
        let ticks = knob_fraction(self.predelay_knob) * MAX_PREDELAY_MS * 0.001 * self.sample_rate;
        self.predelay.set_attack_ticks(ticks.round() as u32);
    }

    pub fn predelay_ticks(&self) -> u32 {
        self.predelay.attack_ticks()
    }

    pub fn set_highpass(&mut self, knob: i32) {
        self.highpass_knob = clamp_knob(knob);
        let hz = CUTOFF_CURVE.evaluate(self.highpass_knob);
        for svf in &mut self.highpass {
            svf.set_cutoff(hz);
        }
    }

    pub fn set_lowpass(&mut self, knob: i32) {
        self.lowpass_knob = clamp_knob(knob);
        let hz = CUTOFF_CURVE.evaluate(self.lowpass_knob);
        for svf in &mut self.lowpass {
            svf.set_cutoff(hz);
        }
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Restart the predelay gate.
    pub fn trigger(&mut self) {
        self.predelay.mute();
        self.predelay.trigger();
    }

    /// Current input gate level, 0.0..=1.0.
    pub fn gate(&self) -> f32 {
        self.predelay.value()
    }

    pub fn clear(&mut self) {
        self.core.reset();
        for svf in self.highpass.iter_mut().chain(self.lowpass.iter_mut()) {
            svf.reset();
        }
    }

    #[inline]
    fn shape_tail(&mut self, side: usize, sample: f32) -> f32 {
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

impl AudioEffect for Reverb {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.predelay.tick();
        let input = (left + right) * 0.5 * self.predelay.value();

        let (tail_l, tail_r) = self.core.process(input);
        let tail_l = self.shape_tail(0, tail_l);
        let tail_r = self.shape_tail(1, tail_r);

        (self.levels.apply(left, tail_l), self.levels.apply(right, tail_r))
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    /// Size knob: dry, wet and feedback move together.
    fn set_level(&mut self, knob: i32) {
        self.level_knob = clamp_knob(knob);
        self.feedback = FEEDBACK_CURVE.evaluate(self.level_knob).min(MAX_FEEDBACK);
        self.core.set_feedback(self.feedback);
        self.levels.wet = WET_CURVE.evaluate(self.level_knob);
        self.levels.dry = if self.send {
            0.0
        } else {
            DRY_CURVE.evaluate(self.level_knob)
        };
    }

    /// Empty the tail and close the input gate until the next trigger.
    fn mute(&mut self) {
        self.clear();
        self.predelay.mute();
    }
}

impl fmt::Display for Reverb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = match self.level_knob {
            0..=249 => "sml",
            250..=499 => "med",
            500..=749 => "lrg",
            _ => "wsh",
        };
        write!(
            f,
            "REV {} fb={:.2} wet={:.2} pre={}",
            size, self.feedback, self.levels.wet, self.predelay_knob
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn tail_energy(reverb: &mut Reverb, samples: usize) -> f32 {
        let mut energy = 0.0;
        for _ in 0..samples {
            let (l, r) = reverb.process(0.0, 0.0);
            energy += l * l + r * r;
        }
        energy
    }

    #[test]
    fn test_feedback_below_unity_for_every_knob() {
        let mut reverb = Reverb::new(SAMPLE_RATE);
        for knob in (-100..=1100).step_by(50) {
            reverb.set_level(knob);
            assert!(reverb.feedback() < 1.0, "knob {}", knob);
        }
    }

    #[test]
    fn test_level_ranges_trade_dry_for_wet() {
        let mut reverb = Reverb::new(SAMPLE_RATE);
        reverb.set_level(0);
        assert_eq!(reverb.dry(), 1.0);
        assert_eq!(reverb.wet(), 0.0);

        reverb.set_level(1000);
        assert_eq!(reverb.dry(), 0.0);
        assert_eq!(reverb.wet(), 1.0);
    }

    #[test]
    fn test_send_mode_has_no_dry() {
        let mut reverb = Reverb::new(SAMPLE_RATE).as_send();
        reverb.set_level(0);
        assert_eq!(reverb.dry(), 0.0);
        assert_eq!(reverb.process(1.0, 1.0), (0.0, 0.0));
    }

    #[test]
    fn test_impulse_produces_decaying_tail() {
        let mut reverb = Reverb::new(SAMPLE_RATE).as_send();
        reverb.set_level(500);
        reverb.process(1.0, 1.0);

        let early = tail_energy(&mut reverb, 4_800);
        let late = tail_energy(&mut reverb, 4_800);
        assert!(early > 0.0);
        let much_later = {
            tail_energy(&mut reverb, 96_000);
            tail_energy(&mut reverb, 4_800)
        };
        assert!(much_later < early, "early {} much later {}", early, much_later);
        assert!(late.is_finite());
    }

    #[test]
    fn test_stereo_tails_differ() {
        let mut reverb = Reverb::new(SAMPLE_RATE).as_send();
        reverb.set_level(750);
        reverb.process(1.0, 1.0);
        let mut differs = false;
        for _ in 0..4_800 {
            let (l, r) = reverb.process(0.0, 0.0);
            if (l - r).abs() > 1e-6 {
                differs = true;
            }
        }
        assert!(differs);
    }

    #[test]
    fn test_predelay_ramps_the_input_gate() {
        let mut reverb = Reverb::new(SAMPLE_RATE);
        reverb.set_predelay(1000);
        let ticks = reverb.predelay_ticks();
        assert_eq!(ticks, (MAX_PREDELAY_MS * 0.001 * SAMPLE_RATE) as u32);

        reverb.trigger();
        reverb.process(0.0, 0.0);
        let early = reverb.gate();
        for _ in 0..ticks {
            reverb.process(0.0, 0.0);
        }
        assert!(early < 0.01);
        assert_eq!(reverb.gate(), 1.0);
    }

    #[test]
    fn test_mute_closes_gate_until_trigger() {
        let mut reverb = Reverb::new(SAMPLE_RATE).as_send();
        reverb.set_level(800);
        for _ in 0..1_000 {
            reverb.process(0.5, 0.5);
        }
        reverb.mute();
        for _ in 0..4_800 {
            assert_eq!(reverb.process(0.5, 0.5), (0.0, 0.0));
        }

        reverb.trigger();
        let mut energy = 0.0;
        for _ in 0..4_800 {
            let (l, r) = reverb.process(0.5, 0.5);
            energy += l.abs() + r.abs();
        }
        assert!(energy > 0.0);
    }
}
