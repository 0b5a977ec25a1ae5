//! Linked stereo dynamics.
//!
//! Both wrappers hold two independent mono units and forward every setter to
//! both, so left and right never run with different parameters. Detection is
//! per side; the units are not gain-linked.

use std::fmt;

use crate::{
    dsp::{
        curve::{clamp_knob, knob_fraction, tables, ParameterCurve},
        dynamics::{CompressorUnit, LimiterUnit},
    },
    effects::{AudioEffect, Levels},
};

static THRESHOLD_CURVE: ParameterCurve = ParameterCurve::from_static(tables::THRESHOLD_DB);
static RATIO_CURVE: ParameterCurve = ParameterCurve::from_static(tables::RATIO);
static ATTACK_CURVE: ParameterCurve = ParameterCurve::from_static(tables::ATTACK_MS);
static RELEASE_CURVE: ParameterCurve = ParameterCurve::from_static(tables::RELEASE_MS);

/// Limiter threshold range in dB, knob 0 → -30, knob 1000 → 0.
const LIMITER_FLOOR_DB: f32 = -30.0;

/// Snapshot of the parameters one side is running with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsParams {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

pub struct Compressor {
    units: [CompressorUnit; 2],
    levels: Levels,
}

impl Compressor {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            units: [CompressorUnit::new(sample_rate), CompressorUnit::new(sample_rate)],
            levels: Levels::insert(),
        }
    }

    pub fn init(&mut self, sample_rate: f32) {
        for unit in &mut self.units {
            unit.init(sample_rate);
        }
    }

    pub fn set_threshold(&mut self, knob: i32) {
        let db = THRESHOLD_CURVE.evaluate(clamp_knob(knob));
        self.units.iter_mut().for_each(|u| u.set_threshold(db));
    }

    pub fn set_ratio(&mut self, knob: i32) {
        let ratio = RATIO_CURVE.evaluate(clamp_knob(knob));
        self.units.iter_mut().for_each(|u| u.set_ratio(ratio));
    }

    pub fn set_attack(&mut self, knob: i32) {
        let ms = ATTACK_CURVE.evaluate(clamp_knob(knob));
        self.units.iter_mut().for_each(|u| u.set_attack(ms));
    }

    pub fn set_release(&mut self, knob: i32) {
        let ms = RELEASE_CURVE.evaluate(clamp_knob(knob));
        self.units.iter_mut().for_each(|u| u.set_release(ms));
    }

    /// Makeup gain knob, 0..=1000 → 0..=24 dB.
    pub fn set_makeup(&mut self, knob: i32) {
        let db = knob_fraction(knob) * 24.0;
        self.units.iter_mut().for_each(|u| u.set_makeup(db));
    }

    pub fn params(&self, side: usize) -> DynamicsParams {
        let unit = &self.units[side.min(1)];
        DynamicsParams {
            threshold_db: unit.threshold_db(),
            ratio: unit.ratio(),
            attack_ms: unit.attack_ms(),
            release_ms: unit.release_ms(),
        }
    }

    /// Largest reduction either side is applying right now.
    pub fn gain_reduction_db(&self) -> f32 {
        self.units[0]
            .gain_reduction_db()
            .max(self.units[1].gain_reduction_db())
    }
}

impl AudioEffect for Compressor {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let l = self.units[0].process(left);
        let r = self.units[1].process(right);
        (self.levels.apply(left, l), self.levels.apply(right, r))
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    fn mute(&mut self) {
        self.units.iter_mut().for_each(CompressorUnit::reset);
    }
}

impl fmt::Display for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.params(0);
        write!(
            f,
            "CMP {:.0}dB {:.1}:1 a={:.1} r={:.0} gr={:.1}",
            p.threshold_db,
            p.ratio,
            p.attack_ms,
            p.release_ms,
            self.gain_reduction_db()
        )
    }
}

pub struct Limiter {
    units: [LimiterUnit; 2],
    levels: Levels,
}

impl Limiter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            units: [LimiterUnit::new(sample_rate), LimiterUnit::new(sample_rate)],
            levels: Levels::insert(),
        }
    }

    pub fn init(&mut self, sample_rate: f32) {
        for unit in &mut self.units {
            unit.init(sample_rate);
        }
    }

    pub fn set_threshold(&mut self, knob: i32) {
        let db = LIMITER_FLOOR_DB * (1.0 - knob_fraction(knob));
        self.units.iter_mut().for_each(|u| u.set_threshold(db));
    }

    pub fn set_release(&mut self, knob: i32) {
        let ms = RELEASE_CURVE.evaluate(clamp_knob(knob));
        self.units.iter_mut().for_each(|u| u.set_release(ms));
    }

    pub fn threshold_db(&self, side: usize) -> f32 {
        self.units[side.min(1)].threshold_db()
    }

    pub fn release_ms(&self, side: usize) -> f32 {
        self.units[side.min(1)].release_ms()
    }
}

impl AudioEffect for Limiter {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let l = self.units[0].process(left);
        let r = self.units[1].process(right);
        (self.levels.apply(left, l), self.levels.apply(right, r))
    }

    fn levels(&self) -> &Levels {
        &self.levels
    }

    fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    fn mute(&mut self) {
        self.units.iter_mut().for_each(LimiterUnit::reset);
    }
}

impl fmt::Display for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LIM {:.1}dB r={:.0}",
            self.threshold_db(0),
            self.release_ms(0)
        )
    }
}
