use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::curve::knob_fraction;

/*
AHR Envelope Implementation
===========================

Attack / hold / release envelope with shaped stages and anti-click tapers.
Runs at sample rate: `tick()` is called once per sample so the stage curves
keep full resolution even for very short attacks.

Vocabulary
----------

  level        The envelope's shaped output (0.0 to 1.0).

  taper_level  A separate 0.0 to 1.0 multiplier that fades the envelope in
               and out over a few milliseconds. It exists purely to avoid
               clicks when the envelope starts from silence or is cut off.

  index        Ticks spent in the current stage.

  full_index   Ticks since the attack began.

  contour      Shape of a stage. 0.5 is a straight line, lower values start
               slow and finish fast, higher values start fast and finish slow.

  cascade      Retrigger policy. With cascade on, a new trigger blends into
               the current level instead of tapering back down first.


The Shape
---------

  Level
    1.0 ┤        ┌─────────┐
        │      ╱           ╲
        │    ╱               ╲
        │  ╱                   ╲
    0.0 ┼╱───────────────────────╲──→ Time
        ↑ rising   holding  falling ↑
     taper on                    taper off


The State Machine
-----------------

    Off ──trigger──→ TaperingOn ──→ Rising ──→ Holding ──→ Falling
     ↑                                                        │
     └──────────────────── TaperingOff ←──────────────────────┘

  Rising   → Holding      when index ≥ attack
  Holding  → Falling      when the gate is low and index ≥ hold
  Falling  → TaperingOff  when index ≥ release

A retrigger while running either jumps straight back into Rising (cascade) or
goes through TaperingOn again, decaying the old level toward a small floor so
the new attack never starts with a jump.

Stages with zero length are passed through within the same tick, so a
zero-length taper never costs a sample.


Contours
--------

Each stage curve is four connected line segments. We bend a straight line
from (0, 0) to (duration, 1) with a quadratic control point whose position
comes from the contour knob, then sample it at 0/25/50/75/100 % and join the
points. A straight line at contour 0.5 is special-cased.

    contour 0.1          contour 0.5          contour 0.9
     1 ┤      ╱          1 ┤     ╱            1 ┤  ──────
       │     ╱             │   ╱                │ ╱
       │   ╱               │ ╱                  │╱
     0 ┼───               0 ┼╱                  0 ┼

Release curves are the mirror image: 1 minus the same shape.
*/

/// Level the envelope rests at while tapering on. Non-zero so the first
/// attack tick never starts from a hard zero.
pub const TAPER_FLOOR: f32 = 0.001;

const SEGMENTS: usize = 4;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeConfig {
    /// Attack length at knob 1000.
    pub max_attack_s: f32,
    /// Hold length at knob 1000.
    pub max_hold_s: f32,
    /// Release length at knob 1000.
    pub max_release_s: f32,
    pub taper_on_ms: f32,
    pub taper_off_ms: f32,
    pub cascade: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_attack_s: 4.0,
            max_hold_s: 4.0,
            max_release_s: 8.0,
            taper_on_ms: 2.0,
            taper_off_ms: 5.0,
            cascade: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Off,
    TaperingOn,
    Rising,
    Holding,
    Falling,
    TaperingOff,
}

impl EnvelopeState {
    fn label(self) -> &'static str {
        match self {
            EnvelopeState::Off => "off",
            EnvelopeState::TaperingOn => "tpr+",
            EnvelopeState::Rising => "rise",
            EnvelopeState::Holding => "hold",
            EnvelopeState::Falling => "fall",
            EnvelopeState::TaperingOff => "tpr-",
        }
    }
}

/// Stages entered during one `tick()`, oldest first.
///
/// A tick can pass through several stages when some have zero length, so
/// this is a tiny fixed list rather than a single value.
#[derive(Debug, Clone, Copy)]
pub struct StageChanges {
    stages: [EnvelopeState; 6],
    len: usize,
}

impl StageChanges {
    const fn new() -> Self {
        Self {
            stages: [EnvelopeState::Off; 6],
            len: 0,
        }
    }

    fn push(&mut self, stage: EnvelopeState) {
        if self.len < self.stages.len() {
            self.stages[self.len] = stage;
            self.len += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, stage: EnvelopeState) -> bool {
        self.as_slice().contains(&stage)
    }

    pub fn as_slice(&self) -> &[EnvelopeState] {
        &self.stages[..self.len]
    }
}

/// Four-segment approximation of a bent 0 → 1 ramp.
#[derive(Debug, Clone, Copy)]
pub struct Contour {
    xs: [f32; SEGMENTS + 1],
    ys: [f32; SEGMENTS + 1],
    duration: u32,
}

impl Contour {
    pub fn new(duration: u32, contour: f32) -> Self {
        let d = duration as f32;
        let c = contour.clamp(0.0, 1.0);

        let mut xs = [0.0; SEGMENTS + 1];
        let mut ys = [0.0; SEGMENTS + 1];

        if (c - 0.5).abs() < 1e-4 {
            // Straight line: the bent construction collapses here.
            for k in 0..=SEGMENTS {
                let t = k as f32 / SEGMENTS as f32;
                xs[k] = t * d;
                ys[k] = t;
            }
        } else {
            // Quadratic Bézier from (0,0) to (d,1) with control point
            // (d·(1-c), c): c→0 pulls it toward (d,0), c→1 toward (0,1).
            let (qx, qy) = (d * (1.0 - c), c);
            for k in 0..=SEGMENTS {
                let t = k as f32 / SEGMENTS as f32;
                let bend = 2.0 * t * (1.0 - t);
                xs[k] = bend * qx + t * t * d;
                ys[k] = bend * qy + t * t;
            }
        }

        xs[SEGMENTS] = d;
        ys[SEGMENTS] = 1.0;

        Self { xs, ys, duration }
    }

    pub fn linear(duration: u32) -> Self {
        Self::new(duration, 0.5)
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Segment endpoints, for inspection.
    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Rising value (0 → 1) at a fractional position.
    pub fn rise_at(&self, x: f32) -> f32 {
        if self.duration == 0 || x >= self.xs[SEGMENTS] {
            return 1.0;
        }
        if x <= 0.0 {
            return 0.0;
        }

        let segment = self.xs[1..]
            .iter()
            .position(|&end| x <= end)
            .unwrap_or(SEGMENTS - 1);

        let (x0, x1) = (self.xs[segment], self.xs[segment + 1]);
        let (y0, y1) = (self.ys[segment], self.ys[segment + 1]);
        let width = x1 - x0;
        if width <= f32::EPSILON {
            return y1;
        }
        y0 + (y1 - y0) * ((x - x0) / width)
    }

    #[inline]
    pub fn rise(&self, index: u32) -> f32 {
        self.rise_at(index as f32)
    }

    /// Falling value (1 → 0), the mirror of `rise`.
    #[inline]
    pub fn fall(&self, index: u32) -> f32 {
        1.0 - self.rise(index)
    }
}

pub struct Envelope {
    sample_rate: f32,
    config: EnvelopeConfig,

    // Stage lengths in ticks
    attack: u32,
    hold: u32,
    release: u32,
    taper_on: u32,
    taper_off: u32,

    attack_contour_knob: f32,
    release_contour_knob: f32,
    attack_curve: Contour,
    release_curve: Contour,

    // Runtime state
    state: EnvelopeState,
    index: u32,
    full_index: u32,
    taper_index: u32,
    level: f32,
    taper_level: f32,
    taper_start: f32,
    prev_level: f32,
    retriggering: bool,

    cascade: bool,
    gate_on: bool,
}

impl Envelope {
    pub fn new(sample_rate: f32, config: &EnvelopeConfig) -> Self {
        let mut env = Self {
            sample_rate,
            config: config.clone(),
            attack: 0,
            hold: 0,
            release: 0,
            taper_on: 0,
            taper_off: 0,
            attack_contour_knob: 0.5,
            release_contour_knob: 0.5,
            attack_curve: Contour::linear(0),
            release_curve: Contour::linear(0),
            state: EnvelopeState::Off,
            index: 0,
            full_index: 0,
            taper_index: 0,
            level: 0.0,
            taper_level: 0.0,
            taper_start: 0.0,
            prev_level: 0.0,
            retriggering: false,
            cascade: config.cascade,
            gate_on: false,
        };
        env.init(sample_rate);
        env
    }

    /// Re-derive tick counts for a new sample rate.
    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.taper_on = ms_to_ticks(self.config.taper_on_ms, self.sample_rate);
        self.taper_off = ms_to_ticks(self.config.taper_off_ms, self.sample_rate);
        self.set_attack(0);
        self.set_hold(0);
        self.set_release(250);
    }

    // --- stage setters -------------------------------------------------

    pub fn set_attack(&mut self, knob: i32) {
        let ticks = knob_to_ticks(knob, self.config.max_attack_s, self.sample_rate);
        self.set_attack_ticks(ticks);
    }

    pub fn set_hold(&mut self, knob: i32) {
        self.hold = knob_to_ticks(knob, self.config.max_hold_s, self.sample_rate);
    }

    pub fn set_release(&mut self, knob: i32) {
        let ticks = knob_to_ticks(knob, self.config.max_release_s, self.sample_rate);
        self.set_release_ticks(ticks);
    }

    pub fn set_attack_ticks(&mut self, ticks: u32) {
        self.attack = ticks;
        self.attack_curve = Contour::new(ticks, self.attack_contour_knob);
    }

    pub fn set_hold_ticks(&mut self, ticks: u32) {
        self.hold = ticks;
    }

    pub fn set_release_ticks(&mut self, ticks: u32) {
        self.release = ticks;
        self.release_curve = Contour::new(ticks, self.release_contour_knob);
    }

    pub fn set_taper_ticks(&mut self, on: u32, off: u32) {
        self.taper_on = on;
        self.taper_off = off;
    }

    pub fn set_attack_contour(&mut self, knob: i32) {
        self.attack_contour_knob = knob_fraction(knob);
        self.attack_curve = Contour::new(self.attack, self.attack_contour_knob);
    }

    pub fn set_release_contour(&mut self, knob: i32) {
        self.release_contour_knob = knob_fraction(knob);
        self.release_curve = Contour::new(self.release, self.release_contour_knob);
    }

    pub fn set_cascade(&mut self, cascade: bool) {
        self.cascade = cascade;
    }

    pub fn cascade(&self) -> bool {
        self.cascade
    }

    pub fn set_gate(&mut self, on: bool) {
        self.gate_on = on;
    }

    // --- events --------------------------------------------------------

    pub fn trigger(&mut self) {
        if self.state == EnvelopeState::Off {
            self.retriggering = false;
            self.prev_level = 0.0;
            self.level = 0.0;
            self.taper_level = 0.0;
            self.full_index = 0;
            self.enter(EnvelopeState::TaperingOn);
        } else if self.cascade {
            self.prev_level = self.level;
            self.retriggering = true;
            self.enter(EnvelopeState::Rising);
        } else {
            self.prev_level = self.level;
            self.retriggering = true;
            self.enter(EnvelopeState::TaperingOn);
        }
    }

    /// Hard stop. Audio context only.
    pub fn mute(&mut self) {
        self.enter(EnvelopeState::Off);
    }

    /// Advance one sample.
    pub fn tick(&mut self) -> StageChanges {
        let mut changes = StageChanges::new();

        self.advance(&mut changes);

        match self.state {
            EnvelopeState::Off => {}
            EnvelopeState::TaperingOn => {
                self.taper_index = self.taper_index.saturating_add(1);
                let p = progress(self.taper_index, self.taper_on);
                self.taper_level = self.taper_start + (1.0 - self.taper_start) * p;
                self.level = if self.retriggering {
                    self.prev_level + (TAPER_FLOOR - self.prev_level) * p
                } else {
                    TAPER_FLOOR
                };
            }
            EnvelopeState::Rising => {
                self.index = self.index.saturating_add(1);
                self.full_index = self.full_index.saturating_add(1);
                self.level = self.attack_curve.rise(self.index);
                if self.cascade && self.retriggering {
                    self.level = self.level.max(self.prev_level);
                }
                if self.taper_level < 1.0 {
                    let step = 1.0 / self.taper_on.max(1) as f32;
                    self.taper_level = (self.taper_level + step).min(1.0);
                }
            }
            EnvelopeState::Holding => {
                self.index = self.index.saturating_add(1);
                self.full_index = self.full_index.saturating_add(1);
                self.level = 1.0;
            }
            EnvelopeState::Falling => {
                self.index = self.index.saturating_add(1);
                self.full_index = self.full_index.saturating_add(1);
                self.level = self.release_curve.fall(self.index);
            }
            EnvelopeState::TaperingOff => {
                self.taper_index = self.taper_index.saturating_add(1);
                let p = progress(self.taper_index, self.taper_off);
                self.taper_level = self.taper_start * (1.0 - p);
            }
        }

        self.advance(&mut changes);

        debug_assert!((0.0..=1.0).contains(&self.level));
        changes
    }

    /// Render envelope output (level × taper) into a buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.tick();
            *sample = self.value();
        }
    }

    fn stage_complete(&self) -> bool {
        match self.state {
            EnvelopeState::Off => false,
            EnvelopeState::TaperingOn => self.taper_index >= self.taper_on,
            EnvelopeState::Rising => self.index >= self.attack,
            EnvelopeState::Holding => !self.gate_on && self.index >= self.hold,
            EnvelopeState::Falling => self.index >= self.release,
            EnvelopeState::TaperingOff => self.taper_index >= self.taper_off,
        }
    }

    fn advance(&mut self, changes: &mut StageChanges) {
        while self.stage_complete() {
            let next = match self.state {
                EnvelopeState::TaperingOn => {
                    self.taper_level = 1.0;
                    EnvelopeState::Rising
                }
                EnvelopeState::Rising => EnvelopeState::Holding,
                EnvelopeState::Holding => EnvelopeState::Falling,
                EnvelopeState::Falling => EnvelopeState::TaperingOff,
                EnvelopeState::TaperingOff | EnvelopeState::Off => EnvelopeState::Off,
            };
            self.enter(next);
            changes.push(next);
        }
    }

    fn enter(&mut self, stage: EnvelopeState) {
        self.state = stage;
        self.index = 0;
        match stage {
            EnvelopeState::Off => {
                self.level = 0.0;
                self.taper_level = 0.0;
                self.full_index = 0;
                self.taper_index = 0;
                self.retriggering = false;
            }
            EnvelopeState::TaperingOn | EnvelopeState::TaperingOff => {
                self.taper_index = 0;
                self.taper_start = self.taper_level;
            }
            EnvelopeState::Rising => {
                self.full_index = 0;
                if self.attack == 0 {
                    self.level = 1.0;
                }
            }
            EnvelopeState::Holding => {
                self.level = 1.0;
            }
            EnvelopeState::Falling => {}
        }
    }

    // --- accessors -----------------------------------------------------

    /// Shaped level multiplied by the anti-click taper.
    pub fn value(&self) -> f32 {
        self.level * self.taper_level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn taper_level(&self) -> f32 {
        self.taper_level
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Off
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn full_index(&self) -> u32 {
        self.full_index
    }

    pub fn attack_ticks(&self) -> u32 {
        self.attack
    }

    pub fn hold_ticks(&self) -> u32 {
        self.hold
    }

    pub fn release_ticks(&self) -> u32 {
        self.release
    }

    pub fn attack_curve(&self) -> &Contour {
        &self.attack_curve
    }

    pub fn release_curve(&self) -> &Contour {
        &self.release_curve
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ENV {} {:.2} a={} h={} r={}{}",
            self.state.label(),
            self.value(),
            self.attack,
            self.hold,
            self.release,
            if self.cascade { " casc" } else { "" }
        )
    }
}

/// Square-law knob to ticks: low knob values give short times.
pub fn knob_to_ticks(knob: i32, max_seconds: f32, sample_rate: f32) -> u32 {
    let fraction = knob_fraction(knob);
    (fraction * fraction * max_seconds.max(0.0) * sample_rate).round() as u32
}

fn ms_to_ticks(ms: f32, sample_rate: f32) -> u32 {
    (ms.max(0.0) * 0.001 * sample_rate).round() as u32
}

#[inline]
fn progress(elapsed: u32, total: u32) -> f32 {
    if total == 0 {
        1.0
    } else {
        (elapsed as f32 / total as f32).min(1.0)
    }
}
