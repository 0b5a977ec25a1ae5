//! Knob-driven audio effects.
//!
//! Each effect wraps one or more `dsp` primitives and speaks the panel's
//! integer convention: almost every setter takes a 0..=1000 knob, bipolar
//! controls take -1000..=1000, pan takes -50..=50 and wet/dry take a
//! 0..=100 percentage. Out-of-range values are clamped, never rejected.
//!
//! Effects share the `AudioEffect` trait so the mixer can treat them
//! uniformly, but they never share buffers.

use crate::dsp::{
    curve::{percent_fraction, tables, ParameterCurve},
    mix::mix_dry_wet,
};

/// Stereo/mono low-pass with envelope offset, plus the DJ sweep filter.
pub mod filter;
/// Stereo and ping-pong delay with output filtering.
pub mod delay;
/// Waveshaping distortion and bit crushing.
pub mod distortion;
/// Linked stereo compressor and limiter.
pub mod dynamics;
/// Equal-power panner.
pub mod pan;
/// Reverb with envelope-gated predelay.
pub mod reverb;

pub use delay::Delay;
pub use distortion::{Distortion, DistortionType};
pub use dynamics::{Compressor, Limiter};
pub use filter::{DjFilter, Filter, FilterMode};
pub use pan::Panner;
pub use reverb::Reverb;

/// Below this output level an effect produces exact silence.
pub const MUTE_LEVEL: f32 = 1e-3;

static LEVEL_CURVE: ParameterCurve = ParameterCurve::from_static(tables::LEVEL);

/// Output level and wet/dry gains shared by every effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub level: f32,
    pub wet: f32,
    pub dry: f32,
}

impl Levels {
    /// Fully wet, unity output: the usual insert setting.
    pub const fn insert() -> Self {
        Self {
            level: 1.0,
            wet: 1.0,
            dry: 0.0,
        }
    }

    #[inline]
    pub fn apply(&self, dry: f32, wet: f32) -> f32 {
        mix_dry_wet(dry, wet, self.dry, self.wet) * self.level
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.level < MUTE_LEVEL
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self::insert()
    }
}

/// Anything that turns one or two input samples into one or two output
/// samples.
pub trait AudioEffect: Send {
    /// Process one stereo frame.
    fn process(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Process a mono sample. Stereo-only effects use the left output.
    fn process_mono(&mut self, input: f32) -> f32 {
        self.process(input, input).0
    }

    fn levels(&self) -> &Levels;

    fn levels_mut(&mut self) -> &mut Levels;

    /// Master intensity from a 0..=1000 knob. Effects with a musically
    /// tuned mapping override this.
    fn set_level(&mut self, knob: i32) {
        self.levels_mut().level = LEVEL_CURVE.evaluate(knob.clamp(0, 1000));
    }

    fn set_wet(&mut self, percent: i32) {
        self.levels_mut().wet = percent_fraction(percent);
    }

    fn set_dry(&mut self, percent: i32) {
        self.levels_mut().dry = percent_fraction(percent);
    }

    fn level(&self) -> f32 {
        self.levels().level
    }

    fn wet(&self) -> f32 {
        self.levels().wet
    }

    fn dry(&self) -> f32 {
        self.levels().dry
    }

    /// Clear internal state immediately. Audio context only.
    fn mute(&mut self) {}

    /// Process a stereo block in place.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }
}
