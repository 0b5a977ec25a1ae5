//! Breakpoint tables mapping knob values to physical units.

/*
Parameter Curves
================

Every knob on the panel produces an integer in 0..=1000. Most of them need to
land somewhere musically useful: a cutoff in Hz, a gain, a time in ms. Linear
mappings waste most of the knob travel (the interesting part of a cutoff
sweep is the bottom few hundred Hz), so each control owns a small table of
breakpoints and we interpolate between them.

  target
    20k ┤                              ●
        │                            ╱
     5k ┤                      ●───╱
        │                 ╱───
     1k ┤          ●─────
    200 ┤    ●────
     20 ●───
        └────┬─────┬─────┬─────┬─────┬──→ knob
             0    250   500   750  1000

Rules
-----

  - breakpoints are strictly increasing and live in 0..=1000
  - at or past the last breakpoint we return the last target (no extrapolation)
  - below the first breakpoint we interpolate from (0, 0.0)
  - negative inputs are clamped to 0 before lookup

Tables used by the engine are `const` so they never allocate.
*/

use std::borrow::Cow;

use thiserror::Error;

/// Largest value a standard knob produces.
pub const KNOB_MAX: i32 = 1000;

/// A single (breakpoint, target) pair.
pub type Breakpoint = (i32, f32);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("parameter curve needs at least one breakpoint")]
    Empty,
    #[error("breakpoint {0} is outside 0..=1000")]
    OutOfRange(i32),
    #[error("breakpoints must be strictly increasing ({previous} then {next})")]
    Unordered { previous: i32, next: i32 },
}

#[derive(Debug, Clone)]
pub struct ParameterCurve {
    points: Cow<'static, [Breakpoint]>,
}

impl ParameterCurve {
    /// Wrap a static table without validating it.
    ///
    /// Used for the engine's built-in tables, which are checked by tests.
    pub const fn from_static(points: &'static [Breakpoint]) -> Self {
        Self {
            points: Cow::Borrowed(points),
        }
    }

    /// Build a curve from an owned table, validating ordering and range.
    pub fn new(points: Vec<Breakpoint>) -> Result<Self, CurveError> {
        validate(&points)?;
        Ok(Self {
            points: Cow::Owned(points),
        })
    }

    pub fn evaluate(&self, input: i32) -> f32 {
        let input = input.max(0);
        let points = self.points.as_ref();

        let Some(&(last_x, last_y)) = points.last() else {
            return 0.0;
        };
        if input >= last_x {
            return last_y;
        }

        let mut prev = (0, 0.0);
        for &(x, y) in points {
            if input < x {
                let span = (x - prev.0) as f32;
                if span <= 0.0 {
                    return y;
                }
                let t = (input - prev.0) as f32 / span;
                return prev.1 + (y - prev.1) * t;
            }
            prev = (x, y);
        }

        last_y
    }

    pub fn first_target(&self) -> f32 {
        self.points.first().map_or(0.0, |p| p.1)
    }

    pub fn last_target(&self) -> f32 {
        self.points.last().map_or(0.0, |p| p.1)
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }
}

pub fn validate(points: &[Breakpoint]) -> Result<(), CurveError> {
    if points.is_empty() {
        return Err(CurveError::Empty);
    }
    for &(x, _) in points {
        if !(0..=KNOB_MAX).contains(&x) {
            return Err(CurveError::OutOfRange(x));
        }
    }
    for pair in points.windows(2) {
        if pair[1].0 <= pair[0].0 {
            return Err(CurveError::Unordered {
                previous: pair[0].0,
                next: pair[1].0,
            });
        }
    }
    Ok(())
}

/// Clamp a unipolar knob to 0..=1000.
#[inline]
pub fn clamp_knob(value: i32) -> i32 {
    value.clamp(0, KNOB_MAX)
}

/// Clamp a bipolar knob to -1000..=1000.
#[inline]
pub fn clamp_bipolar(value: i32) -> i32 {
    value.clamp(-KNOB_MAX, KNOB_MAX)
}

/// Knob as a 0.0..=1.0 fraction.
#[inline]
pub fn knob_fraction(value: i32) -> f32 {
    clamp_knob(value) as f32 / KNOB_MAX as f32
}

/// Percentage control (0..=100) as a 0.0..=1.0 fraction.
#[inline]
pub fn percent_fraction(value: i32) -> f32 {
    value.clamp(0, 100) as f32 / 100.0
}

/// Built-in tables shared across the effect family.
pub mod tables {
    use super::Breakpoint;

    /// Filter cutoff in Hz.
    pub const CUTOFF_HZ: &[Breakpoint] = &[
        (0, 20.0),
        (200, 120.0),
        (400, 450.0),
        (600, 1_500.0),
        (800, 5_000.0),
        (1000, 18_000.0),
    ];

    /// Channel gain, unity at 750.
    pub const GAIN: &[Breakpoint] = &[(500, 0.5), (750, 1.0), (1000, 2.0)];

    /// Output level for effects that treat the knob as a fader.
    pub const LEVEL: &[Breakpoint] = &[(250, 0.1), (500, 0.35), (750, 0.7), (1000, 1.0)];

    /// Distortion pre-gain.
    pub const DRIVE: &[Breakpoint] = &[(1, 1.0), (250, 2.0), (500, 4.0), (750, 10.0), (1000, 30.0)];

    /// Delay feedback: quiet and short below 500, approaching but never reaching 1.0 above.
    pub const DELAY_FEEDBACK: &[Breakpoint] = &[(500, 0.4), (1000, 0.95)];

    /// Delay wet level, matched to `DELAY_FEEDBACK`.
    pub const DELAY_WET: &[Breakpoint] = &[(500, 0.35), (1000, 0.8)];

    /// Reverb dry level over the four ranges (small, medium, large, wash).
    pub const REVERB_DRY: &[Breakpoint] = &[(0, 1.0), (250, 0.95), (500, 0.85), (750, 0.7), (1000, 0.0)];

    /// Reverb wet level over the four ranges.
    pub const REVERB_WET: &[Breakpoint] = &[(250, 0.25), (500, 0.4), (750, 0.6), (1000, 1.0)];

    /// Reverb comb feedback over the four ranges.
    pub const REVERB_FEEDBACK: &[Breakpoint] =
        &[(0, 0.7), (250, 0.8), (500, 0.88), (750, 0.94), (1000, 0.985)];

    /// Compressor threshold in dB.
    pub const THRESHOLD_DB: &[Breakpoint] = &[(0, -60.0), (500, -24.0), (1000, 0.0)];

    /// Compressor ratio.
    pub const RATIO: &[Breakpoint] = &[(0, 1.0), (500, 4.0), (800, 10.0), (1000, 20.0)];

    /// Detector attack in ms.
    pub const ATTACK_MS: &[Breakpoint] = &[(0, 0.1), (500, 10.0), (1000, 100.0)];

    /// Detector release in ms.
    pub const RELEASE_MS: &[Breakpoint] = &[(0, 10.0), (500, 150.0), (1000, 2_000.0)];
}
