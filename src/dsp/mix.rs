//! Dry/wet blending and equal-power panning.

/*
Signal Mixing
=============

Vocabulary
----------

  wet/dry       dry = the signal going into an effect, wet = what comes out.
                Effects in this engine keep the two gains independent rather
                than as a single crossfade, so a send effect can run 100 % wet
                with 0 % dry while an insert runs 100 % dry plus some wet.

  summing       Adding signals at equal levels. Buses are sums: they can
                exceed ±1.0 and the master limiter is what keeps them legal.

  pan law       How a mono signal is split between left and right.


Equal-Power Panning
-------------------

A linear pan (L = 1 - p, R = p) dips in loudness at the centre because two
uncorrelated halves don't sound as loud as one whole. Equal-power keeps
L² + R² = 1:

    t = (knob + 50) / 100 × π/2        knob ∈ [-50, 50]
    L = sin(t)
    R = cos(t)

    knob  -50      0       +50
    L      0.0    0.707    1.0
    R      1.0    0.707    0.0

Centre is about -3 dB per side compared to a hard pan.
*/

use std::f32::consts::FRAC_PI_2;

/// Smallest and largest pan knob values.
pub const PAN_MIN: i32 = -50;
pub const PAN_MAX: i32 = 50;

/// Blend dry and wet with independent gains.
#[inline]
pub fn mix_dry_wet(dry: f32, wet: f32, dry_gain: f32, wet_gain: f32) -> f32 {
    dry * dry_gain + wet * wet_gain
}

/// Equal-power gains `(left, right)` for a pan knob in -50..=50.
#[inline]
pub fn pan_gains(knob: i32) -> (f32, f32) {
    let knob = knob.clamp(PAN_MIN, PAN_MAX);
    let t = (knob - PAN_MIN) as f32 / (PAN_MAX - PAN_MIN) as f32 * FRAC_PI_2;
    (t.sin(), t.cos())
}
