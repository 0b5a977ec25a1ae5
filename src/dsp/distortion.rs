//! Distortion / Waveshaping
//!
//! A waveshaper applies a transfer function to each sample:
//!   output = f(input * drive)
//!
//! Low drive keeps the signal in the near-linear part of f(), higher drive
//! pushes it into the curved region and adds harmonics.
//!
//! # Transfer Functions
//!
//! Hyperbolic tangent:  f(x) = tanh(x)
//!   - Smooth, symmetric, saturates at ±1
//!
//! Arctangent:          f(x) = (2/π)·atan(x)
//!   - Softer knee than tanh, approaches ±1 more slowly
//!
//! Soft Clip:           f(x) = x / (1 + |x|)
//!   - Warm, gradually compresses peaks
//!
//! Hard Clip:           f(x) = clamp(x, -1, 1)
//!   - Buzzy, rich in odd harmonics
//!
//! Soft Saturate:       linear below a threshold, then a rational knee
//!   - Clean until it isn't; good for gentle bus glue
//!
//! Bit Crush:           round(x·levels)/levels, plus sample-and-hold
//!   - Quantisation noise and aliasing, the lo-fi sound

use std::f32::consts::FRAC_2_PI;

#[inline]
pub fn tanh_shape(sample: f32, drive: f32) -> f32 {
    (sample * drive).tanh()
}

#[inline]
pub fn atan_shape(sample: f32, drive: f32) -> f32 {
    FRAC_2_PI * (sample * drive).atan()
}

/// Soft clipping using x / (1 + |x|).
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Hard clipping at ±threshold.
#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    x.clamp(-threshold, threshold)
}

/// Linear up to `threshold`, then bends smoothly toward 1.0.
#[inline]
pub fn soft_saturate(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    let a = threshold.clamp(0.01, 0.99);
    let magnitude = x.abs();
    if magnitude <= a {
        return x;
    }
    let over = (magnitude - a) / (1.0 - a);
    let shaped = a + (magnitude - a) / (1.0 + over * over);
    let shaped = if magnitude > 1.0 {
        shaped.max((a + 1.0) * 0.5)
    } else {
        shaped
    };
    shaped.copysign(x)
}

/// Quantise to `levels` steps per unit.
#[inline]
pub fn quantize(sample: f32, levels: f32) -> f32 {
    (sample * levels).round() / levels
}

/// Number of quantisation levels for a tone knob: 2^(2 + floor(tone/1000·20)).
pub fn crush_levels(tone: i32) -> f32 {
    let tone = tone.clamp(0, 1000);
    let bits = 2 + (tone as f32 / 1000.0 * 20.0).floor() as i32;
    2.0f32.powi(bits)
}
