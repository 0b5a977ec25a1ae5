//! Low-level DSP primitives used by the effect wrappers and the mixer.
//!
//! These components are allocation-free after construction and realtime-safe,
//! so they can be embedded directly inside effects and channels. They stay
//! focused on signal math; knob semantics live one layer up in `effects`.

/// Knob → physical unit breakpoint tables.
pub mod curve;
/// Fixed-capacity ring buffer.
pub mod delay;
/// Waveshaping transfer functions and bit reduction.
pub mod distortion;
/// Mono compressor and limiter units.
pub mod dynamics;
/// Attack/hold/release envelope with contoured stages.
pub mod envelope;
/// State-variable and ladder filters.
pub mod filter;
/// Dry/wet blending, summing and panning.
pub mod mix;
/// Comb/allpass reverberation network.
pub mod reverb;

pub use curve::ParameterCurve;
pub use envelope::{Envelope, EnvelopeState};
