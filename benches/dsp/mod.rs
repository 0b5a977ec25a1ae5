//! Benchmarks for DSP primitives and stereo effects.

mod delay;
mod distortion;
mod dynamics;
mod envelope;
mod filter;
mod reverb;

pub use delay::bench_delay;
pub use distortion::bench_distortion;
pub use dynamics::bench_dynamics;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use reverb::bench_reverb;
