//! Benchmarks for DSP primitives, effects and the full graph.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Primitives and stereo effects
//!   - scenarios/*  Whole engine configurations

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

pub const SAMPLE_RATE: f32 = 48_000.0;

/// Sawtooth-like ramp in [-1, 1).
pub fn ramp(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
        .collect()
}

criterion_group!(
    benches,
    dsp::bench_filter,
    dsp::bench_envelope,
    dsp::bench_distortion,
    dsp::bench_delay,
    dsp::bench_reverb,
    dsp::bench_dynamics,
    scenarios::bench_graph,
);
criterion_main!(benches);
