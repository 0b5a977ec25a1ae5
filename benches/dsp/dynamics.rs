//! Benchmarks for the compressor and limiter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::effects::{AudioEffect, Compressor, Limiter};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_dynamics(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/dynamics");

    for &size in BLOCK_SIZES {
        let input = ramp(size);
        let mut left = input.clone();
        let mut right = input.clone();

        let mut compressor = Compressor::new(SAMPLE_RATE);
        compressor.set_threshold(400);
        compressor.set_ratio(600);
        group.bench_with_input(BenchmarkId::new("compressor", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                compressor.render(black_box(&mut left), black_box(&mut right));
            })
        });

        let mut limiter = Limiter::new(SAMPLE_RATE);
        limiter.set_threshold(600);
        group.bench_with_input(BenchmarkId::new("limiter", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                limiter.render(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
