//! Benchmarks for the stereo reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::dsp::reverb::StereoReverb;
use eurorack_dsp::effects::{AudioEffect, Reverb};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        let mut tank = StereoReverb::new(SAMPLE_RATE);
        tank.set_feedback(0.84);
        group.bench_with_input(BenchmarkId::new("tank", size), &size, |b, _| {
            b.iter(|| {
                for &sample in &input {
                    black_box(tank.process(sample));
                }
            })
        });

        let mut reverb = Reverb::new(SAMPLE_RATE);
        reverb.set_level(800);
        reverb.set_predelay(300);
        reverb.set_lowpass(700);
        let mut left = input.clone();
        let mut right = input.clone();
        group.bench_with_input(BenchmarkId::new("effect", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                reverb.render(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
