//! Benchmarks for the delay line and the stereo delay effect.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::dsp::delay::DelayLine;
use eurorack_dsp::effects::{delay::DelayConfig, AudioEffect, Delay};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        let mut line = DelayLine::new(SAMPLE_RATE as usize);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("line", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                line.render(black_box(&mut buffer), 12_000);
            })
        });

        let mut left = input.clone();
        let mut right = input.clone();
        for (name, ping_pong) in [("stereo", false), ("ping_pong", true)] {
            let config = DelayConfig {
                ping_pong,
                ..DelayConfig::default()
            };
            let mut delay = Delay::new(SAMPLE_RATE, &config);
            delay.set_time(400);
            delay.set_level(700);
            delay.set_highpass(200);
            delay.set_lowpass(800);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    delay.render(black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
