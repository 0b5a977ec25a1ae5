//! Benchmarks for the distortion effect, per curve.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::effects::{AudioEffect, Distortion, DistortionType};

use crate::{ramp, BLOCK_SIZES};

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input = ramp(size);
        let mut left = input.clone();
        let mut right = input.clone();

        for kind in DistortionType::ALL {
            let mut distortion = Distortion::new();
            distortion.set_type(kind);
            distortion.set_drive(700);
            distortion.set_tone(400);
            let name = format!("{:?}", kind).to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    distortion.render(black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
