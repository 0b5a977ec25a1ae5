//! Benchmarks for the AHR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::dsp::envelope::{Envelope, EnvelopeConfig};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let config = EnvelopeConfig::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Rising through a long, curved attack
        let mut env = Envelope::new(SAMPLE_RATE, &config);
        env.set_attack(1000);
        env.set_attack_contour(800);
        env.trigger();
        group.bench_with_input(BenchmarkId::new("rise", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Gate held, sitting at full level
        let mut env = Envelope::new(SAMPLE_RATE, &config);
        env.set_attack_ticks(0);
        env.set_gate(true);
        env.trigger();
        for _ in 0..1000 {
            env.tick();
        }
        group.bench_with_input(BenchmarkId::new("hold", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Short stages, retriggered every block
        let mut env = Envelope::new(SAMPLE_RATE, &config);
        env.set_attack_ticks(16);
        env.set_hold_ticks(16);
        env.set_release_ticks(32);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.trigger();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
