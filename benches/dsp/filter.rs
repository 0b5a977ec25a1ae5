//! Benchmarks for the state-variable and ladder filters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::dsp::filter::{FilterType, LadderFilter, SVFilter};
use eurorack_dsp::effects::{AudioEffect, DjFilter, Filter, FilterMode};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        for (name, filter_type) in [
            ("lowpass", FilterType::LowPass),
            ("highpass", FilterType::HighPass),
            ("bandpass", FilterType::BandPass),
            ("notch", FilterType::Notch),
        ] {
            let mut filter = SVFilter::new(filter_type, SAMPLE_RATE);
            filter.set_cutoff(1000.0);
            filter.set_resonance(0.5);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }

        let mut ladder = LadderFilter::new(SAMPLE_RATE);
        ladder.set_cutoff(1000.0);
        ladder.set_resonance(0.7);
        group.bench_with_input(BenchmarkId::new("ladder", size), &size, |b, _| {
            b.iter(|| {
                for &sample in &input {
                    black_box(ladder.process(sample));
                }
            })
        });

        // Stereo effect wrappers, knob-driven
        let mut left = input.clone();
        let mut right = input.clone();
        let mut filter = Filter::new(SAMPLE_RATE);
        filter.set_mode(FilterMode::StateVariable);
        filter.set_frequency(600);
        filter.set_resonance_knob(400);
        group.bench_with_input(BenchmarkId::new("stereo_svf", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                filter.render(black_box(&mut left), black_box(&mut right));
            })
        });

        let mut dj = DjFilter::new(SAMPLE_RATE);
        dj.set_position(-400);
        group.bench_with_input(BenchmarkId::new("dj", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                dj.render(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
