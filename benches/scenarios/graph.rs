//! Benchmarks for complete audio graphs.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurorack_dsp::{
    config::{EnvelopeTarget, OutputRoute},
    io::{AudioInput, AudioOutput},
    mixer::{control_channel, ChannelParam, MasterParam, ParamId},
    AudioGraph, EngineConfig,
};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

fn input_for(channels: usize, size: usize) -> AudioInput {
    let signal = ramp(size);
    AudioInput {
        buffers: vec![signal; channels],
    }
}

/// One channel straight to the output, master chain bypassed.
fn minimal(size: usize) -> EngineConfig {
    EngineConfig {
        sample_rate: SAMPLE_RATE,
        max_block_size: size,
        ..EngineConfig::default()
    }
}

/// Four channels with delay and reverb sends, an envelope on channel 0's
/// filter, and the full master chain engaged.
fn full(size: usize) -> EngineConfig {
    let mut config = EngineConfig {
        sample_rate: SAMPLE_RATE,
        max_block_size: size,
        channels: 4,
        buses: 4,
        ..EngineConfig::default()
    };
    config.routing.reverb_bus = Some(1);
    config.routing.delay_bus = Some(2);
    config.routing.envelope_target = EnvelopeTarget::FilterCutoff { channel: 0 };
    config.routing.outputs.push(OutputRoute {
        bus: 3,
        left: 2,
        right: 3,
    });
    for channel in 0..4 {
        config.initial.extend([
            (ParamId::Channel(channel, ChannelParam::Send(1)), 500),
            (ParamId::Channel(channel, ChannelParam::Send(2)), 400),
            (ParamId::Channel(channel, ChannelParam::Send(3)), 300),
            (ParamId::Channel(channel, ChannelParam::Drive), 300),
        ]);
    }
    config.initial.extend([
        (ParamId::Master(MasterParam::ReverbLevel), 700),
        (ParamId::Master(MasterParam::DelayLevel), 600),
        (ParamId::Master(MasterParam::FilterMode), 1),
        (ParamId::Master(MasterParam::FilterFrequency), 800),
        (ParamId::Master(MasterParam::CompRatio), 500),
        (ParamId::Master(MasterParam::CompThreshold), 600),
        (ParamId::Master(MasterParam::EnvAmount), -400),
        (ParamId::Master(MasterParam::EnvAttack), 200),
        (ParamId::Master(MasterParam::EnvRelease), 400),
    ]);
    config
}

pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");

    for &size in BLOCK_SIZES {
        for (name, config) in [("minimal", minimal(size)), ("full", full(size))] {
            let mut graph = AudioGraph::new(&config).expect("valid config");
            let input = input_for(config.channels, size);
            let mut output = AudioOutput::new(config.output_channels(), size);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    graph.process_block(black_box(&input), black_box(&mut output), size);
                })
            });
        }

        // Knob movement every block, through the control boundary
        let config = full(size);
        let (mut handle, mut controls) = control_channel(&config, 64);
        let mut graph = AudioGraph::new(&config).expect("valid config");
        let input = input_for(config.channels, size);
        let mut output = AudioOutput::new(config.output_channels(), size);
        let cutoff = ParamId::Channel(1, ChannelParam::FilterFrequency);
        let mut knob = 0;
        group.bench_with_input(BenchmarkId::new("controlled", size), &size, |b, _| {
            b.iter(|| {
                knob = (knob + 37) % 1000;
                let _ = handle.set(cutoff, knob);
                let _ = handle.trigger();
                graph.process_controlled(
                    &mut controls,
                    black_box(&input),
                    black_box(&mut output),
                    size,
                );
            })
        });
    }

    group.finish();
}
