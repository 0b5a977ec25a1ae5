//! cpal streams around the engine

use std::f32::consts::TAU;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use eurorack_dsp::{
    io::{AudioInput, AudioOutput},
    mixer::{ControlEvent, ControlReceiver},
    AudioGraph, EngineConfig,
};

pub struct AudioOptions {
    pub input: bool,
    pub tone_hz: Option<f32>,
}

/// Keeps the streams running until dropped.
pub struct AudioSession {
    _output: cpal::Stream,
    _input: Option<cpal::Stream>,
}

/// Where channel samples come from on the audio thread.
enum Source {
    Silence,
    Tone { phase: f32, step: f32 },
    Device { samples: Consumer<f32>, channels: usize },
}

impl Source {
    fn fill(&mut self, input: &mut AudioInput, frames: usize) {
        match self {
            Source::Silence => {}
            Source::Tone { phase, step } => {
                if let Some(buffer) = input.buffers.first_mut() {
                    for sample in &mut buffer[..frames] {
                        *sample = 0.5 * phase.sin();
                        *phase = (*phase + *step) % TAU;
                    }
                }
            }
            Source::Device { samples, channels } => {
                for frame in 0..frames {
                    for channel in 0..*channels {
                        // Underrun reads as silence.
                        let value = samples.pop().unwrap_or(0.0);
                        if let Some(buffer) = input.buffers.get_mut(channel) {
                            buffer[frame] = value;
                        }
                    }
                }
            }
        }
    }
}

/// Open the default output (and optionally input) device and start the
/// engine. The config's sample rate is replaced by the device's.
pub fn start(
    config: &mut EngineConfig,
    mut controls: ControlReceiver<Consumer<ControlEvent>>,
    options: &AudioOptions,
) -> EyreResult<AudioSession> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let device_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = device_config.sample_rate().0 as f32;
    let out_channels = device_config.channels() as usize;
    if sample_rate != config.sample_rate {
        tracing::info!(
            configured = config.sample_rate,
            device = sample_rate,
            "using the device sample rate"
        );
        config.sample_rate = sample_rate;
    }

    let mut graph = AudioGraph::new(config).wrap_err("failed to build the audio graph")?;
    let block = graph.max_block_size();

    let (mut source, input_stream) = if options.input {
        let (source, stream) = open_input(&host, sample_rate)?;
        (source, Some(stream))
    } else if let Some(hz) = options.tone_hz {
        let source = Source::Tone {
            phase: 0.0,
            step: TAU * hz / sample_rate,
        };
        (source, None)
    } else {
        (Source::Silence, None)
    };

    let mut input = AudioInput::new(config.channels, block);
    let mut output = AudioOutput::new(config.output_channels(), block);

    let output_stream = device.build_output_stream(
        &device_config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for chunk in data.chunks_mut(block * out_channels) {
                let frames = chunk.len() / out_channels;
                source.fill(&mut input, frames);
                graph.process_controlled(&mut controls, &input, &mut output, frames);
                output.interleave(chunk, out_channels);
            }
        },
        |err| tracing::error!(%err, "output stream error"),
        None,
    )?;
    output_stream.play()?;

    tracing::info!(
        sample_rate,
        out_channels,
        engine_outputs = config.output_channels(),
        channels = config.channels,
        block,
        "engine running"
    );

    Ok(AudioSession {
        _output: output_stream,
        _input: input_stream,
    })
}

fn open_input(host: &cpal::Host, sample_rate: f32) -> EyreResult<(Source, cpal::Stream)> {
    let device = host
        .default_input_device()
        .ok_or_else(|| eyre!("no default input device available"))?;
    let input_config = device
        .default_input_config()
        .wrap_err("failed to fetch default input config")?;

    let channels = input_config.channels() as usize;
    if input_config.sample_rate().0 as f32 != sample_rate {
        tracing::warn!(
            input = input_config.sample_rate().0,
            output = sample_rate,
            "input and output rates differ; input will drift"
        );
    }

    // Half a second of slack between the two device clocks.
    let capacity = (sample_rate as usize / 2) * channels;
    let (mut producer, consumer) = RingBuffer::new(capacity.max(1));

    let stream = device.build_input_stream(
        &input_config.into(),
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            for &sample in data {
                // Overrun drops samples until the output side catches up.
                if producer.push(sample).is_err() {
                    break;
                }
            }
        },
        |err| tracing::error!(%err, "input stream error"),
        None,
    )?;
    stream.play()?;
    tracing::info!(channels, "input stream running");

    Ok((
        Source::Device {
            samples: consumer,
            channels,
        },
        stream,
    ))
}
