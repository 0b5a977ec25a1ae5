use eurorack_dsp::{
    io::{AudioInput, AudioOutput},
    mixer::{control_channel, ChannelParam, MasterParam, ParamId},
    AudioGraph, EngineConfig,
};

const BLOCK: usize = 64;

fn constant_input(channels: usize, value: f32) -> AudioInput {
    AudioInput {
        buffers: vec![vec![value; BLOCK]; channels],
    }
}

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn renders_silence_from_silence() {
    let config = EngineConfig::default();
    let mut graph = AudioGraph::new(&config).expect("default config is valid");
    let mut output = AudioOutput::new(config.output_channels(), BLOCK);

    for _ in 0..20 {
        graph.process_block(&constant_input(1, 0.0), &mut output, BLOCK);
    }
    assert!(output.buffers.iter().flatten().all(|&s| s == 0.0));
}

#[test]
fn knob_changes_apply_on_the_next_block() {
    let config = EngineConfig::default();
    let (handle, mut controls) = control_channel(&config, 16);
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let input = constant_input(1, 0.5);
    let mut output = AudioOutput::new(2, BLOCK);

    handle
        .set(ParamId::Channel(0, ChannelParam::FilterMode), 0)
        .expect("valid param");
    graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    let before = peak(&output.buffers[0]);
    assert!(before > 0.0);

    handle
        .set(ParamId::Channel(0, ChannelParam::Gain), 0)
        .expect("valid param");
    graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    assert_eq!(peak(&output.buffers[0]), 0.0);
}

#[test]
fn boot_values_survive_the_first_poll() {
    let mut config = EngineConfig::default();
    config.initial = vec![
        (ParamId::Channel(0, ChannelParam::Gain), 0),
        (ParamId::Channel(0, ChannelParam::FilterMode), 0),
    ];
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let (_handle, mut controls) = control_channel(&config, 16);
    let input = constant_input(1, 0.5);
    let mut output = AudioOutput::new(2, BLOCK);

    for _ in 0..4 {
        graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
        assert!(output.buffers.iter().flatten().all(|&s| s == 0.0));
    }
    assert_eq!(graph.channels()[0].gain(), 0.0);
}

#[test]
fn configured_ping_pong_survives_the_control_boundary() {
    let mut config = EngineConfig::default();
    config.delay.ping_pong = true;
    config.envelope.cascade = true;
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let (_handle, mut controls) = control_channel(&config, 16);
    let mut output = AudioOutput::new(2, BLOCK);

    graph.process_controlled(&mut controls, &constant_input(1, 0.0), &mut output, BLOCK);
    assert!(graph.delay().is_ping_pong());
    assert!(graph.envelope().cascade());
}

#[test]
fn pan_moves_the_channel_between_sides() {
    let config = EngineConfig::default();
    let (handle, mut controls) = control_channel(&config, 16);
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let input = constant_input(1, 0.5);
    let mut output = AudioOutput::new(2, BLOCK);

    handle
        .set(ParamId::Channel(0, ChannelParam::Pan), 50)
        .expect("valid param");
    for _ in 0..4 {
        graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    }
    assert!(peak(&output.buffers[0]) > 0.1);
    assert!(peak(&output.buffers[1]) < 1e-4);
}

#[test]
fn ping_pong_first_repeat_lands_on_the_right() {
    let mut config = EngineConfig {
        buses: 2,
        ..EngineConfig::default()
    };
    config.routing.delay_bus = Some(1);
    config.delay.max_seconds = 0.05;
    config.delay.ping_pong = true;
    config.initial = vec![
        (ParamId::Channel(0, ChannelParam::Send(0)), 0),
        (ParamId::Channel(0, ChannelParam::Send(1)), 1000),
        (ParamId::Channel(0, ChannelParam::FilterMode), 0),
        (ParamId::Master(MasterParam::DelayLevel), 500),
        (ParamId::Master(MasterParam::DelayTime), 200),
    ];
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let d = graph.delay().delay_samples();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for i in 0..=d {
        let x = if i == 0 { 1.0 } else { 0.0 };
        let (l, r) = graph.process_frame(|_| x);
        left.push(l);
        right.push(r);
    }
    assert!(left.iter().all(|&s| s == 0.0));
    assert!(right[..d].iter().all(|&s| s == 0.0));
    assert!(right[d] > 0.0);
}

#[test]
fn mute_event_silences_reverb_tail() {
    let mut config = EngineConfig {
        buses: 2,
        ..EngineConfig::default()
    };
    config.routing.reverb_bus = Some(1);
    config.initial = vec![
        (ParamId::Channel(0, ChannelParam::Send(0)), 0),
        (ParamId::Channel(0, ChannelParam::Send(1)), 1000),
        (ParamId::Master(MasterParam::ReverbLevel), 900),
    ];

    let (mut handle, mut controls) = control_channel(&config, 16);
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let mut output = AudioOutput::new(2, BLOCK);

    for _ in 0..40 {
        graph.process_controlled(&mut controls, &constant_input(1, 0.5), &mut output, BLOCK);
    }
    graph.process_controlled(&mut controls, &constant_input(1, 0.0), &mut output, BLOCK);
    assert!(peak(&output.buffers[0]) > 0.0, "reverb tail expected");

    handle.mute().expect("queue has room");
    graph.process_controlled(&mut controls, &constant_input(1, 0.0), &mut output, BLOCK);
    assert!(output.buffers.iter().flatten().all(|&s| s == 0.0));
}

#[test]
fn gate_drives_amplitude_envelope_through_the_queue() {
    let text = r#"
        channels = 1
        initial = [["env.attack", 0], ["env.release", 100], ["ch0.filter.mode", 0]]

        [routing]
        envelope_target = { amplitude = { channel = 0 } }
    "#;
    let config = EngineConfig::from_toml_str(text).expect("valid toml");
    let (mut handle, mut controls) = control_channel(&config, 16);
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let input = constant_input(1, 0.5);
    let mut output = AudioOutput::new(2, BLOCK);

    graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    assert_eq!(peak(&output.buffers[0]), 0.0);

    handle.gate(true).expect("queue has room");
    for _ in 0..20 {
        graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    }
    assert!(peak(&output.buffers[0]) > 0.1);

    handle.gate(false).expect("queue has room");
    // Release at knob 100 is 8 s · 0.01, plus the taper
    for _ in 0..(48_000 / BLOCK) {
        graph.process_controlled(&mut controls, &input, &mut output, BLOCK);
    }
    assert_eq!(peak(&output.buffers[0]), 0.0);
}

#[test]
fn output_stays_finite_under_heavy_settings() {
    let mut config = EngineConfig {
        channels: 2,
        buses: 3,
        ..EngineConfig::default()
    };
    config.routing.reverb_bus = Some(1);
    config.routing.delay_bus = Some(2);
    for channel in 0..2 {
        config.initial.extend([
            (ParamId::Channel(channel, ChannelParam::Gain), 1000),
            (ParamId::Channel(channel, ChannelParam::FilterResonance), 1000),
            (ParamId::Channel(channel, ChannelParam::FilterMode), 2),
            (ParamId::Channel(channel, ChannelParam::Drive), 1000),
            (ParamId::Channel(channel, ChannelParam::Send(1)), 1000),
            (ParamId::Channel(channel, ChannelParam::Send(2)), 1000),
        ]);
    }
    config.initial.extend([
        (ParamId::Master(MasterParam::DelayLevel), 1000),
        (ParamId::Master(MasterParam::ReverbLevel), 1000),
        (ParamId::Master(MasterParam::Drive), 1000),
        (ParamId::Master(MasterParam::DistortionType), 3),
    ]);
    let mut graph = AudioGraph::new(&config).expect("valid config");
    let mut output = AudioOutput::new(2, BLOCK);

    let input = AudioInput {
        buffers: (0..2)
            .map(|channel| {
                (0..BLOCK)
                    .map(|i| if (i / 8 + channel) % 2 == 0 { 1.0 } else { -1.0 })
                    .collect()
            })
            .collect(),
    };
    for _ in 0..400 {
        graph.process_block(&input, &mut output, BLOCK);
        assert!(output.buffers.iter().flatten().all(|s| s.is_finite()));
    }
}
