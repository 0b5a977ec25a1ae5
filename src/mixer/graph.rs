use std::fmt;

use crate::{
    config::{ConfigError, EngineConfig, EnvelopeTarget, OutputRoute},
    dsp::{
        curve::{clamp_bipolar, tables, ParameterCurve},
        envelope::Envelope,
    },
    effects::{
        AudioEffect, Compressor, Delay, Distortion, DistortionType, DjFilter, Filter, FilterMode,
        Limiter, Reverb,
    },
    io::{AudioInput, AudioOutput},
    mixer::{
        channel::Channel,
        message::{ControlEvent, ControlReceiver, EventReceiver},
        params::{MasterParam, ParamId},
    },
};

/*
Audio Graph
===========

Per sample:

    inputs ──▶ [channel 0] ──┐
           ──▶ [channel 1] ──┼──▶ bus accumulators (zeroed every sample)
           ──▶ [channel N] ──┘        │
                                      ├── delay bus  ──▶ [delay]  ──┐
                                      ├── reverb bus ──▶ [reverb] ──┤
                                      │                             ▼
                                      └── main bus ──────────────▶ (+)
                                                                    │
          [filter] ◀────────────────────────────────────────────────┘
             │
             ▼
        [distortion] ─▶ [DJ filter] ─▶ [compressor] ─▶ [limiter] ─▶ output gain ─▶ out 0/1

Buses listed in the routing's external outputs are also copied, untouched by
the master chain, to their hardware output pairs.

The envelope ticks once per sample before the channels run, so its value
modulates the same sample it was computed for.
*/

static OUTPUT_CURVE: ParameterCurve = ParameterCurve::from_static(tables::LEVEL);

/// Master processing applied to the main bus.
pub struct MasterChain {
    pub filter: Filter,
    pub distortion: Distortion,
    pub dj: DjFilter,
    pub compressor: Compressor,
    pub limiter: Limiter,
    output_gain: f32,
}

impl MasterChain {
    fn new(sample_rate: f32) -> Self {
        let mut filter = Filter::new(sample_rate);
        filter.set_mode(FilterMode::Bypass);
        Self {
            filter,
            distortion: Distortion::new(),
            dj: DjFilter::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            limiter: Limiter::new(sample_rate),
            output_gain: 1.0,
        }
    }

    #[inline]
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.filter.process(left, right);
        let (l, r) = self.distortion.process(l, r);
        let (l, r) = self.dj.process(l, r);
        let (l, r) = self.compressor.process(l, r);
        let (l, r) = self.limiter.process(l, r);
        (l * self.output_gain, r * self.output_gain)
    }

    fn mute(&mut self) {
        self.filter.mute();
        self.distortion.mute();
        self.dj.mute();
        self.compressor.mute();
        self.limiter.mute();
    }
}

pub struct AudioGraph {
    sample_rate: f32,
    max_block_size: usize,
    channels: Vec<Channel>,
    buses: Box<[(f32, f32)]>,

    main_bus: usize,
    delay_bus: Option<usize>,
    reverb_bus: Option<usize>,
    routes: Vec<OutputRoute>,

    envelope: Envelope,
    envelope_target: EnvelopeTarget,
    envelope_amount: i32,

    delay: Delay,
    reverb: Reverb,
    master: MasterChain,
}

impl AudioGraph {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sr = config.sample_rate;

        let channels = (0..config.channels)
            .map(|_| Channel::new(sr, config.buses, config.routing.channel_filter))
            .collect();

        let mut graph = Self {
            sample_rate: sr,
            max_block_size: config.max_block_size,
            channels,
            buses: vec![(0.0, 0.0); config.buses].into_boxed_slice(),
            main_bus: config.routing.main_bus,
            delay_bus: config.routing.delay_bus,
            reverb_bus: config.routing.reverb_bus,
            routes: config.routing.outputs.clone(),
            envelope: Envelope::new(sr, &config.envelope),
            envelope_target: config.routing.envelope_target,
            envelope_amount: 0,
            delay: Delay::new(sr, &config.delay),
            reverb: Reverb::new(sr).as_send(),
            master: MasterChain::new(sr),
        };

        // Every knob starts at its default for this config, then the boot
        // values. `ParamBank::from_config` holds the same numbers.
        for id in ParamId::all(config.channels) {
            graph.set_param(id, id.default_for(config));
        }
        for &(id, value) in &config.initial {
            graph.set_param(id, value);
        }

        tracing::debug!(
            sample_rate = sr,
            channels = config.channels,
            buses = config.buses,
            delay_bus = ?config.routing.delay_bus,
            reverb_bus = ?config.routing.reverb_bus,
            envelope_target = ?config.routing.envelope_target,
            "audio graph ready"
        );
        Ok(graph)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    pub fn reverb(&self) -> &Reverb {
        &self.reverb
    }

    pub fn master(&self) -> &MasterChain {
        &self.master
    }

    /// Apply one knob value. Out-of-range values are clamped; parameters
    /// for channels this graph doesn't have are ignored.
    pub fn set_param(&mut self, id: ParamId, value: i32) {
        let value = id.clamp(value);
        match id {
            ParamId::Channel(channel, param) => {
                if let Some(channel) = self.channels.get_mut(channel) {
                    channel.set_param(param, value);
                }
            }
            ParamId::Master(param) => self.set_master_param(param, value),
        }
    }

    fn set_master_param(&mut self, param: MasterParam, value: i32) {
        let master = &mut self.master;
        match param {
            MasterParam::FilterFrequency => master.filter.set_frequency(value),
            MasterParam::FilterResonance => master.filter.set_resonance_knob(value),
            MasterParam::FilterMode => master.filter.set_mode(FilterMode::from_index(value)),
            MasterParam::FilterLevel => master.filter.set_level(value),
            MasterParam::Drive => master.distortion.set_drive(value),
            MasterParam::Tone => master.distortion.set_tone(value),
            MasterParam::DistortionType => {
                master.distortion.set_type(DistortionType::from_index(value))
            }
            MasterParam::DjFilter => master.dj.set_position(value),
            MasterParam::DjHardMute => master.dj.set_hard_mute(value != 0),
            MasterParam::CompThreshold => master.compressor.set_threshold(value),
            MasterParam::CompRatio => master.compressor.set_ratio(value),
            MasterParam::CompAttack => master.compressor.set_attack(value),
            MasterParam::CompRelease => master.compressor.set_release(value),
            MasterParam::CompMakeup => master.compressor.set_makeup(value),
            MasterParam::LimiterThreshold => master.limiter.set_threshold(value),
            MasterParam::LimiterRelease => master.limiter.set_release(value),
            MasterParam::OutputGain => master.output_gain = OUTPUT_CURVE.evaluate(value),
            MasterParam::DelayTime => self.delay.set_time(value),
            MasterParam::DelayLevel => self.delay.set_level(value),
            MasterParam::DelayHighpass => self.delay.set_highpass(value),
            MasterParam::DelayLowpass => self.delay.set_lowpass(value),
            MasterParam::DelayPingPong => self.delay.set_ping_pong(value != 0),
            MasterParam::ReverbLevel => self.reverb.set_level(value),
            MasterParam::ReverbPredelay => self.reverb.set_predelay(value),
            MasterParam::ReverbHighpass => self.reverb.set_highpass(value),
            MasterParam::ReverbLowpass => self.reverb.set_lowpass(value),
            MasterParam::EnvAttack => self.envelope.set_attack(value),
            MasterParam::EnvHold => self.envelope.set_hold(value),
            MasterParam::EnvRelease => self.envelope.set_release(value),
            MasterParam::EnvAttackContour => self.envelope.set_attack_contour(value),
            MasterParam::EnvReleaseContour => self.envelope.set_release_contour(value),
            MasterParam::EnvCascade => self.envelope.set_cascade(value != 0),
            MasterParam::EnvAmount => self.envelope_amount = clamp_bipolar(value),
        }
    }

    pub fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Trigger => self.envelope.trigger(),
            ControlEvent::Gate(true) => {
                self.envelope.set_gate(true);
                self.envelope.trigger();
            }
            ControlEvent::Gate(false) => self.envelope.set_gate(false),
            ControlEvent::TriggerReverb => self.reverb.trigger(),
            ControlEvent::Mute => self.mute(),
        }
    }

    /// Pull pending knob changes and events. Call once per block, before
    /// processing.
    pub fn poll<R: EventReceiver>(&mut self, controls: &mut ControlReceiver<R>) {
        controls.drain_params(|id, value| self.set_param(id, value));
        while let Some(event) = controls.pop_event() {
            self.handle_event(event);
        }
    }

    /// Silence every tail and stop the envelope. The reverb gate is
    /// re-armed so the send keeps working afterwards.
    pub fn mute(&mut self) {
        self.envelope.mute();
        for channel in &mut self.channels {
            channel.mute();
        }
        self.delay.mute();
        self.reverb.mute();
        self.reverb.trigger();
        self.master.mute();
        self.buses.fill((0.0, 0.0));
    }

    fn apply_envelope(&mut self) {
        self.envelope.tick();
        let value = self.envelope.value();
        match self.envelope_target {
            EnvelopeTarget::None => {}
            EnvelopeTarget::FilterCutoff { channel } => {
                if let Some(channel) = self.channels.get_mut(channel) {
                    let offset = (value * self.envelope_amount as f32).round() as i32;
                    channel.set_filter_offset(offset);
                }
            }
            EnvelopeTarget::Amplitude { channel } => {
                if let Some(channel) = self.channels.get_mut(channel) {
                    channel.set_amplitude(value);
                }
            }
        }
    }

    /// Process one frame. `input(n)` yields the sample for channel `n`.
    /// Returns the main stereo output; routed buses are left in
    /// [`bus`](Self::bus).
    #[inline]
    pub fn process_frame(&mut self, input: impl Fn(usize) -> f32) -> (f32, f32) {
        self.buses.fill((0.0, 0.0));
        self.apply_envelope();

        for (index, channel) in self.channels.iter_mut().enumerate() {
            let outputs = channel.process(input(index));
            for (bus, out) in self.buses.iter_mut().zip(outputs.iter()) {
                bus.0 += out.0;
                bus.1 += out.1;
            }
        }

        let (mut left, mut right) = self.buses[self.main_bus];

        if let Some(bus) = self.delay_bus {
            let (l, r) = self.buses[bus];
            let (l, r) = self.delay.process(l, r);
            left += l;
            right += r;
        }
        if let Some(bus) = self.reverb_bus {
            let (l, r) = self.buses[bus];
            let (l, r) = self.reverb.process(l, r);
            left += l;
            right += r;
        }

        self.master.process(left, right)
    }

    /// Stereo sum of a bus after the most recent frame.
    pub fn bus(&self, bus: usize) -> (f32, f32) {
        self.buses.get(bus).copied().unwrap_or((0.0, 0.0))
    }

    /// Process `frames` samples. Output 0/1 carry the master chain; routed
    /// buses go to their configured pairs.
    pub fn process_block(&mut self, input: &AudioInput, output: &mut AudioOutput, frames: usize) {
        debug_assert!(frames <= self.max_block_size);

        for frame in 0..frames {
            let (left, right) = self.process_frame(|channel| input.sample(channel, frame));
            output.write(0, frame, left);
            output.write(1, frame, right);

            for route in &self.routes {
                let (l, r) = self.buses[route.bus];
                output.write(route.left, frame, l);
                output.write(route.right, frame, r);
            }
        }
    }

    /// Poll controls, then process a block.
    pub fn process_controlled<R: EventReceiver>(
        &mut self,
        controls: &mut ControlReceiver<R>,
        input: &AudioInput,
        output: &mut AudioOutput,
        frames: usize,
    ) {
        self.poll(controls);
        self.process_block(input, output, frames);
    }
}

impl fmt::Display for AudioGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.envelope)?;
        for (index, channel) in self.channels.iter().enumerate() {
            writeln!(f, "{}: {}", index, channel)?;
        }
        writeln!(f, "{}", self.delay)?;
        writeln!(f, "{}", self.reverb)?;
        writeln!(f, "{}", self.master.filter)?;
        writeln!(f, "{}", self.master.distortion)?;
        writeln!(f, "{}", self.master.dj)?;
        writeln!(f, "{}", self.master.compressor)?;
        write!(f, "{} out={:.2}", self.master.limiter, self.master.output_gain)
    }
}
