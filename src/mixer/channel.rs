use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::curve::{clamp_knob, knob_fraction, tables, ParameterCurve},
    effects::{AudioEffect, Distortion, DistortionType, DjFilter, Filter, FilterMode, Panner},
    mixer::params::ChannelParam,
};

static GAIN_CURVE: ParameterCurve = ParameterCurve::from_static(tables::GAIN);

/// Which filter a channel is built with.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFilterKind {
    #[default]
    Standard,
    Dj,
}

pub enum ChannelFilter {
    Standard(Filter),
    Dj(DjFilter),
}

impl ChannelFilter {
    fn new(kind: ChannelFilterKind, sample_rate: f32) -> Self {
        match kind {
            ChannelFilterKind::Standard => ChannelFilter::Standard(Filter::new(sample_rate)),
            ChannelFilterKind::Dj => ChannelFilter::Dj(DjFilter::new(sample_rate)),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        match self {
            ChannelFilter::Standard(filter) => filter.process_mono(input),
            ChannelFilter::Dj(filter) => filter.process_mono(input),
        }
    }

    fn mute(&mut self) {
        match self {
            ChannelFilter::Standard(filter) => filter.mute(),
            ChannelFilter::Dj(filter) => filter.mute(),
        }
    }
}

/// One mono input strip: gain → distortion → filter → pan → bus sends.
pub struct Channel {
    gain_knob: i32,
    gain: f32,
    amplitude: f32,
    distortion: Distortion,
    filter: ChannelFilter,
    panner: Panner,
    sends: Box<[f32]>,
    outputs: Box<[(f32, f32)]>,
}

impl Channel {
    /// A channel feeding `buses` buses, full send to bus 0 only.
    pub fn new(sample_rate: f32, buses: usize, filter: ChannelFilterKind) -> Self {
        let buses = buses.max(1);
        let mut sends = vec![0.0; buses].into_boxed_slice();
        sends[0] = 1.0;
        Self {
            gain_knob: 750,
            gain: GAIN_CURVE.evaluate(750),
            amplitude: 1.0,
            distortion: Distortion::new(),
            filter: ChannelFilter::new(filter, sample_rate),
            panner: Panner::new(),
            sends,
            outputs: vec![(0.0, 0.0); buses].into_boxed_slice(),
        }
    }

    pub fn set_param(&mut self, param: ChannelParam, value: i32) {
        match param {
            ChannelParam::Gain => self.set_gain(value),
            ChannelParam::Pan => self.panner.set_position(value),
            ChannelParam::Drive => self.distortion.set_drive(value),
            ChannelParam::Tone => self.distortion.set_tone(value),
            ChannelParam::DistortionType => {
                self.distortion.set_type(DistortionType::from_index(value))
            }
            ChannelParam::Send(bus) => self.set_send(bus as usize, value),
            ChannelParam::FilterFrequency
            | ChannelParam::FilterResonance
            | ChannelParam::FilterMode
            | ChannelParam::DjFilter => self.set_filter_param(param, value),
        }
    }

    fn set_filter_param(&mut self, param: ChannelParam, value: i32) {
        match (&mut self.filter, param) {
            (ChannelFilter::Standard(f), ChannelParam::FilterFrequency) => f.set_frequency(value),
            (ChannelFilter::Standard(f), ChannelParam::FilterResonance) => {
                f.set_resonance_knob(value)
            }
            (ChannelFilter::Standard(f), ChannelParam::FilterMode) => {
                f.set_mode(FilterMode::from_index(value))
            }
            (ChannelFilter::Dj(f), ChannelParam::DjFilter) => f.set_position(value),
            (ChannelFilter::Dj(f), ChannelParam::FilterResonance) => {
                f.set_resonance(knob_fraction(value))
            }
            // controls for the filter this channel doesn't have
            _ => {}
        }
    }

    pub fn set_gain(&mut self, knob: i32) {
        self.gain_knob = clamp_knob(knob);
        self.gain = GAIN_CURVE.evaluate(self.gain_knob);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Send level knob for one bus. Buses this channel doesn't have are
    /// ignored.
    pub fn set_send(&mut self, bus: usize, knob: i32) {
        if let Some(level) = self.sends.get_mut(bus) {
            *level = knob_fraction(knob);
        }
    }

    pub fn send(&self, bus: usize) -> f32 {
        self.sends.get(bus).copied().unwrap_or(0.0)
    }

    /// Envelope → filter cutoff, in knob units. Ignored by DJ channels.
    pub fn set_filter_offset(&mut self, offset: i32) {
        if let ChannelFilter::Standard(filter) = &mut self.filter {
            filter.set_offset(offset);
        }
    }

    /// Envelope → amplitude, 0.0..=1.0.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    pub fn filter(&self) -> &ChannelFilter {
        &self.filter
    }

    pub fn distortion(&self) -> &Distortion {
        &self.distortion
    }

    pub fn panner(&self) -> &Panner {
        &self.panner
    }

    /// Run one input sample. Returns this channel's stereo output per bus.
    #[inline]
    pub fn process(&mut self, input: f32) -> &[(f32, f32)] {
        let x = input * self.gain * self.amplitude;
        let x = self.distortion.process_mono(x);
        let x = self.filter.process(x);
        let (l, r) = self.panner.pan(x);

        for (out, &level) in self.outputs.iter_mut().zip(self.sends.iter()) {
            *out = (l * level, r * level);
        }
        &self.outputs
    }

    /// Output from the most recent `process` call.
    pub fn outputs(&self) -> &[(f32, f32)] {
        &self.outputs
    }

    pub fn mute(&mut self) {
        self.distortion.mute();
        self.filter.mute();
        self.outputs.fill((0.0, 0.0));
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH g={} {} {}", self.gain_knob, self.panner, self.distortion)?;
        match &self.filter {
            ChannelFilter::Standard(filter) => write!(f, " {}", filter)?,
            ChannelFilter::Dj(filter) => write!(f, " {}", filter)?,
        }
        for (bus, level) in self.sends.iter().enumerate() {
            write!(f, " s{}={:.2}", bus, level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn open_channel(buses: usize) -> Channel {
        let mut channel = Channel::new(SAMPLE_RATE, buses, ChannelFilterKind::Standard);
        channel.set_param(ChannelParam::FilterMode, 0);
        channel
    }

    #[test]
    fn test_unity_gain_centre_pan() {
        let mut channel = open_channel(1);
        let out = channel.process(1.0)[0];
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((out.0 - expected).abs() < 1e-4);
        assert!((out.1 - expected).abs() < 1e-4);
    }

    #[test]
    fn test_bus_outputs_scale_by_send_level() {
        let mut channel = open_channel(3);
        channel.set_param(ChannelParam::Pan, 50);
        channel.set_param(ChannelParam::Send(1), 500);
        channel.set_param(ChannelParam::Send(2), 0);

        let out = channel.process(0.8);
        assert_eq!(out.len(), 3);
        assert!((out[0].0 - 0.8).abs() < 1e-4);
        assert!((out[1].0 - 0.4).abs() < 1e-4);
        assert_eq!(out[2], (0.0, 0.0));
    }

    #[test]
    fn test_sends_to_missing_buses_are_ignored() {
        let mut channel = open_channel(2);
        channel.set_send(5, 1000);
        assert_eq!(channel.send(5), 0.0);
        assert_eq!(channel.outputs().len(), 2);
    }

    #[test]
    fn test_gain_zero_silences() {
        let mut channel = open_channel(1);
        channel.set_param(ChannelParam::Gain, 0);
        assert_eq!(channel.process(1.0)[0], (0.0, 0.0));
    }

    #[test]
    fn test_amplitude_modulation() {
        let mut channel = open_channel(1);
        channel.set_param(ChannelParam::Pan, 50);
        channel.set_amplitude(0.25);
        assert!((channel.process(1.0)[0].0 - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_dj_channel_ignores_standard_controls() {
        let mut channel = Channel::new(SAMPLE_RATE, 1, ChannelFilterKind::Dj);
        channel.set_param(ChannelParam::FilterFrequency, 0);
        channel.set_filter_offset(-1000);
        channel.set_param(ChannelParam::Pan, 50);
        // DJ knob centred: straight through
        assert!((channel.process(0.5)[0].0 - 0.5).abs() < 1e-4);
    }
}
