use std::f32::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type              | built from                 | passes          | rejects      |
| ----------------- | -------------------------- | --------------- | ------------ |
| low-pass          | SVF v2 / ladder stage 4    | below cutoff    | above cutoff |
| high-pass         | SVF x - k·v1 - v2          | above cutoff    | below cutoff |
| band-pass         | SVF v1                     | around cutoff   | outside      |
| notch             | SVF x - k·v1               | outside         | at cutoff    |
*/

/// Lowest cutoff any filter in the engine will run at. Below this the
/// integrators in both topologies start to misbehave.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if cutoff_hz.is_nan() {
        return MIN_CUTOFF_HZ;
    }
    cutoff_hz.clamp(MIN_CUTOFF_HZ, max)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

/// Topology-preserving state-variable filter.
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    filter_type: FilterType,

    g: f32,
    k: f32,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            sample_rate,
            cutoff_hz: 1000.0,
            resonance: 0.0,
            filter_type,
            g: 0.0,
            k: 2.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self::new(FilterType::LowPass, sample_rate);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self::new(FilterType::HighPass, sample_rate);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let cutoff = clamp_cutoff(self.cutoff_hz, self.sample_rate);
        let wd = TAU * cutoff;
        let wa = (2.0 * self.sample_rate) * (wd / (2.0 * self.sample_rate)).tan();
        self.g = wa / (2.0 * self.sample_rate);
        self.k = 2.0 - (2.0 * self.resonance);
    }

    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let (k, g) = (self.k, self.g);
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let outputs = self.next_sample(sample);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::HighPass => outputs.highpass,
            FilterType::BandPass => outputs.bandpass,
            FilterType::Notch => outputs.notch,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        if cutoff != self.cutoff_hz {
            self.cutoff_hz = cutoff;
            self.update_coefficients();
        }
    }

    /// 0.0 (flat) to 1.0 (edge of self-oscillation).
    pub fn set_resonance(&mut self, resonance: f32) {
        // k must stay positive or the filter blows up
        self.resonance = resonance.clamp(0.0, 0.98);
        self.update_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }
}

/// Four cascaded one-pole stages with tanh-saturated feedback.
pub struct LadderFilter {
    stages: [f32; 4],
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    g: f32,
}

impl LadderFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            stages: [0.0; 4],
            sample_rate,
            cutoff_hz: 1000.0,
            resonance: 0.0,
            g: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let cutoff = clamp_cutoff(self.cutoff_hz, self.sample_rate);
        // g = 1 - e^(-2π·fc/fs)
        self.g = 1.0 - (-2.0 * PI * cutoff / self.sample_rate).exp();
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        if cutoff != self.cutoff_hz {
            self.cutoff_hz = cutoff;
            self.update_coefficients();
        }
    }

    /// 0.0 to 1.0, mapped onto the ladder's 0..4 feedback range (kept just
    /// below self-oscillation).
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let feedback = self.stages[3] * self.resonance * 3.9;
        let driven = (sample - feedback).tanh();

        let g = self.g;
        self.stages[0] += g * (driven - self.stages[0]);
        self.stages[1] += g * (self.stages[0] - self.stages[1]);
        self.stages[2] += g * (self.stages[1] - self.stages[2]);
        self.stages[3] += g * (self.stages[2] - self.stages[3]);

        self.stages[3]
    }

    pub fn reset(&mut self) {
        self.stages = [0.0; 4];
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }
}
