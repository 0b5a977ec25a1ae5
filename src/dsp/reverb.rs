// Purpose - comb/allpass reverb tank built on DelayLine

/*
Reverb tank
===========

    in ──┬─▶ [comb 0] ─┐
         ├─▶ [comb 1] ─┤
         ├─▶ [comb 2] ─┼─▶ avg ─▶ [allpass 0] ─▶ [allpass 1] ─▶ out
         └─▶ [comb 3] ─┘

comb:     w = x + fb · lp(z^-D w),      y = z^-D w
allpass:  w = x + g · y,                y = z^-D w - g · x

lp is a one-pole lowpass inside the comb loop, so highs die first.

StereoReverb runs two tanks off one mono input; the right tank's delays are
stretched by a fraction of a millisecond, enough to decorrelate the tails.

Lines are sized for 192 kHz up front. `configure` only moves read taps.
*/

use crate::dsp::delay::DelayLine;

const MAX_SAMPLE_RATE: f32 = 192_000.0;
const COMB_MAX_MS: f32 = 50.0;
const ALLPASS_MAX_MS: f32 = 10.0;

/// Comb feedback ceiling. Anything at or above 1.0 runs away.
pub const MAX_FEEDBACK: f32 = 0.99;

const ALLPASS_GAIN: f32 = 0.5;
const ALLPASS_MAX_GAIN: f32 = 0.9;

/// Mutually prime-ish tunings, in ms.
const COMB_TUNING_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_TUNING_MS: [f32; 2] = [5.0, 1.7];

/// Extra delay on the right tank, in ms.
const STEREO_SPREAD_MS: f32 = 0.52;

fn capacity_for(ms: f32) -> usize {
    ms_to_taps(ms, MAX_SAMPLE_RATE) + 1
}

fn ms_to_taps(ms: f32, sample_rate: f32) -> usize {
    (ms * 0.001 * sample_rate) as usize
}

/// Feedback comb with a damped loop.
pub struct Comb {
    line: DelayLine,
    taps: usize,
    feedback: f32,
    damping: f32,
    lowpass: f32,
}

impl Comb {
    pub fn new(taps: usize) -> Self {
        let mut comb = Self {
            line: DelayLine::new(capacity_for(COMB_MAX_MS)),
            taps: 1,
            feedback: 0.5,
            damping: 0.2,
            lowpass: 0.0,
        };
        comb.set_taps(taps);
        comb
    }

    pub fn set_taps(&mut self, taps: usize) {
        self.taps = taps.clamp(1, self.line.capacity() - 1);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.taps);
        self.lowpass += (1.0 - self.damping) * (delayed - self.lowpass);
        self.line.write(input + self.lowpass * self.feedback);
        delayed
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.lowpass = 0.0;
    }
}

/// Schroeder allpass diffuser.
pub struct Allpass {
    line: DelayLine,
    taps: usize,
    gain: f32,
}

impl Allpass {
    pub fn new(taps: usize) -> Self {
        let mut allpass = Self {
            line: DelayLine::new(capacity_for(ALLPASS_MAX_MS)),
            taps: 1,
            gain: ALLPASS_GAIN,
        };
        allpass.set_taps(taps);
        allpass
    }

    pub fn set_taps(&mut self, taps: usize) {
        self.taps = taps.clamp(1, self.line.capacity() - 1);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, ALLPASS_MAX_GAIN);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.taps);
        let output = delayed - self.gain * input;
        self.line.write(input + self.gain * output);
        output
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}

/// One mono tank: four combs into two allpasses.
pub struct Tank {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
}

impl Tank {
    pub fn new(sample_rate: f32, stretch_ms: f32) -> Self {
        let mut tank = Self {
            combs: std::array::from_fn(|_| Comb::new(1)),
            allpasses: std::array::from_fn(|_| Allpass::new(1)),
        };
        tank.configure(sample_rate, stretch_ms);
        tank
    }

    pub fn configure(&mut self, sample_rate: f32, stretch_ms: f32) {
        let sample_rate = sample_rate.min(MAX_SAMPLE_RATE);
        for (comb, ms) in self.combs.iter_mut().zip(COMB_TUNING_MS) {
            comb.set_taps(ms_to_taps(ms + stretch_ms, sample_rate));
        }
        for (allpass, ms) in self.allpasses.iter_mut().zip(ALLPASS_TUNING_MS) {
            allpass.set_taps(ms_to_taps(ms + stretch_ms, sample_rate));
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.combs.iter_mut().for_each(|c| c.set_feedback(feedback));
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.combs.iter_mut().for_each(|c| c.set_damping(damping));
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let sum: f32 = self.combs.iter_mut().map(|c| c.process(input)).sum();
        self.allpasses
            .iter_mut()
            .fold(sum / self.combs.len() as f32, |x, ap| ap.process(x))
    }

    pub fn reset(&mut self) {
        self.combs.iter_mut().for_each(Comb::reset);
        self.allpasses.iter_mut().for_each(Allpass::reset);
    }
}

/// Mono in, stereo tail out.
pub struct StereoReverb {
    tanks: [Tank; 2],
}

impl StereoReverb {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            tanks: [
                Tank::new(sample_rate, 0.0),
                Tank::new(sample_rate, STEREO_SPREAD_MS),
            ],
        }
    }

    pub fn configure(&mut self, sample_rate: f32) {
        self.tanks[0].configure(sample_rate, 0.0);
        self.tanks[1].configure(sample_rate, STEREO_SPREAD_MS);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.tanks.iter_mut().for_each(|t| t.set_feedback(feedback));
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.tanks.iter_mut().for_each(|t| t.set_damping(damping));
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let [left, right] = &mut self.tanks;
        (left.process(input), right.process(input))
    }

    pub fn reset(&mut self) {
        self.tanks.iter_mut().for_each(Tank::reset);
    }
}
