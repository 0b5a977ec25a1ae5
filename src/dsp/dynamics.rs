//! Mono dynamics units: feed-forward compressor and peak limiter.
//!
//! Both follow the same recipe:
//!
//! 1. Track the input level with a one-pole envelope follower whose
//!    coefficient switches between attack (rising) and release (falling).
//! 2. Convert the envelope to dB and compute how far it sits above the
//!    threshold.
//! 3. Reduce gain by `overshoot · (1 - 1/ratio)` dB.
//!
//! A limiter is the ratio → ∞ case with a near-instant attack.

const LN10_OVER_20: f32 = std::f32::consts::LN_10 / 20.0;
const TWENTY_OVER_LN10: f32 = 20.0 / std::f32::consts::LN_10;
const DENORMAL_THRESHOLD: f32 = 1e-15;

#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    (db * LN10_OVER_20).exp()
}

#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -f32::INFINITY
    } else {
        linear.ln() * TWENTY_OVER_LN10
    }
}

#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        x
    }
}

#[inline]
fn time_coeff(ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / ((ms.max(0.01) / 1000.0) * sample_rate)).exp()
}

/// Soft knee width around the threshold.
const KNEE_DB: f32 = 6.0;

pub struct CompressorUnit {
    sample_rate: f32,
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    makeup: f32,

    attack_coeff: f32,
    release_coeff: f32,

    envelope: f32,
    gain_reduction_db: f32,
}

impl CompressorUnit {
    pub fn new(sample_rate: f32) -> Self {
        let mut unit = Self {
            sample_rate,
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            makeup: 1.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
            gain_reduction_db: 0.0,
        };
        unit.update_coefficients();
        unit
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
        self.update_coefficients();
    }

    pub fn set_threshold(&mut self, db: f32) {
        self.threshold_db = db.clamp(-60.0, 0.0);
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(1.0, 100.0);
    }

    pub fn set_attack(&mut self, ms: f32) {
        self.attack_ms = ms.clamp(0.01, 500.0);
        self.update_coefficients();
    }

    pub fn set_release(&mut self, ms: f32) {
        self.release_ms = ms.clamp(1.0, 5000.0);
        self.update_coefficients();
    }

    pub fn set_makeup(&mut self, db: f32) {
        self.makeup = db_to_linear(db.clamp(0.0, 24.0));
    }

    fn update_coefficients(&mut self) {
        self.attack_coeff = time_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_coeff(self.release_ms, self.sample_rate);
    }

    fn compute_gain_reduction(&self, input_db: f32) -> f32 {
        let half_knee = KNEE_DB / 2.0;
        let slope = 1.0 - 1.0 / self.ratio;

        if input_db < self.threshold_db - half_knee {
            0.0
        } else if input_db > self.threshold_db + half_knee {
            (input_db - self.threshold_db) * slope
        } else {
            let knee_input = input_db - self.threshold_db + half_knee;
            (knee_input * knee_input) / (2.0 * KNEE_DB) * slope
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let detect = input.abs();
        let coeff = if detect > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = flush_denormal(coeff * self.envelope + (1.0 - coeff) * detect);

        self.gain_reduction_db = if self.envelope > 1e-10 {
            self.compute_gain_reduction(linear_to_db(self.envelope))
        } else {
            0.0
        };

        input * db_to_linear(-self.gain_reduction_db) * self.makeup
    }

    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain_reduction_db = 0.0;
    }
}

/// Peak limiter with instant attack and a hard ceiling.
pub struct LimiterUnit {
    sample_rate: f32,
    ceiling: f32,
    release_ms: f32,
    release_coeff: f32,
    gain: f32,
}

impl LimiterUnit {
    pub fn new(sample_rate: f32) -> Self {
        let mut unit = Self {
            sample_rate,
            ceiling: db_to_linear(-0.3),
            release_ms: 100.0,
            release_coeff: 0.0,
            gain: 1.0,
        };
        unit.set_release(100.0);
        unit
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
        self.set_release(self.release_ms);
    }

    pub fn set_threshold(&mut self, db: f32) {
        self.ceiling = db_to_linear(db.clamp(-30.0, 0.0));
    }

    pub fn set_release(&mut self, ms: f32) {
        self.release_ms = ms.clamp(1.0, 5000.0);
        self.release_coeff = time_coeff(self.release_ms, self.sample_rate);
    }

    pub fn threshold_db(&self) -> f32 {
        linear_to_db(self.ceiling)
    }

    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let peak = input.abs();
        let target = if peak > self.ceiling {
            self.ceiling / peak
        } else {
            1.0
        };

        if target < self.gain {
            self.gain = target;
        } else {
            self.gain = target + (self.gain - target) * self.release_coeff;
        }

        let out = input * self.gain;
        out.clamp(-self.ceiling, self.ceiling)
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}
