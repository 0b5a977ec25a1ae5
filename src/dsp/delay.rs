/// Fixed-capacity mono ring buffer.
///
/// The buffer is allocated once in `new` and never resized, so every method
/// is safe to call from the audio callback.
pub struct DelayLine {
    buffer: Box<[f32]>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)].into_boxed_slice(),
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Sample written `delay_samples` ago, without writing.
    #[inline]
    pub fn read(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(1, len - 1);
        let read_pos = (self.write_pos + len - delay_samples) % len;
        self.buffer[read_pos]
    }

    /// Write the next sample and advance.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Write `sample`, return the sample from `delay_samples` ago.
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let delayed = self.read(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: usize) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_comes_back_after_delay() {
        let mut line = DelayLine::new(64);
        let mut out = Vec::new();
        out.push(line.next_sample(1.0, 10));
        for _ in 0..20 {
            out.push(line.next_sample(0.0, 10));
        }
        assert_eq!(out.iter().position(|&x| x == 1.0), Some(10));
        assert_eq!(out.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new(8);
        for i in 0..8 {
            line.write(i as f32);
        }
        // 100 clamps to capacity - 1 = 7: the oldest sample still held
        assert_eq!(line.read(100), 1.0);
        assert_eq!(line.read(0), 7.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut line = DelayLine::new(16);
        line.write(1.0);
        line.reset();
        for d in 1..16 {
            assert_eq!(line.read(d), 0.0);
        }
    }
}
