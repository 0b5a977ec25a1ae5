// Purpose - block buffers at the edge of the engine

/// One buffer per hardware input.
#[derive(Debug, Default)]
pub struct AudioInput {
    pub buffers: Vec<Vec<f32>>,
}

/// One buffer per hardware output.
#[derive(Debug, Default)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioInput {
    /// `channels` zeroed buffers of `frames` samples.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }

    /// Sample `frame` of input `channel`, 0.0 when that input doesn't exist.
    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.buffers
            .get(channel)
            .and_then(|buffer| buffer.get(frame))
            .copied()
            .unwrap_or(0.0)
    }
}

impl AudioOutput {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }

    /// Write `frame` of output `channel`; outputs that don't exist are skipped.
    #[inline]
    pub fn write(&mut self, channel: usize, frame: usize, value: f32) {
        if let Some(slot) = self
            .buffers
            .get_mut(channel)
            .and_then(|buffer| buffer.get_mut(frame))
        {
            *slot = value;
        }
    }

    /// Copy frames into an interleaved buffer, as audio drivers expect.
    pub fn interleave(&self, out: &mut [f32], channels: usize) {
        for (frame, chunk) in out.chunks_mut(channels).enumerate() {
            for (channel, sample) in chunk.iter_mut().enumerate() {
                *sample = self
                    .buffers
                    .get(channel)
                    .and_then(|buffer| buffer.get(frame))
                    .copied()
                    .unwrap_or(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_channels_read_as_silence() {
        let input = AudioInput::new(1, 4);
        assert_eq!(input.sample(0, 3), 0.0);
        assert_eq!(input.sample(5, 0), 0.0);
        assert_eq!(input.sample(0, 10), 0.0);
    }

    #[test]
    fn test_interleave() {
        let mut output = AudioOutput::new(2, 3);
        for frame in 0..3 {
            output.write(0, frame, frame as f32);
            output.write(1, frame, -(frame as f32));
        }
        output.write(7, 0, 1.0);

        let mut interleaved = [9.0; 6];
        output.interleave(&mut interleaved, 2);
        assert_eq!(interleaved, [0.0, -0.0, 1.0, -1.0, 2.0, -2.0]);
    }
}
