//! Analysis tap feeding the live waveform.
//!
//! Keeps a window of the most recent samples and exposes them as unsigned
//! byte amplitudes centred at 128. The tap only observes audio; nothing it
//! does reaches the encoder.

use std::collections::VecDeque;

/// Analysis window length in samples.
pub const FFT_SIZE: usize = 2048;

/// Rolling window over the captured audio.
pub struct AnalysisTap {
    window: VecDeque<i16>,
    fft_size: usize,
}

impl AnalysisTap {
    /// Creates a tap over a window of `fft_size` samples.
    pub fn new(fft_size: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(fft_size),
            fft_size,
        }
    }

    /// Number of bytes returned by [`Self::byte_time_domain`].
    pub fn buffer_len(&self) -> usize {
        self.fft_size / 2
    }

    pub fn feed(&mut self, samples: &[i16]) {
        // Only the tail of a large chunk can survive in the window.
        let start = samples.len().saturating_sub(self.fft_size);
        for &sample in &samples[start..] {
            if self.window.len() == self.fft_size {
                self.window.pop_front();
            }
            self.window.push_back(sample);
        }
    }

    /// Latest `buffer_len` samples as bytes; silence-padded before enough audio arrives.
    pub fn byte_time_domain(&self) -> Vec<u8> {
        let len = self.buffer_len();
        let mut bytes = vec![128u8; len];
        let available = self.window.len().min(len);
        let offset = len - available;
        let skip = self.window.len() - available;
        for (slot, &sample) in bytes[offset..].iter_mut().zip(self.window.iter().skip(skip)) {
            *slot = sample_to_byte(sample);
        }
        bytes
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new(FFT_SIZE)
    }
}

/// Maps a PCM sample to a byte amplitude where 128 is silence.
pub fn sample_to_byte(sample: i16) -> u8 {
    let normalized = sample as f32 / 32768.0;
    (128.0 * (1.0 + normalized)).clamp(0.0, 255.0) as u8
}
