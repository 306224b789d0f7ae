//! Capture capabilities and the live capture session.
//!
//! The recorder never touches audio hardware directly. It asks a [`Microphone`]
//! for an [`InputStream`] and wires that stream to an encoder and an analysis
//! tap, bundled as a [`CaptureSession`].

use thiserror::Error;

use super::analysis::AnalysisTap;
use super::encoder::{EncodedClip, Encoder};

/// Failure to acquire the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoDevice,
    #[error("Audio input device '{0}' not found. Use 'tunecap list-devices' to see available devices.")]
    DeviceNotFound(String),
    #[error("Microphone access denied")]
    PermissionDenied,
    #[error("Audio input device is busy")]
    DeviceBusy,
    #[error("Audio device configuration failed: {0}")]
    Config(String),
    #[error("Audio stream failed: {0}")]
    Stream(String),
}

/// Source of live audio streams.
pub trait Microphone {
    /// Opens one mono input stream.
    ///
    /// The stream may run at a different rate than requested; callers must use
    /// [`InputStream::sample_rate`] for anything derived from the captured audio.
    fn acquire(&mut self, requested_sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError>;
}

/// A live, mono, 16-bit input stream.
pub trait InputStream {
    /// Actual rate the device captures at.
    fn sample_rate(&self) -> u32;

    /// Returns the samples captured since the previous call.
    fn read(&mut self) -> Vec<i16>;

    /// While paused, captured audio is discarded.
    fn set_paused(&mut self, paused: bool);

    /// Stops capture and releases the device. Further reads return nothing.
    fn stop(&mut self);
}

/// Resources that exist only while recording or paused.
pub struct CaptureSession {
    stream: Box<dyn InputStream>,
    encoder: Box<dyn Encoder>,
    tap: AnalysisTap,
}

impl CaptureSession {
    pub fn new(stream: Box<dyn InputStream>, encoder: Box<dyn Encoder>, tap: AnalysisTap) -> Self {
        Self {
            stream,
            encoder,
            tap,
        }
    }

    /// Moves newly captured audio into the tap and the encoder.
    pub fn pump(&mut self) {
        let chunk = self.stream.read();
        if chunk.is_empty() {
            return;
        }
        self.tap.feed(&chunk);
        self.encoder.push(&chunk);
    }

    /// Flushes pending audio, then suspends capture.
    pub fn pause(&mut self) {
        self.pump();
        self.stream.set_paused(true);
    }

    pub fn resume(&mut self) {
        self.stream.set_paused(false);
    }

    /// Latest time-domain bytes from the analysis tap.
    pub fn visualization(&self) -> Vec<u8> {
        self.tap.byte_time_domain()
    }

    /// Flushes, releases the microphone, and finalizes the encoder.
    ///
    /// The stream is stopped even when encoding fails.
    pub fn finish(&mut self) -> anyhow::Result<EncodedClip> {
        self.pump();
        self.stream.stop();
        self.encoder.finalize()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stream.stop();
    }
}
