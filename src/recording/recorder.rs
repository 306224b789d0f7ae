//! Recording state machine.
//!
//! [`Recorder`] owns every resource a recording needs and pairs each
//! acquisition with its release: the capture session lives exactly while
//! recording or paused, the playable URL exactly while completed, and the
//! timer and animation frame only while recording. Dropping the recorder
//! releases whatever is still held.

use std::fmt;
use std::time::{Duration, Instant};

use super::analysis::AnalysisTap;
use super::capture::{CaptureError, CaptureSession, Microphone};
use super::clip_store::{ClipStore, PlayableUrl};
use super::encoder::{encoder_for, EncodedClip};
use super::timer::{AnimationFrame, IntervalTimer};
use super::visualizations::{draw_waveform, Surface};
use crate::config::RecorderConfig;

/// Lifecycle of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Inactive,
    Recording,
    Paused,
    Completed,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Recording => write!(f, "recording"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The output of a completed recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingResult {
    pub clip: EncodedClip,
    pub url: PlayableUrl,
    /// Whole seconds recorded, excluding pauses
    pub duration: u32,
}

/// Invoked once per completed recording.
pub type CompletionCallback = Box<dyn FnMut(&RecordingResult)>;

/// Microphone recorder with duration limits and a live waveform.
pub struct Recorder {
    config: RecorderConfig,
    state: RecordingState,
    /// Seconds recorded so far
    elapsed: u32,
    session: Option<CaptureSession>,
    result: Option<RecordingResult>,
    microphone: Box<dyn Microphone>,
    store: Box<dyn ClipStore>,
    on_complete: CompletionCallback,
    timer: IntervalTimer,
    frame: AnimationFrame,
    /// Byte amplitudes drawn by the most recent frame
    visualization: Vec<u8>,
}

impl Recorder {
    pub fn new(
        config: RecorderConfig,
        microphone: Box<dyn Microphone>,
        store: Box<dyn ClipStore>,
        on_complete: CompletionCallback,
    ) -> Self {
        Self {
            config,
            state: RecordingState::Inactive,
            elapsed: 0,
            session: None,
            result: None,
            microphone,
            store,
            on_complete,
            timer: IntervalTimer::new(Duration::from_secs(1)),
            frame: AnimationFrame::default(),
            visualization: Vec::new(),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn result(&self) -> Option<&RecordingResult> {
        self.result.as_ref()
    }

    /// True when a completed recording is shorter than `min_duration`.
    pub fn is_short(&self) -> bool {
        self.state == RecordingState::Completed && self.elapsed < self.config.min_duration
    }

    #[cfg(test)]
    pub fn visualization(&self) -> &[u8] {
        &self.visualization
    }

    /// Acquires the microphone and begins recording.
    ///
    /// On failure nothing is left behind and the recorder stays inactive.
    ///
    /// # Errors
    /// - If the microphone cannot be acquired
    pub fn start(&mut self, now: Instant) -> Result<(), CaptureError> {
        if self.state != RecordingState::Inactive {
            tracing::debug!("start ignored while {}", self.state);
            return Ok(());
        }

        let stream = self
            .microphone
            .acquire(self.config.sample_rate)
            .inspect_err(|e| tracing::error!("Failed to start recording: {}", e))?;

        let sample_rate = stream.sample_rate();
        let encoder = encoder_for(&self.config.format, sample_rate);
        self.session = Some(CaptureSession::new(stream, encoder, AnalysisTap::default()));

        self.elapsed = 0;
        self.state = RecordingState::Recording;
        self.timer.start(now);
        self.frame.request();

        tracing::info!(
            "Recording started at {}Hz (max {}s, format {})",
            sample_rate,
            self.config.max_duration,
            self.config.format
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state != RecordingState::Recording {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
        self.timer.clear();
        self.frame.cancel();
        self.state = RecordingState::Paused;
        tracing::debug!("Recording paused at {}s", self.elapsed);
    }

    /// Resumes capture; the elapsed time carries on from where it paused.
    pub fn resume(&mut self, now: Instant) {
        if self.state != RecordingState::Paused {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.resume();
        }
        self.timer.start(now);
        self.frame.request();
        self.state = RecordingState::Recording;
        tracing::debug!("Recording resumed at {}s", self.elapsed);
    }

    /// Finishes the recording and delivers the result to the completion callback.
    ///
    /// If the clip cannot be produced, the session is still released and the
    /// recorder returns to inactive without invoking the callback.
    ///
    /// # Errors
    /// - If the encoder fails to finalize
    /// - If the clip cannot be made playable
    pub fn stop(&mut self) -> anyhow::Result<()> {
        if !matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            return Ok(());
        }

        self.timer.clear();
        self.frame.cancel();
        self.visualization.clear();

        let finished = match self.session.take() {
            Some(mut session) => session.finish(),
            None => Err(anyhow::anyhow!("No capture session while {}", self.state)),
        };
        let minted = finished.and_then(|clip| {
            let url = self.store.mint(&clip)?;
            Ok((clip, url))
        });

        let (clip, url) = match minted {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Failed to finish recording: {}", e);
                self.state = RecordingState::Inactive;
                self.elapsed = 0;
                return Err(e);
            }
        };

        let result = RecordingResult {
            clip,
            url,
            duration: self.elapsed,
        };
        self.state = RecordingState::Completed;

        tracing::info!(
            "Recording completed: {}s, {} bytes ({})",
            result.duration,
            result.clip.bytes.len(),
            result.clip.mime_type()
        );
        if self.is_short() {
            tracing::warn!(
                "Recording shorter than minimum: {}s < {}s",
                result.duration,
                self.config.min_duration
            );
        }

        (self.on_complete)(&result);
        self.result = Some(result);
        Ok(())
    }

    /// Discards a completed recording and releases its playable URL.
    pub fn reset(&mut self) {
        if self.state != RecordingState::Completed {
            return;
        }
        if let Some(result) = self.result.take() {
            self.store.release(&result.url);
        }
        self.elapsed = 0;
        self.state = RecordingState::Inactive;
        tracing::debug!("Recorder reset");
    }

    /// Advances the elapsed time by one second, stopping at `max_duration`.
    ///
    /// # Errors
    /// - If the automatic stop fails
    pub fn tick(&mut self) -> anyhow::Result<()> {
        if self.state != RecordingState::Recording {
            return Ok(());
        }
        self.elapsed += 1;
        if self.elapsed >= self.config.max_duration {
            tracing::info!("Maximum duration of {}s reached", self.config.max_duration);
            self.stop()?;
        }
        Ok(())
    }

    /// Pumps captured audio and runs every timer tick due at `now`.
    ///
    /// # Errors
    /// - If an automatic stop fails
    pub fn poll(&mut self, now: Instant) -> anyhow::Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.pump();
        }
        while self.timer.poll(now) {
            self.tick()?;
        }
        Ok(())
    }

    /// Runs the pending animation frame, if any: redraws the waveform and
    /// requests the next frame. Returns whether anything was drawn.
    pub fn on_frame(&mut self, surface: &mut dyn Surface) -> bool {
        if self.state != RecordingState::Recording || !self.frame.take() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        session.pump();
        self.visualization = session.visualization();
        draw_waveform(surface, &self.visualization);
        self.frame.request();
        true
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.timer.clear();
        self.frame.cancel();
        if self.session.take().is_some() {
            tracing::debug!("Recorder dropped while {}, capture released", self.state);
        }
        if let Some(result) = self.result.take() {
            self.store.release(&result.url);
        }
    }
}
