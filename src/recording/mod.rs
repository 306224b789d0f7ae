//! Audio recording feature for tunecap.
//!
//! Provides microphone capture, the recording state machine, clip encoding,
//! live waveform visualization and the terminal interface around them.

pub mod analysis;
pub mod audio;
pub mod capture;
pub mod clip_store;
pub mod encoder;
pub mod ffmpeg;
pub mod recorder;
pub mod timer;
pub mod ui;
pub mod visualizations;

#[cfg(test)]
pub(crate) mod testing;

pub use audio::CpalMicrophone;
pub use clip_store::TempFileStore;
pub use recorder::{Recorder, RecordingResult, RecordingState};
pub use ui::{RecorderCommand, RecorderTui};
