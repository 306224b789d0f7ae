//! Interactive clip capture.
//!
//! Runs the recorder inside the terminal UI and, once a clip is accepted,
//! writes it where the caller asked. Supports external stop via SIGUSR1.

use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{RecorderOverrides, TunecapConfig};
use crate::recording::{
    CpalMicrophone, Recorder, RecorderCommand, RecorderTui, RecordingResult, RecordingState,
    TempFileStore,
};

/// Options for one `record` invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Output file or directory for the accepted clip
    pub output: Option<PathBuf>,
    /// Input device override
    pub device: Option<String>,
    /// Recorder settings from the command line
    pub overrides: RecorderOverrides,
}

/// Records a clip and hands the accepted result to the output location.
///
/// # Errors
/// - If the configuration cannot be loaded or is invalid
/// - If the terminal UI fails
/// - If the clip cannot be written
pub async fn handle_record(options: RecordOptions) -> Result<(), anyhow::Error> {
    tracing::info!("=== tunecap recorder started ===");

    let file_config = TunecapConfig::load().inspect_err(|e| {
        tracing::error!("Failed to load configuration: {e}");
    })?;
    let recorder_config = file_config.recorder_config(&options.overrides)?;
    let device = options
        .device
        .clone()
        .unwrap_or_else(|| file_config.audio.device.clone());

    tracing::info!(
        "Configuration: device={}, sample_rate={}Hz, max={}s, min={}s, format={}",
        device,
        recorder_config.sample_rate,
        recorder_config.max_duration,
        recorder_config.min_duration,
        recorder_config.format
    );

    let min_duration = recorder_config.min_duration;
    let accepted = {
        let delivered: Rc<RefCell<Option<RecordingResult>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&delivered);
        let mut recorder = Recorder::new(
            recorder_config,
            Box::new(CpalMicrophone::new(device)),
            Box::new(TempFileStore::new()),
            Box::new(move |result: &RecordingResult| {
                *sink.borrow_mut() = Some(result.clone());
            }),
        );

        let accept = run_recorder_loop(&mut recorder)?;
        let result = delivered.borrow_mut().take();
        // Dropping the recorder releases the microphone and the temp clip.
        drop(recorder);
        result.filter(|_| accept)
    };

    match accepted {
        Some(result) => {
            let path = save_clip(&result, options.output.as_deref()).await?;
            if result.duration < min_duration {
                eprintln!(
                    "Warning: clip is only {}s long; recognition may be unreliable",
                    result.duration
                );
            }
            println!(
                "{}\t{}s\t{}",
                path.display(),
                result.duration,
                result.clip.mime_type()
            );
        }
        None => tracing::info!("No clip accepted"),
    }

    tracing::info!("=== tunecap recorder exited ===");
    Ok(())
}

/// Drives input, timer and frames until the user leaves.
///
/// Returns whether the completed clip was accepted.
fn run_recorder_loop(recorder: &mut Recorder) -> anyhow::Result<bool> {
    let stop_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&stop_requested))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = RecorderTui::new()?;
    tracing::debug!("Entering recorder loop");

    let accepted = loop {
        if stop_requested.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: stopping recording");
            report(&mut tui, recorder.stop(), "Recording failed");
        }

        match tui.handle_input()? {
            RecorderCommand::Continue => {}
            RecorderCommand::Start => match recorder.start(Instant::now()) {
                Ok(()) => tui.clear_status(),
                Err(e) => tui.set_status(format!("{e}. Press r to retry.")),
            },
            RecorderCommand::TogglePause => match recorder.state() {
                RecordingState::Recording => recorder.pause(),
                RecordingState::Paused => recorder.resume(Instant::now()),
                _ => {}
            },
            RecorderCommand::Stop => report(&mut tui, recorder.stop(), "Recording failed"),
            RecorderCommand::Reset => recorder.reset(),
            RecorderCommand::Accept => {
                if recorder.state() == RecordingState::Completed {
                    break true;
                }
            }
            RecorderCommand::Quit => break recorder.state() == RecordingState::Completed,
        }

        report(&mut tui, recorder.poll(Instant::now()), "Recording failed");
        recorder.on_frame(tui.surface_mut());
        tui.render(recorder)?;
    };

    tracing::debug!(
        "Leaving recorder loop: state={}, capture active={}, accepted={}",
        recorder.state(),
        recorder.has_session(),
        accepted
    );
    tui.cleanup()?;
    Ok(accepted)
}

/// Shows a failed transition in the footer; the recorder is already back to a safe state.
fn report(tui: &mut RecorderTui, outcome: anyhow::Result<()>, context: &str) {
    if let Err(e) = outcome {
        tui.set_status(format!("{context}: {e}"));
    }
}

/// Writes the accepted clip and returns its path.
async fn save_clip(result: &RecordingResult, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = resolve_output_path(output, result.clip.format.extension(), Local::now());
    tokio::fs::write(&path, &result.clip.bytes)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write clip to {}: {e}", path.display()))?;
    tracing::info!(
        "Clip saved: {} ({} bytes, {}s)",
        path.display(),
        result.clip.bytes.len(),
        result.duration
    );
    Ok(path)
}

/// Chooses the clip path: an explicit file, or a timestamped name inside a
/// directory (the current one by default).
fn resolve_output_path(output: Option<&Path>, extension: &str, now: DateTime<Local>) -> PathBuf {
    let file_name = format!("recording_{}.{}", now.format("%Y%m%d_%H%M%S"), extension);
    match output {
        None => PathBuf::from(file_name),
        Some(dir) if dir.is_dir() => dir.join(file_name),
        Some(file) => file.to_path_buf(),
    }
}
