//! cpal-backed microphone.
//!
//! Captures from the system's default input device, or one chosen by name or
//! index, at the device's native rate. Multi-channel input is mixed down to
//! mono and handed to the UI thread through a mutex-guarded buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::{Arc, Mutex};

use super::capture::{CaptureError, InputStream, Microphone};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Samples shared between the cpal callback thread and the UI thread.
#[derive(Default)]
struct CaptureBuffer {
    pending: Vec<i16>,
    paused: bool,
}

/// Opens input streams on a configured device.
pub struct CpalMicrophone {
    /// Device name, numeric index, or "default"
    device_name: String,
}

impl CpalMicrophone {
    pub fn new(device_name: String) -> Self {
        Self { device_name }
    }
}

impl Microphone for CpalMicrophone {
    fn acquire(&mut self, requested_sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device().ok_or(CaptureError::NoDevice)
            } else {
                find_device(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();

        if sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                requested_sample_rate,
                sample_rate
            );
        }
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            channels,
            sample_format
        );

        let buffer = Arc::new(Mutex::new(CaptureBuffer::default()));
        let config: StreamConfig = supported.into();
        let stream = match sample_format {
            SampleFormat::I16 => {
                let sink = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        append_mono(&sink, data.iter().copied(), channels)
                    },
                    |err| tracing::error!("Audio stream error: {}", err),
                    None,
                )
            }
            SampleFormat::F32 => {
                let sink = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
                        append_mono(&sink, converted, channels)
                    },
                    |err| tracing::error!("Audio stream error: {}", err),
                    None,
                )
            }
            other => {
                return Err(CaptureError::Config(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(map_build_error)?;

        stream.play().map_err(|e| CaptureError::Stream(e.to_string()))?;
        tracing::debug!("Audio stream started");

        Ok(Box::new(CpalInput {
            stream: Some(stream),
            buffer,
            sample_rate,
        }))
    }
}

fn map_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceBusy,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            CaptureError::Config("stream configuration not supported".to_string())
        }
        other => CaptureError::Stream(other.to_string()),
    }
}

/// Appends interleaved frames to the buffer as mono by averaging channels.
fn append_mono(
    buffer: &Arc<Mutex<CaptureBuffer>>,
    data: impl Iterator<Item = i16>,
    channels: usize,
) {
    let Ok(mut buffer) = buffer.lock() else {
        return;
    };
    if buffer.paused {
        return;
    }

    if channels <= 1 {
        buffer.pending.extend(data);
        return;
    }

    let mut sum = 0i32;
    for (i, sample) in data.enumerate() {
        sum += sample as i32;
        if (i + 1) % channels == 0 {
            buffer.pending.push((sum / channels as i32) as i16);
            sum = 0;
        }
    }
}

/// A running cpal input stream.
struct CpalInput {
    /// Dropping the stream closes the device
    stream: Option<cpal::Stream>,
    buffer: Arc<Mutex<CaptureBuffer>>,
    sample_rate: u32,
}

impl InputStream for CpalInput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self) -> Vec<i16> {
        match self.buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut buffer.pending),
            Err(_) => Vec::new(),
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.paused = paused;
        }
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped, microphone released");
        }
    }
}

/// Finds an audio input device by numeric index or exact name.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    let devices = named_input_devices(host)
        .map_err(|e| CaptureError::Config(format!("Failed to enumerate devices: {e}")))?;
    select_device(devices, device_spec)
        .ok_or_else(|| CaptureError::DeviceNotFound(device_spec.to_string()))
}

/// Input devices whose name can be read, in host order.
///
/// Indices shown by `list-devices` refer to positions in this list.
pub(crate) fn named_input_devices(
    host: &cpal::Host,
) -> Result<Vec<(String, cpal::Device)>, cpal::DevicesError> {
    Ok(host
        .input_devices()?
        .filter_map(|d| d.name().ok().map(|name| (name, d)))
        .collect())
}

/// Picks a device by index into `devices` or by exact name.
fn select_device<T>(devices: Vec<(String, T)>, device_spec: &str) -> Option<T> {
    let mut devices = devices.into_iter();
    match device_spec.parse::<usize>() {
        Ok(index) => devices.nth(index).map(|(_, d)| d),
        Err(_) => devices.find(|(name, _)| name == device_spec).map(|(_, d)| d),
    }
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let Ok(dev_null) = OpenOptions::new().write(true).open("/dev/null") else {
        return f();
    };

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }
    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// ALSA only exists on Linux.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    f()
}
