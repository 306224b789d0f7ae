//! List available audio input devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::recording::audio::{named_input_devices, suppress_alsa_warnings};

/// Prints every input device with its index, default marker and native format.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = named_input_devices(&host)
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?;
        Ok::<_, anyhow::Error>((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!();

    for (index, (name, device)) in devices.iter().enumerate() {
        let marker = if default_name.as_deref() == Some(name.as_str()) {
            " [DEFAULT]"
        } else {
            ""
        };
        let format = match device.default_input_config() {
            Ok(config) => format!(
                "{}Hz, {} channels, {:?}",
                config.sample_rate().0,
                config.channels(),
                config.sample_format()
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  {index}: {name}{marker}");
        println!("     {format}");
    }

    println!();
    println!("Select one with `tunecap --device <ID or name>` or `device = \"...\"` in tunecap.toml.");
    Ok(())
}
