//! Configuration file management for tunecap.
//!
//! Settings live in `~/.config/tunecap/tunecap.toml`. Every field is optional;
//! a missing file yields the built-in defaults. Values from the file are merged
//! over the defaults, and command-line flags are merged over the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Default maximum clip length in seconds.
pub const DEFAULT_MAX_DURATION: u32 = 10;
/// Default requested capture rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default minimum useful clip length in seconds.
pub const DEFAULT_MIN_DURATION: u32 = 3;

/// Rejected recorder settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_duration must be at least 1 second")]
    ZeroMaxDuration,
    #[error("min_duration ({min}s) exceeds max_duration ({max}s)")]
    MinExceedsMax { min: u32, max: u32 },
    #[error("invalid output format: {0}")]
    InvalidFormat(String),
}

/// Encoding of the finished clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipFormat {
    /// 16-bit PCM WAV assembled in memory
    Wav,
    /// Transcoded by ffmpeg: codec name plus extra ffmpeg options
    Ffmpeg { codec: String, args: Vec<String> },
}

impl ClipFormat {
    /// Parses `"wav"` or `"codec [ffmpeg options]"`, e.g. `"mp3 -ab 16k"`.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut parts = spec.split_whitespace();
        let codec = parts
            .next()
            .ok_or_else(|| ConfigError::InvalidFormat("empty".to_string()))?;
        let args: Vec<String> = parts.map(str::to_string).collect();

        let codec = match codec {
            "wav" | "pcm_s16le" if args.is_empty() => return Ok(Self::Wav),
            // ffmpeg names the WAV encoder after its sample format
            "wav" => "pcm_s16le",
            other => other,
        };

        Ok(Self::Ffmpeg {
            codec: codec.to_string(),
            args,
        })
    }

    /// File extension for clips in this format.
    pub fn extension(&self) -> &str {
        match self {
            Self::Wav => "wav",
            Self::Ffmpeg { codec, .. } => match codec.as_str() {
                "libopus" | "libvorbis" => "ogg",
                "aac" => "m4a",
                "pcm_s16le" => "wav",
                "libmp3lame" => "mp3",
                other => other,
            },
        }
    }

    /// MIME tag that matches the bytes this format produces.
    pub fn mime_type(&self) -> &'static str {
        match self.extension() {
            "wav" => "audio/wav",
            "mp3" => "audio/mpeg",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "m4a" => "audio/mp4",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ClipFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wav => write!(f, "wav"),
            Self::Ffmpeg { codec, args } if args.is_empty() => write!(f, "{codec}"),
            Self::Ffmpeg { codec, args } => write!(f, "{} {}", codec, args.join(" ")),
        }
    }
}

/// Effective settings for one recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Recording stops automatically at this many seconds
    pub max_duration: u32,
    /// Requested capture rate; the device may record at its own rate
    pub sample_rate: u32,
    /// Shorter clips are still delivered but flagged
    pub min_duration: u32,
    /// Encoding of the finished clip
    pub format: ClipFormat,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            sample_rate: DEFAULT_SAMPLE_RATE,
            min_duration: DEFAULT_MIN_DURATION,
            format: ClipFormat::Wav,
        }
    }
}

impl RecorderConfig {
    /// Merges caller overrides over these settings.
    ///
    /// Durations are not checked here; a later layer may still fix them up.
    pub fn with_overrides(&self, overrides: &RecorderOverrides) -> Result<Self, ConfigError> {
        let format = match overrides.format.as_deref() {
            Some(spec) => ClipFormat::parse(spec)?,
            None => self.format.clone(),
        };

        Ok(Self {
            max_duration: overrides.max_duration.unwrap_or(self.max_duration),
            sample_rate: overrides.sample_rate.unwrap_or(self.sample_rate),
            min_duration: overrides.min_duration.unwrap_or(self.min_duration),
            format,
        })
    }

    /// Rejects a zero `max_duration` and a `min_duration` above it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_duration == 0 {
            return Err(ConfigError::ZeroMaxDuration);
        }
        if self.min_duration > self.max_duration {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        Ok(())
    }
}

/// Optional recorder settings, as found in the `[recorder]` table or on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecorderOverrides {
    pub max_duration: Option<u32>,
    pub sample_rate: Option<u32>,
    pub min_duration: Option<u32>,
    /// "wav" or "codec [ffmpeg options]"
    pub format: Option<String>,
}

/// Audio device selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `tunecap list-devices`
    /// - device name from `tunecap list-devices`
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_device() -> String {
    "default".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

/// Complete contents of `tunecap.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunecapConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recorder: RecorderOverrides,
}

impl TunecapConfig {
    /// Loads the config file, falling back to defaults when it does not exist.
    ///
    /// # Errors
    /// - If the home directory cannot be determined
    /// - If the file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Configuration loaded from {}", config_path.display());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolves recorder settings: defaults, then this file, then `cli` overrides.
    pub fn recorder_config(&self, cli: &RecorderOverrides) -> Result<RecorderConfig, ConfigError> {
        let config = RecorderConfig::default()
            .with_overrides(&self.recorder)?
            .with_overrides(cli)?;
        config.validate()?;
        Ok(config)
    }
}

/// Location of `tunecap.toml`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("tunecap").join("tunecap.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecorderConfig::default();
        assert_eq!(config.max_duration, 10);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.min_duration, 3);
        assert_eq!(config.format, ClipFormat::Wav);
    }

    #[test]
    fn test_overrides_merge_over_defaults() {
        let overrides = RecorderOverrides {
            max_duration: Some(20),
            ..Default::default()
        };
        let config = RecorderConfig::default().with_overrides(&overrides).unwrap();
        assert_eq!(config.max_duration, 20);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.min_duration, 3);
    }

    #[test]
    fn test_cli_overrides_win_over_file() {
        let file = TunecapConfig::from_toml(
            "[recorder]\nmax_duration = 15\nmin_duration = 5\n",
        )
        .unwrap();
        let cli = RecorderOverrides {
            min_duration: Some(2),
            ..Default::default()
        };
        let config = file.recorder_config(&cli).unwrap();
        assert_eq!(config.max_duration, 15);
        assert_eq!(config.min_duration, 2);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = TunecapConfig::from_toml("").unwrap();
        assert_eq!(file.audio.device, "default");
        let config = file.recorder_config(&RecorderOverrides::default()).unwrap();
        assert_eq!(config, RecorderConfig::default());
    }

    #[test]
    fn test_invalid_durations_rejected() {
        let file = TunecapConfig::default();
        let zero = RecorderOverrides {
            max_duration: Some(0),
            ..Default::default()
        };
        assert_eq!(
            file.recorder_config(&zero),
            Err(ConfigError::ZeroMaxDuration)
        );

        let inverted = RecorderOverrides {
            max_duration: Some(4),
            min_duration: Some(5),
            ..Default::default()
        };
        assert_eq!(
            file.recorder_config(&inverted),
            Err(ConfigError::MinExceedsMax { min: 5, max: 4 })
        );

        // Default min of 3 against a file max of 2 is still invalid
        let short_file = TunecapConfig::from_toml("[recorder]\nmax_duration = 2\n").unwrap();
        assert_eq!(
            short_file.recorder_config(&RecorderOverrides::default()),
            Err(ConfigError::MinExceedsMax { min: 3, max: 2 })
        );
    }

    #[test]
    fn test_only_final_merge_is_validated() {
        let file = TunecapConfig::from_toml("[recorder]\nmax_duration = 2\n").unwrap();

        let lower_min = RecorderOverrides {
            min_duration: Some(1),
            ..Default::default()
        };
        let config = file.recorder_config(&lower_min).unwrap();
        assert_eq!((config.max_duration, config.min_duration), (2, 1));

        let raise_max = RecorderOverrides {
            max_duration: Some(20),
            ..Default::default()
        };
        let config = file.recorder_config(&raise_max).unwrap();
        assert_eq!((config.max_duration, config.min_duration), (20, 3));
    }

    #[test]
    fn test_clip_format_parse() {
        assert_eq!(ClipFormat::parse("wav").unwrap(), ClipFormat::Wav);
        assert!(ClipFormat::parse("   ").is_err());

        let mp3 = ClipFormat::parse("mp3 -ab 16k").unwrap();
        assert_eq!(
            mp3,
            ClipFormat::Ffmpeg {
                codec: "mp3".to_string(),
                args: vec!["-ab".to_string(), "16k".to_string()],
            }
        );
        assert_eq!(mp3.extension(), "mp3");
        assert_eq!(mp3.mime_type(), "audio/mpeg");
        assert_eq!(mp3.to_string(), "mp3 -ab 16k");

        let resampled = ClipFormat::parse("wav -ar 8000").unwrap();
        assert_eq!(
            resampled,
            ClipFormat::Ffmpeg {
                codec: "pcm_s16le".to_string(),
                args: vec!["-ar".to_string(), "8000".to_string()],
            }
        );
        assert_eq!(resampled.extension(), "wav");
        assert_eq!(resampled.mime_type(), "audio/wav");

        let opus = ClipFormat::parse("libopus").unwrap();
        assert_eq!(opus.extension(), "ogg");
        assert_eq!(opus.mime_type(), "audio/ogg");
    }
}
