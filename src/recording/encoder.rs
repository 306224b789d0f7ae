//! Clip encoding.
//!
//! Captured chunks are buffered as they arrive and concatenated into a single
//! clip when the recording finishes. WAV is assembled in memory with hound;
//! any other format is transcoded from that WAV by ffmpeg.

use anyhow::{anyhow, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use super::ffmpeg::find_ffmpeg;
use crate::config::ClipFormat;

/// A finished recording in its final encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub format: ClipFormat,
    /// Rate the audio was actually captured at
    pub sample_rate: u32,
}

impl EncodedClip {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Buffers captured audio and produces a clip on demand.
pub trait Encoder {
    fn push(&mut self, samples: &[i16]);

    /// Concatenates everything pushed so far into one clip and clears the buffer.
    fn finalize(&mut self) -> Result<EncodedClip>;
}

/// Creates the encoder for `format` at the stream's actual sample rate.
pub fn encoder_for(format: &ClipFormat, sample_rate: u32) -> Box<dyn Encoder> {
    match format {
        ClipFormat::Wav => Box::new(WavEncoder::new(sample_rate)),
        ClipFormat::Ffmpeg { .. } => Box::new(FfmpegEncoder::new(format.clone(), sample_rate)),
    }
}

/// 16-bit mono PCM WAV encoder.
pub struct WavEncoder {
    sample_rate: u32,
    chunks: Vec<Vec<i16>>,
}

impl WavEncoder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            chunks: Vec::new(),
        }
    }

    fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl Encoder for WavEncoder {
    fn push(&mut self, samples: &[i16]) {
        self.chunks.push(samples.to_vec());
    }

    fn finalize(&mut self) -> Result<EncodedClip> {
        let sample_count = self.sample_count();
        let chunks = std::mem::take(&mut self.chunks);
        let bytes = wav_bytes(chunks.iter().flatten().copied(), self.sample_rate)?;

        tracing::debug!(
            "WAV clip finalized: {} samples at {}Hz, {} bytes",
            sample_count,
            self.sample_rate,
            bytes.len()
        );

        Ok(EncodedClip {
            bytes,
            format: ClipFormat::Wav,
            sample_rate: self.sample_rate,
        })
    }
}

/// Writes samples as an in-memory WAV file.
fn wav_bytes(samples: impl Iterator<Item = i16>, sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Transcodes the buffered audio with ffmpeg on finalize.
pub struct FfmpegEncoder {
    format: ClipFormat,
    wav: WavEncoder,
}

impl FfmpegEncoder {
    pub fn new(format: ClipFormat, sample_rate: u32) -> Self {
        Self {
            format,
            wav: WavEncoder::new(sample_rate),
        }
    }
}

impl Encoder for FfmpegEncoder {
    fn push(&mut self, samples: &[i16]) {
        self.wav.push(samples);
    }

    fn finalize(&mut self) -> Result<EncodedClip> {
        let wav = self.wav.finalize()?;

        let ClipFormat::Ffmpeg { codec, args } = &self.format else {
            return Ok(wav);
        };

        let stem = std::env::temp_dir().join(format!("tunecap_{}", std::process::id()));
        let input = stem.with_extension("wav");
        let output = stem.with_extension(format!("out.{}", self.format.extension()));

        std::fs::write(&input, &wav.bytes)?;
        let result = transcode(&input, &output, codec, args).and_then(|_| {
            std::fs::read(&output).map_err(|e| anyhow!("Failed to read encoded clip: {e}"))
        });

        for path in [&input, &output] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::debug!("Failed to remove temp file {}: {}", path.display(), e);
                }
            }
        }

        let bytes = result?;
        tracing::debug!("Clip transcoded to {} ({} bytes)", self.format, bytes.len());

        Ok(EncodedClip {
            bytes,
            format: self.format.clone(),
            sample_rate: wav.sample_rate,
        })
    }
}

/// Runs ffmpeg on `input`, forcing mono output.
fn transcode(input: &Path, output: &Path, codec: &str, args: &[String]) -> Result<()> {
    let ffmpeg_path = find_ffmpeg()?;

    let mut cmd = Command::new(&ffmpeg_path);
    cmd.arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-acodec")
        .arg(codec)
        .arg("-ac")
        .arg("1")
        .arg("-y")
        .args(args)
        .arg(output);

    let result = cmd.output()?;
    if result.status.success() {
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&result.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_concatenates_chunks() {
        let mut encoder = WavEncoder::new(22_050);
        encoder.push(&[1, 2, 3]);
        encoder.push(&[4, 5]);

        let clip = encoder.finalize().unwrap();
        assert_eq!(&clip.bytes[..4], b"RIFF");
        assert_eq!(clip.mime_type(), "audio/wav");
        assert_eq!(clip.sample_rate, 22_050);

        let reader = hound::WavReader::new(Cursor::new(clip.bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_finalize_clears_buffer() {
        let mut encoder = WavEncoder::new(8_000);
        encoder.push(&[7; 10]);
        encoder.finalize().unwrap();

        let clip = encoder.finalize().unwrap();
        let reader = hound::WavReader::new(Cursor::new(clip.bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn test_encoder_for_format() {
        let mut encoder = encoder_for(&ClipFormat::Wav, 16_000);
        encoder.push(&[0; 4]);
        assert_eq!(encoder.finalize().unwrap().format, ClipFormat::Wav);
    }
}
