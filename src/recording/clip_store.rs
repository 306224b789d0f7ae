//! Temporary playable locations for finished clips.
//!
//! A minted [`PlayableUrl`] stays valid until it is released through the store
//! that created it.

use anyhow::Result;
use std::path::PathBuf;

use super::encoder::EncodedClip;

/// A location from which a finished clip can be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableUrl {
    pub url: String,
    pub path: PathBuf,
}

/// Mints and releases playable locations for clips.
pub trait ClipStore {
    fn mint(&mut self, clip: &EncodedClip) -> Result<PlayableUrl>;

    /// Releasing an already released URL is harmless.
    fn release(&mut self, url: &PlayableUrl);
}

/// Stores clips as files in the system temp directory.
pub struct TempFileStore {
    dir: PathBuf,
    minted: u32,
}

impl TempFileStore {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self { dir, minted: 0 }
    }
}

impl Default for TempFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipStore for TempFileStore {
    fn mint(&mut self, clip: &EncodedClip) -> Result<PlayableUrl> {
        self.minted += 1;
        let path = self.dir.join(format!(
            "tunecap-{}-{}.{}",
            std::process::id(),
            self.minted,
            clip.format.extension()
        ));
        std::fs::write(&path, &clip.bytes)?;

        let url = format!("file://{}", path.display());
        tracing::debug!("Minted {} ({}, {} bytes)", url, clip.mime_type(), clip.bytes.len());
        Ok(PlayableUrl { url, path })
    }

    fn release(&mut self, url: &PlayableUrl) {
        if !url.path.exists() {
            return;
        }
        match std::fs::remove_file(&url.path) {
            Ok(()) => tracing::debug!("Released {}", url.url),
            Err(e) => tracing::warn!("Failed to release {}: {}", url.url, e),
        }
    }
}
