//! ffmpeg binary discovery for non-WAV clip formats.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Well-known install locations, checked before falling back to a PATH search.
fn candidate_paths() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };
    paths.iter().map(PathBuf::from).collect()
}

/// Locates the ffmpeg binary.
///
/// # Errors
/// - If ffmpeg is neither in a well-known location nor on PATH
pub fn find_ffmpeg() -> Result<PathBuf> {
    if let Some(path) = candidate_paths().into_iter().find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };
    let output = std::process::Command::new(search_cmd)
        .arg("ffmpeg")
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for ffmpeg: {e}"))?;

    let found = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| PathBuf::from(line.trim()))
        .filter(|path| output.status.success() && !path.as_os_str().is_empty());

    found.ok_or_else(|| {
        anyhow!(
            "ffmpeg not found, but the configured clip format needs it. \
             Install ffmpeg or set `format = \"wav\"` in tunecap.toml"
        )
    })
}
