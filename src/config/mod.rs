//! Configuration management for tunecap.
//!
//! Loads optional settings from a TOML file and merges them with built-in
//! defaults and command-line overrides.

pub mod file;

pub use file::{ClipFormat, RecorderConfig, RecorderOverrides, TunecapConfig};
