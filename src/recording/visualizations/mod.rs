//! Visualization modules for recording display.

pub mod waveform;

pub use waveform::{draw_waveform, waveform_points, Surface, CANVAS_HEIGHT, CANVAS_WIDTH};
