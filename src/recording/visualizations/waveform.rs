//! Time-domain waveform visualization.
//!
//! Draws the analysis tap's byte buffer as a single polyline across a fixed
//! 300×100 drawing surface. Samples are drawn raw, without smoothing.

/// Logical width of the waveform surface.
pub const CANVAS_WIDTH: f64 = 300.0;
/// Logical height of the waveform surface.
pub const CANVAS_HEIGHT: f64 = 100.0;
/// Stroke width of the waveform line.
pub const LINE_WIDTH: f64 = 2.0;

/// A 2D drawing target with a top-left origin.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], line_width: f64);
}

/// Maps byte amplitudes to polyline points on a `width`×`height` surface.
///
/// Point `i` sits at `x = i * width / len`, `y = (sample / 128) * height / 2`;
/// a final point closes the line at the right edge, vertically centred.
pub fn waveform_points(samples: &[u8], width: f64, height: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(samples.len() + 1);
    if !samples.is_empty() {
        let slice_width = width / samples.len() as f64;
        points.extend(samples.iter().enumerate().map(|(i, &sample)| {
            let v = sample as f64 / 128.0;
            (i as f64 * slice_width, v * height / 2.0)
        }));
    }
    points.push((width, height / 2.0));
    points
}

/// Clears `surface` and strokes the waveform for `samples`.
pub fn draw_waveform(surface: &mut dyn Surface, samples: &[u8]) {
    let points = waveform_points(samples, surface.width(), surface.height());
    surface.clear();
    surface.stroke_polyline(&points, LINE_WIDTH);
}
