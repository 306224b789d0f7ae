//! Terminal user interface for the recorder.
//!
//! Draws the live waveform canvas, the `MM:SS / MM:SS` timer, state-dependent
//! key hints and the short-recording warning, and translates key presses into
//! [`RecorderCommand`]s.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Paragraph,
    },
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use super::recorder::{Recorder, RecordingState};
use super::visualizations::{Surface, CANVAS_HEIGHT, CANVAS_WIDTH};

/// How long to wait for a key press per loop iteration (~30 frames per second).
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(33);

const WAVEFORM_COLOR: Color = Color::Rgb(76, 175, 80);
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input while the recorder screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    /// No key pressed
    Continue,
    /// Begin recording ('r')
    Start,
    /// Pause or resume (Space)
    TogglePause,
    /// Finish the recording ('s')
    Stop,
    /// Discard the clip and record again ('n')
    Reset,
    /// Hand over the finished clip (Enter)
    Accept,
    /// Leave the recorder (Escape, 'q', Ctrl+C)
    Quit,
}

/// Maps a key press to a recorder command.
pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> RecorderCommand {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => RecorderCommand::Quit,
        KeyCode::Char('r') => RecorderCommand::Start,
        KeyCode::Char(' ') => RecorderCommand::TogglePause,
        KeyCode::Char('s') => RecorderCommand::Stop,
        KeyCode::Char('n') => RecorderCommand::Reset,
        KeyCode::Enter => RecorderCommand::Accept,
        KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
        _ => RecorderCommand::Continue,
    }
}

/// Formats whole seconds as `MM:SS`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Key hints shown for each state.
fn key_hints(state: RecordingState) -> &'static str {
    match state {
        RecordingState::Inactive => "r start  q quit",
        RecordingState::Recording => "space pause  s stop  q quit",
        RecordingState::Paused => "space resume  s stop  q quit",
        RecordingState::Completed => "enter accept  n new recording  q quit",
    }
}

/// Waveform drawing target backed by a braille canvas.
///
/// Holds the most recent polyline in surface coordinates (origin top-left).
#[derive(Debug, Default)]
pub struct CanvasSurface {
    points: Vec<(f64, f64)>,
}

impl CanvasSurface {
    /// Canvas segments with the y axis flipped to ratatui's bottom-left origin.
    fn segments(&self) -> Vec<CanvasLine> {
        self.points
            .windows(2)
            .map(|pair| CanvasLine {
                x1: pair[0].0,
                y1: CANVAS_HEIGHT - pair[0].1,
                x2: pair[1].0,
                y2: CANVAS_HEIGHT - pair[1].1,
                color: WAVEFORM_COLOR,
            })
            .collect()
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        CANVAS_WIDTH
    }

    fn height(&self) -> f64 {
        CANVAS_HEIGHT
    }

    fn clear(&mut self) {
        self.points.clear();
    }

    // Terminal cells cannot express stroke width; braille dots are one cell-dot wide.
    fn stroke_polyline(&mut self, points: &[(f64, f64)], _line_width: f64) {
        self.points = points.to_vec();
    }
}

/// Full-screen recorder interface.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    surface: CanvasSurface,
    /// One-line message shown in the footer, e.g. a microphone error
    status: Option<String>,
    restored: bool,
}

impl RecorderTui {
    /// Creates the TUI and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            surface: CanvasSurface::default(),
            status: None,
            restored: false,
        })
    }

    pub fn surface_mut(&mut self) -> &mut CanvasSurface {
        &mut self.surface
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Draws one frame for the recorder's current state.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, recorder: &Recorder) -> anyhow::Result<()> {
        let state = recorder.state();
        let config = recorder.config();
        let timer_text = format!(
            "{} / {}",
            format_time(recorder.elapsed()),
            format_time(config.max_duration)
        );
        let warning = recorder.is_short().then(|| {
            format!(
                "Recording too short, record at least {} seconds",
                config.min_duration
            )
        });
        let clip_summary = recorder.result().map(|result| {
            format!(
                "Clip ready: {} ({} bytes, {})",
                result.url.url,
                result.clip.bytes.len(),
                result.clip.mime_type()
            )
        });
        let segments = self.surface.segments();
        let status = self.status.clone();

        self.terminal.draw(|frame| {
            let [header, body, warning_area, footer] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());

            let title = Line::from(vec![
                Span::styled("tunecap", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::raw(timer_text.as_str()),
            ]);
            frame.render_widget(Paragraph::new(title), header);

            match state {
                RecordingState::Recording | RecordingState::Paused => {
                    let canvas = Canvas::default()
                        .block(Block::bordered())
                        .marker(Marker::Braille)
                        .x_bounds([0.0, CANVAS_WIDTH])
                        .y_bounds([0.0, CANVAS_HEIGHT])
                        .paint(|ctx| {
                            for segment in &segments {
                                ctx.draw(segment);
                            }
                        });
                    frame.render_widget(canvas, body);
                }
                RecordingState::Completed => {
                    let text = clip_summary.as_deref().unwrap_or("Clip ready");
                    frame.render_widget(
                        Paragraph::new(text)
                            .block(Block::bordered())
                            .wrap(ratatui::widgets::Wrap { trim: true }),
                        body,
                    );
                }
                RecordingState::Inactive => {
                    frame.render_widget(
                        Paragraph::new("Press r to capture the music playing around you")
                            .alignment(Alignment::Center)
                            .block(Block::bordered()),
                        body,
                    );
                }
            }

            if let Some(warning) = &warning {
                frame.render_widget(
                    Paragraph::new(warning.as_str())
                        .style(Style::default().fg(Color::Black).bg(Color::Yellow)),
                    warning_area,
                );
            }

            let indicator = match state {
                RecordingState::Recording => {
                    Span::styled("● ", Style::default().fg(Color::Red))
                }
                RecordingState::Paused => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
                _ => Span::raw("  "),
            };
            let mut spans = vec![indicator, Span::raw(key_hints(state))];
            if let Some(status) = &status {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(status.as_str(), Style::default().fg(Color::Red)));
            }
            frame.render_widget(
                Paragraph::new(Line::from(spans))
                    .style(Style::default().fg(FOOTER_FG).bg(Color::Rgb(0, 0, 0))),
                footer,
            );
        })?;

        Ok(())
    }

    /// Waits briefly for a key press and returns the matching command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<RecorderCommand> {
        if event::poll(INPUT_POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(RecorderCommand::Continue);
                }
                let command = command_for_key(key.code, key.modifiers);
                if command != RecorderCommand::Continue {
                    tracing::debug!("Key {:?} -> {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(RecorderCommand::Continue)
    }

    /// Leaves alternate screen mode and restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(9), "00:09");
        assert_eq!(format_time(75), "01:15");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;
        assert_eq!(command_for_key(KeyCode::Char('r'), none), RecorderCommand::Start);
        assert_eq!(command_for_key(KeyCode::Char(' '), none), RecorderCommand::TogglePause);
        assert_eq!(command_for_key(KeyCode::Char('s'), none), RecorderCommand::Stop);
        assert_eq!(command_for_key(KeyCode::Char('n'), none), RecorderCommand::Reset);
        assert_eq!(command_for_key(KeyCode::Enter, none), RecorderCommand::Accept);
        assert_eq!(command_for_key(KeyCode::Esc, none), RecorderCommand::Quit);
        assert_eq!(
            command_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            RecorderCommand::Quit
        );
        assert_eq!(command_for_key(KeyCode::Char('x'), none), RecorderCommand::Continue);
    }

    #[test]
    fn test_key_hints_follow_state() {
        assert!(key_hints(RecordingState::Inactive).contains("start"));
        assert!(key_hints(RecordingState::Recording).contains("pause"));
        assert!(key_hints(RecordingState::Paused).contains("resume"));
        assert!(key_hints(RecordingState::Completed).contains("new recording"));
    }

    #[test]
    fn test_canvas_surface_flips_y() {
        let mut surface = CanvasSurface::default();
        surface.stroke_polyline(&[(0.0, 0.0), (150.0, 50.0), (300.0, 100.0)], 2.0);
        let segments = surface.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].x1, segments[0].y1), (0.0, 100.0));
        assert_eq!((segments[1].x2, segments[1].y2), (300.0, 0.0));

        surface.clear();
        assert!(surface.segments().is_empty());
    }
}
