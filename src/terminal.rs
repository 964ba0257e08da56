// SPDX-License-Identifier: GPL-3.0-only

//! Terminal overlay preview
//!
//! Runs a live session against a detection script and renders the overlay
//! draw calls into the terminal. One terminal cell stands for
//! `CELL_WIDTH` x `CELL_HEIGHT` viewport pixels.

use crate::app::expression_overlay::surface::{Color as OverlayColor, ScreenRect};
use crate::app::expression_overlay::{DrawCommand, RecordingSurface};
use crate::app::frame_processor::ScriptedDetector;
use crate::app::orchestrator::{FrameOrchestrator, SessionStatus, TickReport};
use crate::app::session::SessionRunner;
use crate::backends::camera::{CameraBackend, ReplayCamera};
use crate::config::Config;
use crate::errors::AppResult;
use crate::script::DetectionScript;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Viewport pixels per cell, horizontally (matches the recording surface glyph advance)
const CELL_WIDTH: f32 = RecordingSurface::DEFAULT_CHAR_WIDTH;

/// Viewport pixels per cell, vertically
const CELL_HEIGHT: f32 = 16.0;

/// Run the terminal preview
pub fn run(
    config: Config,
    script: Arc<DetectionScript>,
    looping: bool,
) -> AppResult<()> {
    // Detector tasks are spawned from the render loop
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, config, script, looping);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    script: Arc<DetectionScript>,
    looping: bool,
) -> AppResult<()> {
    let poll_interval = config.session.render_interval();

    let detector = match ScriptedDetector::load(Arc::clone(&script), config.detector) {
        Ok(detector) => detector,
        Err(err) => {
            error!(error = %err, "Failed to load detector");
            let mut orchestrator = FrameOrchestrator::new(config);
            orchestrator.fail_model(&err);
            return show_status_until_quit(terminal, orchestrator.status(), poll_interval);
        }
    };

    let mut runner = SessionRunner::new(config, Arc::new(detector));
    let mut camera = ReplayCamera::new(script, looping);
    if runner.start(&mut camera).is_err() {
        return show_status_until_quit(terminal, runner.orchestrator().status(), poll_interval);
    }

    let mut surface = RecordingSurface::new(0.0, 0.0);
    let mut last_report: Option<TickReport> = None;
    let mut show_help = false;

    loop {
        let size = terminal.size()?;
        surface.resize(
            size.width as f32 * CELL_WIDTH,
            size.height.saturating_sub(1) as f32 * CELL_HEIGHT,
        );

        if let Some(report) = runner
            .tick(Instant::now(), &mut camera, &mut surface)
            .into_iter()
            .last()
        {
            last_report = Some(report);
        }

        let message = if show_help {
            build_help_message()
        } else {
            build_status_message(
                runner.orchestrator().status(),
                last_report.as_ref(),
                camera.is_exhausted(),
            )
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let overlay_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(
                OverlayView {
                    commands: surface.commands(),
                },
                overlay_area,
            );

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: &message }, status_area);
        })?;

        // Handle input with timeout for frame pacing
        if event::poll(poll_interval)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            // 'r' restarts the session from the top of the script
            if key.code == KeyCode::Char('r') {
                show_help = false;
                runner.stop(&mut camera);
                last_report = None;
                if runner.start(&mut camera).is_ok() {
                    info!("Session restarted");
                }
            }

            // 'h' to toggle help
            if key.code == KeyCode::Char('h') {
                show_help = !show_help;
            }

            // 'q' also quits
            if key.code == KeyCode::Char('q') {
                break;
            }
        }
    }

    runner.stop(&mut camera);
    Ok(())
}

/// Keep showing a terminal status (camera or model failure) until quit
fn show_status_until_quit(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    status: &SessionStatus,
    poll_interval: std::time::Duration,
) -> AppResult<()> {
    let message = format!("{} | 'q' quit", status);
    loop {
        terminal.draw(|f| {
            let area = f.area();
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: &message }, status_area);
        })?;

        if event::poll(poll_interval)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && (key.code == KeyCode::Char('q')
                || (key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)))
        {
            return Ok(());
        }
    }
}

fn build_status_message(
    status: &SessionStatus,
    report: Option<&TickReport>,
    exhausted: bool,
) -> String {
    let mut msg = status.to_string();
    if let Some(report) = report {
        msg.push_str(&format!(
            " | {} face(s) | {}",
            report.faces.len(),
            report.phase.as_str()
        ));
    }
    if exhausted {
        msg.push_str(" | script finished");
    }
    msg.push_str(" | 'r' restart | 'h' help | 'q' quit");
    msg
}

fn build_help_message() -> String {
    String::from("r: Restart session | h: Toggle help | q/Ctrl+C: Quit")
}

fn to_terminal_color(color: OverlayColor) -> Color {
    let (r, g, b) = color.to_rgb8();
    Color::Rgb(r, g, b)
}

/// Cell range covered by a viewport rectangle, clipped to `area`
fn cell_span(area: Rect, rect: &ScreenRect) -> Option<(u16, u16, u16, u16)> {
    let left = (rect.x / CELL_WIDTH).floor().max(0.0) as u16;
    let top = (rect.y / CELL_HEIGHT).floor().max(0.0) as u16;
    let right = ((rect.right() / CELL_WIDTH).ceil().max(0.0) as u16).min(area.width);
    let bottom = ((rect.bottom() / CELL_HEIGHT).ceil().max(0.0) as u16).min(area.height);

    if left >= right || top >= bottom {
        return None;
    }
    Some((area.x + left, area.y + top, area.x + right - 1, area.y + bottom - 1))
}

/// Widget that replays recorded overlay draw calls as cells
struct OverlayView<'a> {
    commands: &'a [DrawCommand],
}

impl Widget for OverlayView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for command in self.commands {
            match command {
                DrawCommand::Clear => {}
                DrawCommand::FillRect { rect, color } => {
                    let Some((x0, y0, x1, y1)) = cell_span(area, rect) else {
                        continue;
                    };
                    let bg = to_terminal_color(*color);
                    for y in y0..=y1 {
                        for x in x0..=x1 {
                            if let Some(cell) = buf.cell_mut((x, y)) {
                                cell.set_char(' ');
                                cell.set_bg(bg);
                            }
                        }
                    }
                }
                DrawCommand::StrokeRect { rect, color, .. } => {
                    let Some((x0, y0, x1, y1)) = cell_span(area, rect) else {
                        continue;
                    };
                    let fg = to_terminal_color(*color);
                    for y in y0..=y1 {
                        for x in x0..=x1 {
                            let symbol = match (x == x0, x == x1, y == y0, y == y1) {
                                (true, _, true, _) => '┌',
                                (_, true, true, _) => '┐',
                                (true, _, _, true) => '└',
                                (_, true, _, true) => '┘',
                                (_, _, true, _) | (_, _, _, true) => '─',
                                (true, _, _, _) | (_, true, _, _) => '│',
                                _ => continue,
                            };
                            if let Some(cell) = buf.cell_mut((x, y)) {
                                cell.set_char(symbol);
                                cell.set_fg(fg);
                            }
                        }
                    }
                }
                DrawCommand::Text { text, x, y, color } => {
                    let cx = (x / CELL_WIDTH).round().max(0.0) as u16;
                    let cy = (y / CELL_HEIGHT).round().max(0.0) as u16;
                    if cx >= area.width || cy >= area.height {
                        continue;
                    }
                    let visible: String =
                        text.chars().take((area.width - cx) as usize).collect();
                    buf.set_string(
                        area.x + cx,
                        area.y + cy,
                        visible,
                        Style::default().fg(to_terminal_color(*color)),
                    );
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
