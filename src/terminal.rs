// SPDX-License-Identifier: GPL-3.0-only

//! Terminal console for the viewer
//!
//! Video is drawn by the pipeline's sink window; the terminal shows a status
//! line. Commands come from the terminal keypad and from key presses in the
//! video window. The loop is the only thread that drives the controller.

use crate::config::Config;
use crate::constants::timing;
use crate::controller::CameraController;
use crate::errors::SessionError;
use crate::keymap::Command;
use crate::session::{GstSession, PipelineSession, PlaybackState};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info, warn};

/// Run the viewer until the operator quits
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = GstSession::new(config.session_settings());
    let mut controller =
        CameraController::new(config.cameras.clone(), session, config.controller_options())?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut controller);

    if let Err(e) = controller.shutdown() {
        warn!(error = %e, "Pipeline did not shut down cleanly");
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<S: PipelineSession>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut CameraController<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut status = Status::default();
    if let Err(e) = controller.start() {
        error!(error = %e, "Failed to start camera");
        status.fault = Some(e);
    }

    loop {
        if status.fault.is_none()
            && let Err(e) = controller.poll()
        {
            error!(error = %e, "Session failed");
            status.fault = Some(e);
        }

        let line = status.line(controller);
        terminal.draw(|f| {
            let area = f.area();
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: area.height.min(1),
            };
            f.render_widget(StatusBar { message: &line }, status_area);
        })?;

        let mut commands = controller.take_window_commands();
        if event::poll(Duration::from_millis(timing::INPUT_POLL_MS))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(command) = Command::from_key(&key)
        {
            commands.push(command);
        }

        for command in commands {
            if command == Command::Quit {
                info!("Quit requested");
                return Ok(());
            }
            handle(controller, command, &mut status);
        }
    }
}

/// Dispatch a command and record its failure on the status line
fn handle<S: PipelineSession>(
    controller: &mut CameraController<S>,
    command: Command,
    status: &mut Status,
) {
    if let Err(e) = dispatch(controller, command, status) {
        warn!(?command, error = %e, "Command failed");
        if e.is_fatal() || controller.playback_state() == PlaybackState::Idle {
            status.fault = Some(e);
        } else {
            status.notice = Some(e.to_string());
        }
    }
}

/// Run one operator command against the controller
fn dispatch<S: PipelineSession>(
    controller: &mut CameraController<S>,
    command: Command,
    status: &mut Status,
) -> Result<(), SessionError> {
    status.notice = None;
    match command {
        Command::NextCamera => {
            status.fault = None;
            controller.select_next_camera()?;
        }
        Command::Restart => {
            status.fault = None;
            controller.restart()?;
        }
        Command::TogglePause => controller.toggle_pause()?,
        Command::ToggleFullscreen => {
            controller.toggle_fullscreen();
        }
        Command::ZoomIn => {
            controller.zoom_in()?;
        }
        Command::ZoomOut => {
            controller.zoom_out()?;
        }
        Command::PanUp => {
            controller.pan_up()?;
        }
        Command::PanDown => {
            controller.pan_down()?;
        }
        Command::PanLeft => {
            controller.pan_left()?;
        }
        Command::PanRight => {
            controller.pan_right()?;
        }
        Command::Brighten => {
            controller.brighten()?;
        }
        Command::Darken => {
            controller.darken()?;
        }
        Command::Help => status.show_help = !status.show_help,
        Command::Quit => {}
    }
    Ok(())
}

/// What the status line shows besides the camera state
#[derive(Default)]
struct Status {
    show_help: bool,
    /// Session needs an explicit restart
    fault: Option<SessionError>,
    /// Last non-fatal command error
    notice: Option<String>,
}

impl Status {
    fn line<S: PipelineSession>(&self, controller: &CameraController<S>) -> String {
        if self.show_help {
            return Command::ALL
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(" | ");
        }
        if let Some(fault) = &self.fault {
            return format!("{} | 'r' restart | Enter next camera | 'q' quit", fault);
        }

        let camera = controller.current_camera();
        let screen = match (controller.is_fullscreen(), controller.fullscreen_supported()) {
            (true, true) => "fullscreen",
            (true, false) => "fullscreen unsupported by sink",
            (false, _) => "windowed",
        };
        let mut line = format!(
            "[{}/{}] {} | {} | {} | {} | crop {} | brightness {:+.2}",
            controller.current_index() + 1,
            controller.cameras().len(),
            camera.address(),
            controller.options().variant,
            controller.playback_state(),
            screen,
            camera.view.crop(),
            controller.brightness(),
        );
        if let Some(notice) = &self.notice {
            line.push_str(" | ");
            line.push_str(notice);
        }
        line.push_str(" | 'h' help");
        line
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
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
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
