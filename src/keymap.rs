// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard command surface
//!
//! Built for a numeric keypad with num lock either on or off; the main
//! keyboard aliases cover setups without one. Keys arrive as crossterm events
//! from the terminal or as keysym names from the video window.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    NextCamera,
    ToggleFullscreen,
    ZoomIn,
    ZoomOut,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Brighten,
    Darken,
    Restart,
    Help,
}

impl Command {
    /// Map a key press to a command
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Command::Quit),
                _ => None,
            };
        }

        let command = match key.code {
            KeyCode::Backspace | KeyCode::Char('q') => Command::Quit,
            KeyCode::KeypadBegin | KeyCode::Char('5') | KeyCode::Char('p') => Command::TogglePause,
            KeyCode::Enter | KeyCode::Char(' ') => Command::NextCamera,
            KeyCode::Delete | KeyCode::Char('.') | KeyCode::Char('f') => {
                Command::ToggleFullscreen
            }
            KeyCode::Char('+') | KeyCode::Char('=') => Command::ZoomIn,
            KeyCode::Char('-') => Command::ZoomOut,
            KeyCode::Up | KeyCode::Char('8') => Command::PanUp,
            KeyCode::Down | KeyCode::Char('2') => Command::PanDown,
            KeyCode::Left | KeyCode::Char('4') => Command::PanLeft,
            KeyCode::Right | KeyCode::Char('6') => Command::PanRight,
            KeyCode::Char('/') | KeyCode::Char('l') => Command::Brighten,
            KeyCode::Char('*') | KeyCode::Char('d') => Command::Darken,
            KeyCode::Char('r') => Command::Restart,
            KeyCode::Char('h') => Command::Help,
            _ => return None,
        };
        Some(command)
    }

    /// Map a key name from a video window navigation event
    ///
    /// Names are X keysym names as GStreamer sinks report them, e.g. `KP_Add`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        let command = match name {
            "BackSpace" | "q" => Command::Quit,
            "KP_5" | "KP_Begin" | "5" | "p" => Command::TogglePause,
            "KP_Enter" | "Return" | "space" => Command::NextCamera,
            "KP_Decimal" | "KP_Delete" | "Delete" | "period" | "f" => Command::ToggleFullscreen,
            "KP_Add" | "plus" | "equal" => Command::ZoomIn,
            "KP_Subtract" | "minus" => Command::ZoomOut,
            "KP_Up" | "KP_8" | "Up" | "8" => Command::PanUp,
            "KP_Down" | "KP_2" | "Down" | "2" => Command::PanDown,
            "KP_Left" | "KP_4" | "Left" | "4" => Command::PanLeft,
            "KP_Right" | "KP_6" | "Right" | "6" => Command::PanRight,
            "KP_Divide" | "slash" | "l" => Command::Brighten,
            "KP_Multiply" | "asterisk" | "d" => Command::Darken,
            "r" => Command::Restart,
            "h" => Command::Help,
            _ => return None,
        };
        Some(command)
    }

    /// Short label for the help line
    pub fn label(&self) -> &'static str {
        match self {
            Command::Quit => "q quit",
            Command::TogglePause => "5/p pause",
            Command::NextCamera => "Enter next camera",
            Command::ToggleFullscreen => "./f fullscreen",
            Command::ZoomIn => "+ zoom in",
            Command::ZoomOut => "- zoom out",
            Command::PanUp => "8 up",
            Command::PanDown => "2 down",
            Command::PanLeft => "4 left",
            Command::PanRight => "6 right",
            Command::Brighten => "/ lighten",
            Command::Darken => "* darken",
            Command::Restart => "r restart",
            Command::Help => "h help",
        }
    }

    pub const ALL: [Command; 14] = [
        Command::NextCamera,
        Command::TogglePause,
        Command::ZoomIn,
        Command::ZoomOut,
        Command::PanUp,
        Command::PanDown,
        Command::PanLeft,
        Command::PanRight,
        Command::Brighten,
        Command::Darken,
        Command::ToggleFullscreen,
        Command::Restart,
        Command::Help,
        Command::Quit,
    ];
}
