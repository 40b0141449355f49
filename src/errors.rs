// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the viewer

use crate::session::PlaybackState;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for pipeline session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Pipeline session errors
    Session(SessionError),
    /// Configuration errors
    Config(String),
    /// Terminal setup or drawing errors
    Terminal(String),
    /// Generic error with message
    Other(String),
}

/// Pipeline session errors
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// GStreamer could not be initialised or the graph could not be assembled
    InitializationFailed(String),
    /// A required element factory is not installed
    ElementMissing(String),
    /// Operation is not valid in the current playback state
    InvalidTransition {
        operation: &'static str,
        state: PlaybackState,
    },
    /// GStreamer refused a state change
    StateChange(String),
    /// The dynamic source pad could not be linked; the session must be restarted
    LinkFailed(String),
    /// The pipeline posted an error on its bus; the session must be restarted
    Pipeline(String),
}

impl SessionError {
    /// Whether the session is unusable until an explicit restart
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::LinkFailed(_) | SessionError::Pipeline(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InitializationFailed(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
            SessionError::ElementMissing(name) => write!(f, "Element not available: {}", name),
            SessionError::InvalidTransition { operation, state } => {
                write!(f, "Cannot {} while {}", operation, state)
            }
            SessionError::StateChange(msg) => write!(f, "State change failed: {}", msg),
            SessionError::LinkFailed(msg) => write!(f, "Source pad link failed: {}", msg),
            SessionError::Pipeline(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SessionError {}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Terminal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<gstreamer::glib::Error> for SessionError {
    fn from(err: gstreamer::glib::Error) -> Self {
        SessionError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for SessionError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        SessionError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::StateChangeError> for SessionError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        SessionError::StateChange(err.to_string())
    }
}
