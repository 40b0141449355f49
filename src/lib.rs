// SPDX-License-Identifier: GPL-3.0-only

//! Hauler Vision - remote camera viewer for forestry machine operators
//!
//! Streams MJPEG over RTSP from Axis network cameras, shows the selected
//! camera and lets the operator switch cameras and digitally pan, tilt, zoom
//! and brighten the picture from a numeric keypad.
//!
//! # Architecture
//!
//! - [`controller`]: camera selection and per-camera view state
//! - [`session`]: the single live GStreamer pipeline and its state machine
//! - [`keymap`]: keypad and keyboard command surface
//! - [`terminal`]: event loop and status line
//! - [`config`]: configuration file and defaults

pub mod config;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod keymap;
pub mod session;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use controller::{CameraController, ControllerOptions};
pub use errors::{AppError, SessionError};
pub use session::{CropWindow, PipelineSession, PipelineVariant, PlaybackState, RenderTarget};
