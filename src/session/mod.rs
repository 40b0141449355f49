// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline session abstraction
//!
//! A session owns exactly one playable pipeline bound to one camera and one
//! render target. The controller talks to it only through [`PipelineSession`].
//!
//! ```text
//!  Idle --start--> Stopped --play--> Playing <--pause/play--> Paused
//!    ^                                                          |
//!    +------------------------ stop (any state) ----------------+
//! ```

pub mod pad;
pub mod pipeline;
pub mod recording;
pub mod variant;

pub use pad::{PadDecision, PadEvent, PadEventKind, PadSlot};
pub use pipeline::GstSession;
pub use variant::{PipelineVariant, Stage};

use crate::errors::{SessionError, SessionResult};
use crate::keymap::Command;
use std::fmt;

/// Crop rectangle as border offsets in source pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CropWindow {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl CropWindow {
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

impl fmt::Display for CropWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L{} R{} T{} B{}",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// Window the video sink draws into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderTarget {
    /// Native window handle (X11 XID or equivalent); `None` lets the sink open its own window
    pub window_handle: Option<usize>,
    pub fullscreen: bool,
}

/// Playback state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No pipeline exists
    #[default]
    Idle,
    /// Pipeline built, not yet playing
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };
        f.write_str(name)
    }
}

impl PlaybackState {
    /// State after `start`
    pub fn start(self) -> SessionResult<Self> {
        match self {
            PlaybackState::Idle => Ok(PlaybackState::Stopped),
            state => Err(SessionError::InvalidTransition {
                operation: "start",
                state,
            }),
        }
    }

    /// State after `play`
    pub fn play(self) -> SessionResult<Self> {
        match self {
            PlaybackState::Idle => Err(SessionError::InvalidTransition {
                operation: "play",
                state: self,
            }),
            _ => Ok(PlaybackState::Playing),
        }
    }

    /// State after `pause`
    pub fn pause(self) -> SessionResult<Self> {
        match self {
            PlaybackState::Idle => Err(SessionError::InvalidTransition {
                operation: "pause",
                state: self,
            }),
            _ => Ok(PlaybackState::Paused),
        }
    }

    /// Flip between Playing and Paused; Stopped is not a toggle target
    pub fn toggled(self) -> SessionResult<Self> {
        match self {
            PlaybackState::Playing => Ok(PlaybackState::Paused),
            PlaybackState::Paused => Ok(PlaybackState::Playing),
            state => Err(SessionError::InvalidTransition {
                operation: "toggle pause",
                state,
            }),
        }
    }

    /// `stop` is valid from every state
    pub fn stop(self) -> Self {
        PlaybackState::Idle
    }
}

/// One playable pipeline bound to one camera and one render target
///
/// Implementations must treat crop and brightness updates on a variant
/// lacking the stage as logged no-ops, and must require `stop` before
/// `start` can bind a different camera.
pub trait PipelineSession {
    /// Build the graph for `variant` bound to `address`; ends in `Stopped`
    fn start(
        &mut self,
        address: &str,
        target: RenderTarget,
        variant: PipelineVariant,
    ) -> SessionResult<()>;

    /// Tear the graph down; ends in `Idle`. Safe from any state.
    fn stop(&mut self) -> SessionResult<()>;

    fn play(&mut self) -> SessionResult<()>;

    fn pause(&mut self) -> SessionResult<()>;

    /// Flip between Playing and Paused
    fn toggle_pause(&mut self) -> SessionResult<()> {
        match self.state().toggled()? {
            PlaybackState::Playing => self.play(),
            _ => self.pause(),
        }
    }

    /// Push crop borders into the crop stage, if the variant has one
    fn set_crop(&mut self, crop: CropWindow) -> SessionResult<()>;

    /// Push a brightness level into the balance stage, if the variant has one
    fn set_brightness(&mut self, value: f64) -> SessionResult<()>;

    /// Rewrite only the source address of the live graph
    ///
    /// Best effort: the currently linked source pad is unlinked first and
    /// the topology is left untouched.
    fn rebind_address(&mut self, address: &str) -> SessionResult<()>;

    /// Forward the fullscreen flag to the render target
    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Whether the render target can honour the fullscreen flag
    fn fullscreen_supported(&self) -> bool {
        true
    }

    /// Commands typed into the video window since the last call
    fn take_commands(&mut self) -> Vec<Command> {
        Vec::new()
    }

    /// Process pending pad events and bus messages on the caller's thread
    fn pump(&mut self) -> SessionResult<()>;

    fn state(&self) -> PlaybackState;

    /// Variant of the live graph, `None` while idle
    fn variant(&self) -> Option<PipelineVariant>;
}
