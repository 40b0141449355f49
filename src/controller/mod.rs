// SPDX-License-Identifier: GPL-3.0-only

//! Camera controller
//!
//! Single source of truth for which camera is selected and what view
//! adjustment each camera carries. It is the only caller that configures the
//! pipeline session.

pub mod camera;

pub use camera::{Camera, CameraView, ViewLimits};

use crate::errors::{AppError, AppResult, SessionResult};
use crate::keymap::Command;
use crate::session::{PipelineSession, PipelineVariant, PlaybackState, RenderTarget};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How the session follows a camera switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchStrategy {
    /// Tear the graph down and build a new one for the next camera
    #[default]
    Rebuild,
    /// Rewrite only the source address of the live graph (experimental)
    Rebind,
}

/// Controller behaviour fixed at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOptions {
    pub variant: PipelineVariant,
    pub limits: ViewLimits,
    /// Push a camera's saved crop and brightness into the rebuilt pipeline
    pub restore_view_on_switch: bool,
    pub switch_strategy: SwitchStrategy,
    pub target: RenderTarget,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            variant: PipelineVariant::default(),
            limits: ViewLimits::default(),
            restore_view_on_switch: true,
            switch_strategy: SwitchStrategy::default(),
            target: RenderTarget {
                window_handle: None,
                fullscreen: true,
            },
        }
    }
}

/// Owns the cameras, the selection and the single pipeline session
pub struct CameraController<S: PipelineSession> {
    cameras: Vec<Camera>,
    current: usize,
    session: S,
    options: ControllerOptions,
}

impl<S: PipelineSession> CameraController<S> {
    /// Create a controller over `addresses`, in cycling order
    ///
    /// Duplicate addresses are dropped. The session is not started until
    /// [`CameraController::start`].
    pub fn new<I, A>(addresses: I, session: S, options: ControllerOptions) -> AppResult<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut cameras: Vec<Camera> = Vec::new();
        for address in addresses {
            let address = address.into();
            let address = address.trim();
            if address.is_empty() {
                continue;
            }
            if cameras.iter().any(|c| c.address() == address) {
                warn!(%address, "Duplicate camera address ignored");
                continue;
            }
            cameras.push(Camera::new(address));
        }
        if cameras.is_empty() {
            return Err(AppError::Config("no camera addresses configured".to_string()));
        }
        options.limits.validate().map_err(AppError::Config)?;

        info!(
            count = cameras.len(),
            variant = %options.variant,
            "Camera controller ready"
        );
        Ok(Self {
            cameras,
            current: 0,
            session,
            options,
        })
    }

    /// Build and play the session for the selected camera
    pub fn start(&mut self) -> SessionResult<()> {
        let address = self.current_camera().address().to_string();
        info!(%address, index = self.current, "Starting camera");
        self.session
            .start(&address, self.options.target, self.options.variant)?;
        self.push_saved_view(self.options.restore_view_on_switch)?;
        self.session.play()
    }

    /// Tear the session down and build it again for the same camera
    ///
    /// The camera's saved view is always re-applied; only a camera switch
    /// honours `restore_view_on_switch`.
    pub fn restart(&mut self) -> SessionResult<()> {
        let address = self.current_camera().address().to_string();
        info!(%address, index = self.current, "Restarting session");
        self.session.stop()?;
        self.session
            .start(&address, self.options.target, self.options.variant)?;
        self.push_saved_view(true)?;
        self.session.play()
    }

    /// Release the session
    pub fn shutdown(&mut self) -> SessionResult<()> {
        self.session.stop()
    }

    pub fn select_next_camera(&mut self) -> SessionResult<()> {
        self.current = (self.current + 1) % self.cameras.len();
        let address = self.current_camera().address().to_string();
        info!(%address, index = self.current, "Switching camera");

        match self.options.switch_strategy {
            SwitchStrategy::Rebuild => {
                self.session.stop()?;
                self.session
                    .start(&address, self.options.target, self.options.variant)?;
            }
            SwitchStrategy::Rebind => {
                self.session.pause()?;
                self.session.rebind_address(&address)?;
            }
        }
        self.push_saved_view(self.options.restore_view_on_switch)?;
        self.session.play()
    }

    pub fn zoom_in(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_crop("zoom in", |view| view.zoom_in(&limits))
    }

    /// Zoom out, re-centring first if a border is too thin to shrink
    ///
    /// Returns `true` when the crop changed, including when only the
    /// re-centring pans were applied.
    pub fn zoom_out(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        let mut recentred = false;
        if self.current_camera().view.crop().left < limits.zoom_step_horizontal {
            recentred |= self.pan_right()?;
        }
        if self.current_camera().view.crop().right < limits.zoom_step_horizontal {
            recentred |= self.pan_left()?;
        }
        if self.current_camera().view.crop().top < limits.zoom_step_vertical {
            recentred |= self.pan_down()?;
        }
        if self.current_camera().view.crop().bottom < limits.zoom_step_vertical {
            recentred |= self.pan_up()?;
        }
        let zoomed = self.adjust_crop("zoom out", |view| view.zoom_out(&limits))?;
        Ok(zoomed || recentred)
    }

    pub fn pan_up(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_crop("pan up", |view| view.pan_up(&limits))
    }

    pub fn pan_down(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_crop("pan down", |view| view.pan_down(&limits))
    }

    pub fn pan_left(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_crop("pan left", |view| view.pan_left(&limits))
    }

    pub fn pan_right(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_crop("pan right", |view| view.pan_right(&limits))
    }

    pub fn brighten(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_brightness("brighten", |view| view.brighten(&limits))
    }

    pub fn darken(&mut self) -> SessionResult<bool> {
        let limits = self.options.limits;
        self.adjust_brightness("darken", |view| view.darken(&limits))
    }

    pub fn toggle_pause(&mut self) -> SessionResult<()> {
        self.session.toggle_pause()
    }

    /// Flip the fullscreen flag; returns the new value
    pub fn toggle_fullscreen(&mut self) -> bool {
        let fullscreen = !self.options.target.fullscreen;
        self.options.target.fullscreen = fullscreen;
        self.session.set_fullscreen(fullscreen);
        debug!(fullscreen, "Fullscreen toggled");
        fullscreen
    }

    /// Process pending session events; fatal errors need [`CameraController::restart`]
    pub fn poll(&mut self) -> SessionResult<()> {
        self.session.pump()
    }

    /// Commands typed into the video window, in arrival order
    pub fn take_window_commands(&mut self) -> Vec<Command> {
        self.session.take_commands()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_camera(&self) -> &Camera {
        &self.cameras[self.current]
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Brightness of the selected camera
    pub fn brightness(&self) -> f64 {
        self.current_camera().view.brightness(&self.options.limits)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.options.target.fullscreen
    }

    /// Whether the session's sink can actually go fullscreen
    pub fn fullscreen_supported(&self) -> bool {
        self.session.fullscreen_supported()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.session.state()
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    fn adjust_crop(
        &mut self,
        operation: &str,
        adjust: impl FnOnce(&mut CameraView) -> bool,
    ) -> SessionResult<bool> {
        let view = &mut self.cameras[self.current].view;
        if !adjust(view) {
            debug!(operation, crop = %view.crop(), "Adjustment rejected at bound");
            return Ok(false);
        }
        let crop = view.crop();
        debug!(operation, %crop, "Crop adjusted");
        self.session.set_crop(crop)?;
        Ok(true)
    }

    fn adjust_brightness(
        &mut self,
        operation: &str,
        adjust: impl FnOnce(&mut CameraView) -> bool,
    ) -> SessionResult<bool> {
        if !adjust(&mut self.cameras[self.current].view) {
            debug!(operation, brightness = self.brightness(), "Adjustment rejected at bound");
            return Ok(false);
        }
        let value = self.brightness();
        debug!(operation, value, "Brightness adjusted");
        self.session.set_brightness(value)?;
        Ok(true)
    }

    /// Re-apply the selected camera's saved view to a freshly bound session
    fn push_saved_view(&mut self, restore: bool) -> SessionResult<()> {
        let view = self.current_camera().view;
        if !restore || view.is_default() {
            return Ok(());
        }
        debug!(crop = %view.crop(), "Restoring saved view");
        self.session.set_crop(view.crop())?;
        self.session
            .set_brightness(view.brightness(&self.options.limits))
    }
}
