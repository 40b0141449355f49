// SPDX-License-Identifier: GPL-3.0-only

//! Per-camera view state and its bounds policy
//!
//! Every adjustment returns whether it was accepted. A rejected adjustment
//! leaves the view untouched; values are never clamped to something the
//! operator did not ask for.

use crate::constants::view;
use crate::session::CropWindow;
use serde::{Deserialize, Serialize};

/// Frame geometry and step sizes shared by all cameras
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLimits {
    pub frame_width: u32,
    pub frame_height: u32,
    pub zoom_step_horizontal: u32,
    pub zoom_step_vertical: u32,
    pub brightness_step: f64,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            frame_width: view::FRAME_WIDTH,
            frame_height: view::FRAME_HEIGHT,
            zoom_step_horizontal: view::ZOOM_STEP_HORIZONTAL,
            zoom_step_vertical: view::ZOOM_STEP_VERTICAL,
            brightness_step: view::BRIGHTNESS_STEP,
        }
    }
}

impl ViewLimits {
    /// Largest `left + right` a zoom may produce
    pub fn max_horizontal_crop(&self) -> u32 {
        self.frame_width
            .saturating_sub(self.zoom_step_horizontal.saturating_mul(2))
    }

    /// Largest `top + bottom` a zoom may produce
    pub fn max_vertical_crop(&self) -> u32 {
        self.frame_height
            .saturating_sub(self.zoom_step_vertical.saturating_mul(2))
    }

    /// Brightness steps reachable in each direction while staying short of the limit
    pub fn max_brightness_steps(&self) -> i32 {
        // Small epsilon absorbs binary rounding of the step
        ((view::BRIGHTNESS_LIMIT - self.brightness_step) / self.brightness_step + 1e-9).floor()
            as i32
    }

    /// Check the limits describe a usable frame; returns a reason otherwise
    pub fn validate(&self) -> Result<(), String> {
        if self.zoom_step_horizontal == 0 || self.zoom_step_vertical == 0 {
            return Err("zoom steps must be positive".to_string());
        }
        let (Some(double_h), Some(double_v)) = (
            self.zoom_step_horizontal.checked_mul(2),
            self.zoom_step_vertical.checked_mul(2),
        ) else {
            return Err(format!(
                "zoom steps {}/{} are out of range",
                self.zoom_step_horizontal, self.zoom_step_vertical
            ));
        };
        if self.max_horizontal_crop() < double_h || self.max_vertical_crop() < double_v {
            return Err(format!(
                "frame {}x{} is too small for zoom steps {}/{}",
                self.frame_width,
                self.frame_height,
                self.zoom_step_horizontal,
                self.zoom_step_vertical
            ));
        }
        if !self.brightness_step.is_finite()
            || self.brightness_step <= 0.0
            || self.brightness_step >= view::BRIGHTNESS_LIMIT
        {
            return Err(format!(
                "brightness step {} must be within (0, 1)",
                self.brightness_step
            ));
        }
        Ok(())
    }
}

/// Crop and brightness applied to one camera
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraView {
    crop: CropWindow,
    brightness_steps: i32,
}

impl CameraView {
    pub fn crop(&self) -> CropWindow {
        self.crop
    }

    /// Brightness in (-1.0, 1.0)
    pub fn brightness(&self, limits: &ViewLimits) -> f64 {
        f64::from(self.brightness_steps) * limits.brightness_step
    }

    pub fn is_default(&self) -> bool {
        *self == CameraView::default()
    }

    pub fn zoom_in(&mut self, limits: &ViewLimits) -> bool {
        let (dh, dv) = (limits.zoom_step_horizontal, limits.zoom_step_vertical);
        if self.crop.horizontal() + 2 * dh > limits.max_horizontal_crop()
            || self.crop.vertical() + 2 * dv > limits.max_vertical_crop()
        {
            return false;
        }
        self.crop.left += dh;
        self.crop.right += dh;
        self.crop.top += dv;
        self.crop.bottom += dv;
        true
    }

    /// Shrink all four borders by one step
    ///
    /// Does not re-centre; the controller pans first so each pan is pushed
    /// on its own.
    pub fn zoom_out(&mut self, limits: &ViewLimits) -> bool {
        let (dh, dv) = (limits.zoom_step_horizontal, limits.zoom_step_vertical);
        if self.crop.horizontal() <= 2 * dh {
            return false;
        }
        let shrunk = (
            self.crop.left.checked_sub(dh),
            self.crop.right.checked_sub(dh),
            self.crop.top.checked_sub(dv),
            self.crop.bottom.checked_sub(dv),
        );
        let (Some(left), Some(right), Some(top), Some(bottom)) = shrunk else {
            return false;
        };
        self.crop = CropWindow {
            left,
            right,
            top,
            bottom,
        };
        true
    }

    pub fn pan_up(&mut self, limits: &ViewLimits) -> bool {
        shift(
            &mut self.crop.top,
            &mut self.crop.bottom,
            limits.zoom_step_vertical,
        )
    }

    pub fn pan_down(&mut self, limits: &ViewLimits) -> bool {
        shift(
            &mut self.crop.bottom,
            &mut self.crop.top,
            limits.zoom_step_vertical,
        )
    }

    pub fn pan_left(&mut self, limits: &ViewLimits) -> bool {
        shift(
            &mut self.crop.left,
            &mut self.crop.right,
            limits.zoom_step_horizontal,
        )
    }

    pub fn pan_right(&mut self, limits: &ViewLimits) -> bool {
        shift(
            &mut self.crop.right,
            &mut self.crop.left,
            limits.zoom_step_horizontal,
        )
    }

    pub fn brighten(&mut self, limits: &ViewLimits) -> bool {
        if self.brightness_steps >= limits.max_brightness_steps() {
            return false;
        }
        self.brightness_steps += 1;
        true
    }

    pub fn darken(&mut self, limits: &ViewLimits) -> bool {
        if self.brightness_steps <= -limits.max_brightness_steps() {
            return false;
        }
        self.brightness_steps -= 1;
        true
    }
}

/// Move `step` pixels from `from` to `to`; rejected if `from` would go negative
fn shift(from: &mut u32, to: &mut u32, step: u32) -> bool {
    match from.checked_sub(step) {
        Some(rest) => {
            *from = rest;
            *to += step;
            true
        }
        None => false,
    }
}

/// One configured camera endpoint and its persisted view
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    address: String,
    pub view: CameraView,
}

impl Camera {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            view: CameraView::default(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}
