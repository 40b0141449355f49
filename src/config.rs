// SPDX-License-Identifier: GPL-3.0-only

//! Viewer configuration
//!
//! Read from a JSON file; every field has a default so a partial file is
//! enough. Command-line flags are layered on top in `main`.

use crate::constants::pipeline;
use crate::controller::{ControllerOptions, SwitchStrategy, ViewLimits};
use crate::errors::{AppError, AppResult};
use crate::session::pipeline::SessionSettings;
use crate::session::{PipelineVariant, RenderTarget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the user config dir
pub const APP_DIR: &str = "hauler-vision";

/// Config file name inside [`APP_DIR`]
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera addresses in cycling order
    pub cameras: Vec<String>,
    /// Pipeline variant name; unknown names fall back to the simple pipeline
    pub variant: String,
    /// Video sink factory
    pub sink: String,
    /// Native window handle for the sink to draw into
    pub window_handle: Option<usize>,
    /// Start fullscreen
    pub fullscreen: bool,
    /// Directory receiving recordings
    pub recording_dir: PathBuf,
    /// Re-apply a camera's saved crop and brightness after switching to it
    pub restore_view_on_switch: bool,
    /// How a camera switch is applied to the pipeline
    pub switch_strategy: SwitchStrategy,
    /// Frame geometry and adjustment steps
    pub view: ViewLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cameras: Vec::new(),
            variant: PipelineVariant::Full.name().to_string(),
            sink: pipeline::DEFAULT_SINK.to_string(),
            window_handle: None,
            fullscreen: true,
            recording_dir: PathBuf::from("."),
            restore_view_on_switch: true,
            switch_strategy: SwitchStrategy::default(),
            view: ViewLimits::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Parse a config from JSON text
    pub fn from_json(text: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a config file
    pub fn load(path: &Path) -> AppResult<Self> {
        info!(path = %path.display(), "Loading configuration");
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Read `path` if given, else the default file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject configurations the viewer cannot start with
    pub fn validate(&self) -> AppResult<()> {
        if self.cameras.iter().all(|c| c.trim().is_empty()) {
            return Err(AppError::Config(
                "no camera addresses configured (use --camera or the config file)".to_string(),
            ));
        }
        if self.sink.trim().is_empty() {
            return Err(AppError::Config("video sink must not be empty".to_string()));
        }
        self.view.validate().map_err(AppError::Config)
    }

    /// Resolved pipeline variant
    pub fn pipeline_variant(&self) -> PipelineVariant {
        PipelineVariant::from_name_or_simple(&self.variant)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            variant: self.pipeline_variant(),
            limits: self.view,
            restore_view_on_switch: self.restore_view_on_switch,
            switch_strategy: self.switch_strategy,
            target: RenderTarget {
                window_handle: self.window_handle,
                fullscreen: self.fullscreen,
            },
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            sink: self.sink.clone(),
            recording_dir: self.recording_dir.clone(),
        }
    }
}
