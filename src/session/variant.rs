// SPDX-License-Identifier: GPL-3.0-only

//! Fixed pipeline topologies

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Pipeline shape a session is built as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineVariant {
    /// source → depay → decode → sink
    #[default]
    Simple,
    /// Adds brightness adjustment
    LightenOnly,
    /// Adds crop, scale, rate limit and brightness (digital PTZ)
    Full,
    /// Full chain, also encoding to a timestamped AVI file
    RecordAndDisplay,
}

/// One processing stage between the depayloader and the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Crop,
    Scale,
    RateLimit,
    Brightness,
    OutputCaps,
    Convert,
}

const SIMPLE_STAGES: &[Stage] = &[Stage::Decode];

const LIGHTEN_STAGES: &[Stage] = &[Stage::Decode, Stage::Brightness];

const FULL_STAGES: &[Stage] = &[
    Stage::Decode,
    Stage::Crop,
    Stage::Scale,
    Stage::RateLimit,
    Stage::Brightness,
    Stage::OutputCaps,
    Stage::Convert,
];

impl PipelineVariant {
    pub const ALL: [PipelineVariant; 4] = [
        PipelineVariant::Simple,
        PipelineVariant::LightenOnly,
        PipelineVariant::Full,
        PipelineVariant::RecordAndDisplay,
    ];

    /// Stages between depayloader and display, in link order
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            PipelineVariant::Simple => SIMPLE_STAGES,
            PipelineVariant::LightenOnly => LIGHTEN_STAGES,
            PipelineVariant::Full | PipelineVariant::RecordAndDisplay => FULL_STAGES,
        }
    }

    pub fn has_crop(&self) -> bool {
        self.stages().contains(&Stage::Crop)
    }

    pub fn has_brightness(&self) -> bool {
        self.stages().contains(&Stage::Brightness)
    }

    pub fn has_recording(&self) -> bool {
        matches!(self, PipelineVariant::RecordAndDisplay)
    }

    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            PipelineVariant::Simple => "simple",
            PipelineVariant::LightenOnly => "lighten-only",
            PipelineVariant::Full => "full",
            PipelineVariant::RecordAndDisplay => "record-and-display",
        }
    }

    /// Parse a configuration name, including the prototype's legacy names
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(PipelineVariant::Simple),
            "lighten-only" | "lightenonly" => Some(PipelineVariant::LightenOnly),
            "full" | "lightenptz" => Some(PipelineVariant::Full),
            "record-and-display" | "tofileanddisplay" => Some(PipelineVariant::RecordAndDisplay),
            _ => None,
        }
    }

    /// Parse a configuration name, falling back to `Simple` with a warning
    pub fn from_name_or_simple(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!(
                variant = name,
                "Unknown pipeline variant, using simple pipeline instead"
            );
            PipelineVariant::Simple
        })
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
