// SPDX-License-Identifier: GPL-3.0-only

//! Recording file naming and finalisation

use super::PlaybackState;
use crate::constants::pipeline::RECORDING_EXTENSION;
use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// File name for a recording started at `time`
///
/// Fields are year, month, day, hour, minute, second joined by underscores,
/// all but the year zero-padded to two digits.
pub fn recording_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}.{}",
        time.format("%Y_%m_%d_%H_%M_%S"),
        RECORDING_EXTENSION
    )
}

/// Path of a new recording in `dir`, stamped with the local wall clock
pub fn new_recording_path(dir: &Path) -> PathBuf {
    dir.join(recording_file_name(&Local::now()))
}

/// How a recording is closed when its session stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalize {
    /// Data is flowing; push EOS and wait for the muxer to write the index
    Drain,
    /// Paused with a linked source; resume so EOS can pass the prerolled sinks
    ResumeAndDrain,
    /// Nothing reached the muxer, EOS would only time out
    Abandon,
}

/// Pick the finalisation for a session in `state` whose source pad is or isn't linked
pub fn finalize_plan(state: PlaybackState, source_linked: bool) -> Finalize {
    match (state, source_linked) {
        (PlaybackState::Playing, true) => Finalize::Drain,
        (PlaybackState::Paused, true) => Finalize::ResumeAndDrain,
        _ => Finalize::Abandon,
    }
}
