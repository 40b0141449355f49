// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Axis camera RTSP endpoint
pub mod rtsp {
    /// RTSP port exposed by Axis firmware
    pub const PORT: u16 = 554;

    /// Media path requesting MJPEG video without audio
    pub const MEDIA_PATH: &str = "axis-media/media.amp?videocodec=jpeg&audio=0";

    /// Jitterbuffer latency for rtspsrc (milliseconds)
    pub const LATENCY_MS: u32 = 0;

    /// Build the RTSP URI for a camera address
    ///
    /// The query string is what Axis firmware expects, byte for byte.
    pub fn uri(address: &str) -> String {
        format!("rtsp://{}:{}/{}", address, PORT, MEDIA_PATH)
    }
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// MJPEG decoders in order of preference
    pub const DECODERS: &[&str] = &["avdec_mjpeg", "jpegdec"];

    /// Default video sink (hardware scaling through Xv)
    pub const DEFAULT_SINK: &str = "xvimagesink";

    /// Sink used when the configured one is not installed
    pub const FALLBACK_SINK: &str = "autovideosink";

    /// Output width after scaling in the PTZ chain
    pub const OUTPUT_WIDTH: i32 = 1024;

    /// Output height after scaling in the PTZ chain
    pub const OUTPUT_HEIGHT: i32 = 768;

    /// Output framerate after rate limiting in the PTZ chain
    pub const OUTPUT_FRAMERATE: i32 = 10;

    /// Recorded file extension
    pub const RECORDING_EXTENSION: &str = "avi";
}

/// Digital pan/tilt/zoom and brightness defaults
///
/// Tuned for an Axis P1347 streaming 1600x1200 MJPEG.
pub mod view {
    /// Source frame width in pixels
    pub const FRAME_WIDTH: u32 = 1600;

    /// Source frame height in pixels
    pub const FRAME_HEIGHT: u32 = 1200;

    /// Pixels added to left and right per zoom step
    pub const ZOOM_STEP_HORIZONTAL: u32 = 4;

    /// Pixels added to top and bottom per zoom step
    pub const ZOOM_STEP_VERTICAL: u32 = 3;

    /// Brightness change per step
    pub const BRIGHTNESS_STEP: f64 = 0.01;

    /// Brightness limit (exclusive) in both directions
    pub const BRIGHTNESS_LIMIT: f64 = 1.0;
}

/// Timing constants
pub mod timing {
    /// Keyboard poll timeout; bounds how long pad events and bus messages wait
    pub const INPUT_POLL_MS: u64 = 16;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;
}
