// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer implementation of the pipeline session
//!
//! Builds `rtspsrc ! rtpjpegdepay ! <stages> ! <sink>` for the selected
//! variant. The source pad only appears after the RTSP handshake, so it is
//! linked from the `pad-added` callback under the shared [`PadSlot`] lock and
//! the outcome is posted to the event loop, which drains it in `pump`.
//!
//! Key presses in the sink's window travel upstream as navigation events; a
//! callback on the sink pad maps them to commands for the same loop.

use super::pad::{PadDecision, PadEvent, PadEventKind, PadSlot};
use super::recording::{Finalize, finalize_plan, new_recording_path};
use super::{CropWindow, PipelineSession, PipelineVariant, PlaybackState, RenderTarget, Stage};
use crate::constants::{pipeline, rtsp, timing};
use crate::errors::{SessionError, SessionResult};
use crate::keymap::Command;
use futures::channel::mpsc;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

type SharedPadSlot = Arc<Mutex<PadSlot<gst::Pad>>>;

/// Settings that stay fixed across rebuilds
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Video sink factory name
    pub sink: String,
    /// Directory receiving recordings
    pub recording_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sink: pipeline::DEFAULT_SINK.to_string(),
            recording_dir: PathBuf::from("."),
        }
    }
}

/// Elements of the live graph the session needs to reach after construction
struct LiveGraph {
    pipeline: gst::Pipeline,
    source: gst::Element,
    depay: gst::Element,
    crop: Option<gst::Element>,
    balance: Option<gst::Element>,
    sink: gst::Element,
    /// Sink exposes a `fullscreen` property
    fullscreen_capable: bool,
    variant: PipelineVariant,
    address: String,
    recording: Option<PathBuf>,
}

/// Pipeline session backed by a GStreamer graph
pub struct GstSession {
    settings: SessionSettings,
    graph: Option<LiveGraph>,
    state: PlaybackState,
    target: RenderTarget,
    pads: SharedPadSlot,
    events_tx: mpsc::UnboundedSender<PadEvent>,
    events_rx: mpsc::UnboundedReceiver<PadEvent>,
    keys_tx: mpsc::UnboundedSender<Command>,
    keys_rx: mpsc::UnboundedReceiver<Command>,
    fullscreen_warned: bool,
}

impl GstSession {
    pub fn new(settings: SessionSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        let (keys_tx, keys_rx) = mpsc::unbounded();
        Self {
            settings,
            graph: None,
            state: PlaybackState::Idle,
            target: RenderTarget::default(),
            pads: Arc::new(Mutex::new(PadSlot::new())),
            events_tx,
            events_rx,
            keys_tx,
            keys_rx,
            fullscreen_warned: false,
        }
    }

    /// File the current session is recording to, if any
    pub fn recording_path(&self) -> Option<&PathBuf> {
        self.graph.as_ref().and_then(|g| g.recording.as_ref())
    }

    fn graph(&self, operation: &'static str) -> SessionResult<&LiveGraph> {
        self.graph.as_ref().ok_or(SessionError::InvalidTransition {
            operation,
            state: self.state,
        })
    }

    fn build_graph(
        &self,
        address: &str,
        variant: PipelineVariant,
        generation: u64,
    ) -> SessionResult<LiveGraph> {
        let uri = rtsp::uri(address);
        info!(%uri, %variant, generation, "Building camera pipeline");

        let pipeline = gst::Pipeline::new();

        let source = gst::ElementFactory::make("rtspsrc")
            .name("source")
            .property("latency", rtsp::LATENCY_MS)
            .property("location", uri.as_str())
            .build()
            .map_err(|e| element_error("rtspsrc", e))?;
        let depay = make_element("rtpjpegdepay", "depay")?;

        let mut chain = vec![depay.clone()];
        let mut crop = None;
        let mut balance = None;
        for stage in variant.stages() {
            let element = make_stage(*stage)?;
            match stage {
                Stage::Crop => crop = Some(element.clone()),
                Stage::Brightness => balance = Some(element.clone()),
                _ => {}
            }
            chain.push(element);
        }

        let sink = make_sink(&self.settings.sink)?;
        let fullscreen_capable = sink.has_property("fullscreen");
        apply_window_handle(&sink, self.target.window_handle);
        if fullscreen_capable {
            sink.set_property("fullscreen", self.target.fullscreen);
        }
        self.connect_navigation(&sink);

        pipeline.add(&source)?;
        pipeline.add_many(chain.iter())?;

        let recording = if variant.has_recording() {
            let path = new_recording_path(&self.settings.recording_dir);
            let tee = make_element("tee", "tee")?;
            let queue_file = make_element("queue", "queue-file")?;
            let encoder = make_element("jpegenc", "jpegenc")?;
            let muxer = make_element("avimux", "avimux")?;
            let filesink = gst::ElementFactory::make("filesink")
                .name("filesink")
                .property("location", path.to_string_lossy().as_ref())
                .build()
                .map_err(|e| element_error("filesink", e))?;
            let queue_display = make_element("queue", "queue-display")?;

            pipeline.add_many([
                &tee,
                &queue_file,
                &encoder,
                &muxer,
                &filesink,
                &queue_display,
                &sink,
            ])?;
            chain.push(tee.clone());
            gst::Element::link_many(chain.iter())?;
            gst::Element::link_many([&tee, &queue_file, &encoder, &muxer, &filesink])?;
            gst::Element::link_many([&tee, &queue_display, &sink])?;

            info!(path = %path.display(), "Recording to file");
            Some(path)
        } else {
            pipeline.add(&sink)?;
            chain.push(sink.clone());
            gst::Element::link_many(chain.iter())?;
            None
        };

        self.connect_source_callbacks(&source, &depay, &sink, generation);

        Ok(LiveGraph {
            pipeline,
            source,
            depay,
            crop,
            balance,
            sink,
            fullscreen_capable,
            variant,
            address: address.to_string(),
            recording,
        })
    }

    /// Forward key presses from the sink's window as commands
    fn connect_navigation(&self, sink: &gst::Element) {
        let Some(pad) = sink.static_pad("sink") else {
            warn!("Video sink has no sink pad, window keys disabled");
            return;
        };
        let keys = self.keys_tx.clone();
        let watch = pad.add_probe(gst::PadProbeType::EVENT_UPSTREAM, move |_pad, info| {
            if let Some(gst::PadProbeData::Event(ref event)) = info.data
                && let Some(command) = window_command(event)
            {
                let _ = keys.unbounded_send(command);
            }
            gst::PadProbeReturn::Ok
        });
        if watch.is_none() {
            warn!("Could not watch the video window for key presses");
        }
    }

    /// Warn the first time fullscreen is requested from a sink that cannot do it
    fn warn_fullscreen_unsupported(&mut self) {
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        if !self.target.fullscreen || graph.fullscreen_capable || self.fullscreen_warned {
            return;
        }
        let sink = graph
            .sink
            .factory()
            .map(|f| f.name().to_string())
            .unwrap_or_default();
        warn!(
            %sink,
            "Video sink cannot go fullscreen; configure a sink with a fullscreen property such as waylandsink"
        );
        self.fullscreen_warned = true;
    }

    /// Wire pad-added/pad-removed so the source links once the handshake yields a pad
    fn connect_source_callbacks(
        &self,
        source: &gst::Element,
        depay: &gst::Element,
        sink: &gst::Element,
        generation: u64,
    ) {
        let slot = Arc::clone(&self.pads);
        let events = self.events_tx.clone();
        let depay_weak = depay.downgrade();
        let sink_weak = sink.downgrade();
        let window_handle = self.target.window_handle;
        source.connect_pad_added(move |_source, pad| {
            let mut slot = lock_slot(&slot);
            match slot.on_added(generation) {
                PadDecision::Link => {}
                decision => {
                    debug!(pad = %pad.name(), ?decision, "Ignoring source pad");
                    return;
                }
            }
            let Some(depay) = depay_weak.upgrade() else {
                return;
            };

            let kind = match link_source_pad(pad, &depay) {
                Ok(()) => {
                    slot.record_linked(pad.clone());
                    if let Some(sink) = sink_weak.upgrade() {
                        apply_window_handle(&sink, window_handle);
                    }
                    PadEventKind::Linked {
                        pad: pad.name().to_string(),
                    }
                }
                Err(reason) => PadEventKind::LinkFailed {
                    pad: pad.name().to_string(),
                    reason,
                },
            };
            let _ = events.unbounded_send(PadEvent { generation, kind });
        });

        let slot = Arc::clone(&self.pads);
        let events = self.events_tx.clone();
        let depay_weak = depay.downgrade();
        source.connect_pad_removed(move |_source, pad| {
            let Some(linked) = lock_slot(&slot).on_removed(generation, pad) else {
                return;
            };
            if let Some(depay) = depay_weak.upgrade() {
                unlink_source_pad(&linked, &depay);
            }
            let _ = events.unbounded_send(PadEvent {
                generation,
                kind: PadEventKind::Unlinked {
                    pad: linked.name().to_string(),
                },
            });
        });
    }

    fn drain_pad_events(&mut self) -> SessionResult<()> {
        while let Ok(event) = self.events_rx.try_recv() {
            if !lock_slot(&self.pads).is_current(event.generation) {
                debug!(generation = event.generation, "Dropping stale pad event");
                continue;
            }
            match event.kind {
                PadEventKind::Linked { pad } => info!(%pad, "Source pad linked to depayloader"),
                PadEventKind::Unlinked { pad } => {
                    info!(%pad, "Source pad unlinked from depayloader")
                }
                PadEventKind::LinkFailed { pad, reason } => {
                    error!(%pad, %reason, "Failed to link source pad");
                    return Err(SessionError::LinkFailed(format!("{}: {}", pad, reason)));
                }
            }
        }
        Ok(())
    }

    fn drain_bus(&self) -> SessionResult<()> {
        let Some(bus) = self.graph.as_ref().and_then(|g| g.pipeline.bus()) else {
            return Ok(());
        };
        while let Some(msg) = bus.pop() {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    let source = err
                        .src()
                        .map(|s| s.path_string().to_string())
                        .unwrap_or_default();
                    error!(
                        %source,
                        error = %err.error(),
                        debug = ?err.debug(),
                        "Pipeline error"
                    );
                    return Err(SessionError::Pipeline(format!(
                        "{}: {}",
                        source,
                        err.error()
                    )));
                }
                gst::MessageView::Warning(w) => {
                    warn!(error = %w.error(), debug = ?w.debug(), "Pipeline warning");
                }
                gst::MessageView::Eos(_) => info!("End of stream"),
                _ => {}
            }
        }
        Ok(())
    }
}

impl PipelineSession for GstSession {
    fn start(
        &mut self,
        address: &str,
        target: RenderTarget,
        variant: PipelineVariant,
    ) -> SessionResult<()> {
        let next = self.state.start()?;
        gst::init()?;

        self.target = target;
        let generation = lock_slot(&self.pads).arm();
        match self.build_graph(address, variant, generation) {
            Ok(graph) => {
                self.graph = Some(graph);
                self.state = next;
                self.warn_fullscreen_unsupported();
                Ok(())
            }
            Err(e) => {
                lock_slot(&self.pads).disarm();
                error!(%address, error = %e, "Failed to build pipeline");
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> SessionResult<()> {
        let previous = self.state;
        let linked = lock_slot(&self.pads).disarm();
        self.state = self.state.stop();
        let Some(graph) = self.graph.take() else {
            return Ok(());
        };
        info!(address = %graph.address, "Stopping pipeline");

        // EOS enters at the source, so drain before unlinking it
        if let Some(path) = graph.recording.as_ref() {
            match finalize_plan(previous, linked.is_some()) {
                Finalize::Drain => finish_recording(&graph.pipeline),
                Finalize::ResumeAndDrain => {
                    if let Err(e) = graph.pipeline.set_state(gst::State::Playing) {
                        warn!(error = %e, "Could not resume pipeline to finalize recording");
                    } else {
                        finish_recording(&graph.pipeline);
                    }
                }
                Finalize::Abandon => {
                    warn!(path = %path.display(), "No video reached the recording, not finalizing")
                }
            }
        }

        if let Some(pad) = linked {
            unlink_source_pad(&pad, &graph.depay);
        }

        let result = graph.pipeline.set_state(gst::State::Null);
        let (change, state, _) = graph
            .pipeline
            .state(gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        debug!(result = ?change, state = ?state, "Pipeline torn down");
        result?;
        Ok(())
    }

    fn play(&mut self) -> SessionResult<()> {
        let next = self.state.play()?;
        let graph = self.graph("play")?;
        graph.pipeline.set_state(gst::State::Playing)?;
        debug!(address = %graph.address, "Pipeline playing");
        self.state = next;
        Ok(())
    }

    fn pause(&mut self) -> SessionResult<()> {
        let next = self.state.pause()?;
        let graph = self.graph("pause")?;
        graph.pipeline.set_state(gst::State::Paused)?;
        debug!(address = %graph.address, "Pipeline paused");
        self.state = next;
        Ok(())
    }

    fn set_crop(&mut self, crop: CropWindow) -> SessionResult<()> {
        let Some(graph) = self.graph.as_ref() else {
            debug!(%crop, "No pipeline, crop not applied");
            return Ok(());
        };
        let Some(element) = graph.crop.as_ref() else {
            debug!(variant = %graph.variant, "Pipeline has no crop stage");
            return Ok(());
        };
        element.set_property("left", to_gint(crop.left));
        element.set_property("right", to_gint(crop.right));
        element.set_property("top", to_gint(crop.top));
        element.set_property("bottom", to_gint(crop.bottom));
        debug!(%crop, "Crop applied");
        Ok(())
    }

    fn set_brightness(&mut self, value: f64) -> SessionResult<()> {
        let Some(graph) = self.graph.as_ref() else {
            debug!(value, "No pipeline, brightness not applied");
            return Ok(());
        };
        let Some(element) = graph.balance.as_ref() else {
            debug!(variant = %graph.variant, "Pipeline has no brightness stage");
            return Ok(());
        };
        element.set_property("brightness", value);
        debug!(value, "Brightness applied");
        Ok(())
    }

    fn rebind_address(&mut self, address: &str) -> SessionResult<()> {
        let linked = lock_slot(&self.pads).take_linked();
        let Some(graph) = self.graph.as_mut() else {
            return Err(SessionError::InvalidTransition {
                operation: "rebind",
                state: self.state,
            });
        };
        if let Some(pad) = linked {
            unlink_source_pad(&pad, &graph.depay);
        }
        let uri = rtsp::uri(address);
        info!(from = %graph.address, to = %uri, "Rebinding source address");
        graph.source.set_property("location", uri.as_str());
        graph.address = address.to_string();
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.target.fullscreen = fullscreen;
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        if graph.fullscreen_capable {
            graph.sink.set_property("fullscreen", fullscreen);
            debug!(fullscreen, "Fullscreen applied to sink");
        } else {
            self.warn_fullscreen_unsupported();
        }
    }

    fn fullscreen_supported(&self) -> bool {
        self.graph.as_ref().is_none_or(|g| g.fullscreen_capable)
    }

    fn take_commands(&mut self) -> Vec<Command> {
        std::iter::from_fn(|| self.keys_rx.try_recv().ok()).collect()
    }

    fn pump(&mut self) -> SessionResult<()> {
        self.drain_pad_events()?;
        self.drain_bus()
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn variant(&self) -> Option<PipelineVariant> {
        self.graph.as_ref().map(|g| g.variant)
    }
}

impl Drop for GstSession {
    fn drop(&mut self) {
        if self.graph.is_some() {
            debug!("Dropping session - explicitly stopping");
            if let Err(e) = self.stop() {
                warn!(error = %e, "Pipeline did not stop cleanly");
            }
        }
    }
}

fn lock_slot(slot: &Mutex<PadSlot<gst::Pad>>) -> MutexGuard<'_, PadSlot<gst::Pad>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn element_error(factory: &str, err: impl std::fmt::Display) -> SessionError {
    if gst::ElementFactory::find(factory).is_none() {
        SessionError::ElementMissing(factory.to_string())
    } else {
        SessionError::InitializationFailed(format!("Failed to create {}: {}", factory, err))
    }
}

fn make_element(factory: &str, name: &str) -> SessionResult<gst::Element> {
    gst::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|e| element_error(factory, e))
}

fn make_stage(stage: Stage) -> SessionResult<gst::Element> {
    match stage {
        Stage::Decode => {
            let decoder = pipeline::DECODERS
                .iter()
                .find(|name| gst::ElementFactory::find(name).is_some())
                .ok_or_else(|| SessionError::ElementMissing(pipeline::DECODERS.join(" or ")))?;
            debug!(decoder, "Selected MJPEG decoder");
            make_element(decoder, "decode")
        }
        Stage::Crop => gst::ElementFactory::make("videocrop")
            .name("crop")
            .property("left", 0i32)
            .property("right", 0i32)
            .property("top", 0i32)
            .property("bottom", 0i32)
            .build()
            .map_err(|e| element_error("videocrop", e)),
        Stage::Scale => make_element("videoscale", "scale"),
        Stage::RateLimit => make_element("videorate", "rate"),
        Stage::Brightness => gst::ElementFactory::make("videobalance")
            .name("balance")
            .property("brightness", 0.0f64)
            .build()
            .map_err(|e| element_error("videobalance", e)),
        Stage::OutputCaps => {
            let caps = gst::Caps::builder("video/x-raw")
                .field(
                    "framerate",
                    gst::Fraction::new(pipeline::OUTPUT_FRAMERATE, 1),
                )
                .field("width", pipeline::OUTPUT_WIDTH)
                .field("height", pipeline::OUTPUT_HEIGHT)
                .build();
            gst::ElementFactory::make("capsfilter")
                .name("output-caps")
                .property("caps", &caps)
                .build()
                .map_err(|e| element_error("capsfilter", e))
        }
        Stage::Convert => make_element("videoconvert", "convert"),
    }
}

fn make_sink(factory: &str) -> SessionResult<gst::Element> {
    let factory = if gst::ElementFactory::find(factory).is_some() {
        factory
    } else {
        warn!(
            sink = factory,
            fallback = pipeline::FALLBACK_SINK,
            "Video sink not available, using fallback"
        );
        pipeline::FALLBACK_SINK
    };
    make_element(factory, "sink")
}

fn link_source_pad(pad: &gst::Pad, depay: &gst::Element) -> Result<(), String> {
    let sink_pad = depay
        .static_pad("sink")
        .ok_or_else(|| "depayloader has no sink pad".to_string())?;
    if sink_pad.is_linked() {
        return Err("depayloader sink pad already linked".to_string());
    }
    pad.link(&sink_pad).map(|_| ()).map_err(|e| e.to_string())
}

fn unlink_source_pad(pad: &gst::Pad, depay: &gst::Element) {
    let Some(sink_pad) = depay.static_pad("sink") else {
        return;
    };
    if let Err(e) = pad.unlink(&sink_pad) {
        debug!(pad = %pad.name(), error = %e, "Source pad was not linked");
    }
}

fn apply_window_handle(sink: &gst::Element, handle: Option<usize>) {
    let Some(handle) = handle else {
        return;
    };
    match sink.dynamic_cast_ref::<gstreamer_video::VideoOverlay>() {
        Some(overlay) => {
            // The handle comes from the display collaborator and outlives the pipeline
            unsafe { overlay.set_window_handle(handle) };
            debug!(handle, "Window handle applied to sink");
        }
        None => warn!("Video sink does not accept a window handle"),
    }
}

/// Map a navigation key press from the sink window to a command
fn window_command(event: &gst::EventRef) -> Option<Command> {
    if event.type_() != gst::EventType::Navigation {
        return None;
    }
    match gstreamer_video::NavigationEvent::parse(event).ok()? {
        gstreamer_video::NavigationEvent::KeyPress { key, .. } => {
            let command = Command::from_key_name(&key);
            debug!(%key, ?command, "Window key press");
            command
        }
        _ => None,
    }
}

/// Push EOS through the graph so the AVI index is written before teardown
fn finish_recording(pipeline: &gst::Pipeline) {
    if !pipeline.send_event(gst::event::Eos::new()) {
        debug!("EOS not accepted, recording may lack an index");
        return;
    }
    let Some(bus) = pipeline.bus() else {
        return;
    };
    let msg = bus.timed_pop_filtered(
        gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS),
        &[gst::MessageType::Eos, gst::MessageType::Error],
    );
    match msg.as_ref().map(|m| m.view()) {
        Some(gst::MessageView::Eos(_)) => info!("Recording finalized"),
        Some(gst::MessageView::Error(err)) => {
            warn!(error = %err.error(), "Error while finalizing recording")
        }
        _ => warn!("Timed out finalizing recording"),
    }
}

fn to_gint(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
