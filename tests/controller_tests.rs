// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera controller against a recording session

use hauler_vision::controller::SwitchStrategy;
use hauler_vision::errors::SessionResult;
use hauler_vision::keymap::Command;
use hauler_vision::{
    CameraController, ControllerOptions, CropWindow, PipelineSession, PipelineVariant,
    PlaybackState, RenderTarget, SessionError,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start(String, PipelineVariant),
    Stop,
    Play,
    Pause,
    Crop(CropWindow),
    Brightness(f64),
    Rebind(String),
    Fullscreen(bool),
}

/// Session double that follows the playback state machine and records calls
#[derive(Default)]
struct RecordingSession {
    calls: Vec<Call>,
    state: PlaybackState,
    variant: Option<PipelineVariant>,
    /// Error returned by the next `pump`
    pending_failure: Option<SessionError>,
    /// Keys typed into the video window
    window_keys: Vec<Command>,
    /// Sink lacks a fullscreen mode
    windowed_only: bool,
}

impl RecordingSession {
    fn started_addresses(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Start(address, _) => Some(address.clone()),
                _ => None,
            })
            .collect()
    }

    fn crops(&self) -> Vec<CropWindow> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Crop(crop) => Some(*crop),
                _ => None,
            })
            .collect()
    }
}

impl PipelineSession for RecordingSession {
    fn start(
        &mut self,
        address: &str,
        _target: RenderTarget,
        variant: PipelineVariant,
    ) -> SessionResult<()> {
        self.state = self.state.start()?;
        self.variant = Some(variant);
        self.calls.push(Call::Start(address.to_string(), variant));
        Ok(())
    }

    fn stop(&mut self) -> SessionResult<()> {
        self.state = self.state.stop();
        self.variant = None;
        self.calls.push(Call::Stop);
        Ok(())
    }

    fn play(&mut self) -> SessionResult<()> {
        self.state = self.state.play()?;
        self.calls.push(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> SessionResult<()> {
        self.state = self.state.pause()?;
        self.calls.push(Call::Pause);
        Ok(())
    }

    fn set_crop(&mut self, crop: CropWindow) -> SessionResult<()> {
        // Mirrors the real session: no crop stage means a silent no-op
        if self.variant.is_some_and(|v| v.has_crop()) {
            self.calls.push(Call::Crop(crop));
        }
        Ok(())
    }

    fn set_brightness(&mut self, value: f64) -> SessionResult<()> {
        if self.variant.is_some_and(|v| v.has_brightness()) {
            self.calls.push(Call::Brightness(value));
        }
        Ok(())
    }

    fn rebind_address(&mut self, address: &str) -> SessionResult<()> {
        self.calls.push(Call::Rebind(address.to_string()));
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.calls.push(Call::Fullscreen(fullscreen));
    }

    fn fullscreen_supported(&self) -> bool {
        !self.windowed_only
    }

    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.window_keys)
    }

    fn pump(&mut self) -> SessionResult<()> {
        match self.pending_failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn variant(&self) -> Option<PipelineVariant> {
        self.variant
    }
}

fn options(variant: PipelineVariant) -> ControllerOptions {
    ControllerOptions {
        variant,
        ..ControllerOptions::default()
    }
}

fn controller(addresses: &[&str], variant: PipelineVariant) -> CameraController<RecordingSession> {
    let mut controller = CameraController::new(
        addresses.iter().copied(),
        RecordingSession::default(),
        options(variant),
    )
    .expect("valid controller");
    controller.start().expect("start");
    controller
}

#[test]
fn test_start_builds_and_plays_first_camera() {
    let controller = controller(&["10.0.0.1", "10.0.0.2"], PipelineVariant::Full);
    assert_eq!(controller.current_index(), 0);
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
    assert_eq!(
        controller.session().calls,
        vec![
            Call::Start("10.0.0.1".to_string(), PipelineVariant::Full),
            Call::Play
        ]
    );
}

#[test]
fn test_empty_camera_list_is_rejected() {
    let empty: [&str; 0] = [];
    let result = CameraController::new(
        empty,
        RecordingSession::default(),
        ControllerOptions::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_duplicate_addresses_dropped() {
    let controller = controller(&["a", "b", "a", " ", "c"], PipelineVariant::Simple);
    let addresses: Vec<_> = controller.cameras().iter().map(|c| c.address()).collect();
    assert_eq!(addresses, vec!["a", "b", "c"]);
}

#[test]
fn test_next_camera_cycles_a_b_c_a() {
    let mut controller = controller(&["A", "B", "C"], PipelineVariant::Full);
    for _ in 0..3 {
        controller.select_next_camera().unwrap();
    }
    assert_eq!(controller.current_index(), 0);
    assert_eq!(
        controller.session().started_addresses(),
        vec!["A", "B", "C", "A"]
    );
}

#[test]
fn test_next_camera_returns_to_start_after_count_calls() {
    for count in 1..=5 {
        let addresses: Vec<String> = (0..count).map(|i| format!("cam{}", i)).collect();
        let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
        let mut controller = controller(&refs, PipelineVariant::Simple);
        for _ in 0..count {
            controller.select_next_camera().unwrap();
        }
        assert_eq!(controller.current_index(), 0, "count {}", count);
    }
}

#[test]
fn test_switch_rebuilds_session() {
    let mut controller = controller(&["A", "B"], PipelineVariant::Full);
    controller.select_next_camera().unwrap();
    assert_eq!(
        controller.session().calls[2..],
        [
            Call::Stop,
            Call::Start("B".to_string(), PipelineVariant::Full),
            Call::Play
        ]
    );
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
}

#[test]
fn test_zoom_in_ten_times() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for _ in 0..10 {
        assert!(controller.zoom_in().unwrap());
    }
    let crop = controller.current_camera().view.crop();
    assert_eq!((crop.left, crop.right), (40, 40));
    assert_eq!((crop.top, crop.bottom), (30, 30));

    // The eleventh step to 88 is still well inside 1600 - 8
    assert!(controller.zoom_in().unwrap());
    assert_eq!(controller.current_camera().view.crop().horizontal(), 88);
}

#[test]
fn test_zoom_in_stops_at_1592() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    let mut previous = 0;
    while controller.zoom_in().unwrap() {
        let crop = controller.current_camera().view.crop();
        assert!(crop.horizontal() <= 1600 - 8);
        assert_eq!(crop.vertical() * 4, crop.horizontal() * 3);
        assert!(crop.horizontal() > previous);
        previous = crop.horizontal();
    }
    assert_eq!(previous, 1592);

    let pushed = controller.session().crops().len();
    assert!(!controller.zoom_in().unwrap());
    assert_eq!(controller.current_camera().view.crop().horizontal(), 1592);
    assert_eq!(
        controller.session().crops().len(),
        pushed,
        "rejected zoom must not push"
    );
}

#[test]
fn test_every_accepted_adjustment_is_pushed() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    controller.zoom_in().unwrap();
    controller.zoom_in().unwrap();
    controller.pan_left().unwrap();
    let crops = controller.session().crops();
    assert_eq!(crops.len(), 3);
    assert_eq!(crops.last(), Some(&controller.current_camera().view.crop()));
}

#[test]
fn test_zoom_out_never_negative() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for _ in 0..20 {
        controller.zoom_in().unwrap();
    }
    for _ in 0..7 {
        controller.pan_left().unwrap();
        controller.pan_up().unwrap();
    }
    for _ in 0..40 {
        controller.zoom_out().unwrap();
    }
    let crop = controller.current_camera().view.crop();
    assert!(crop.horizontal() <= 8, "zoomed out to {}", crop);
    assert!(crop.vertical() <= 6, "zoomed out to {}", crop);
    // Every crop pushed on the way was a valid window
    for pushed in controller.session().crops() {
        assert!(pushed.horizontal() < 1600);
        assert!(pushed.vertical() < 1200);
    }
}

#[test]
fn test_zoom_out_recentres_off_centre_crop() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for _ in 0..3 {
        controller.zoom_in().unwrap();
    }
    // left 12 -> 0, right 12 -> 24
    for _ in 0..3 {
        controller.pan_left().unwrap();
    }
    assert_eq!(controller.current_camera().view.crop().left, 0);

    assert!(controller.zoom_out().unwrap());
    let crop = controller.current_camera().view.crop();
    assert_eq!((crop.left, crop.right), (0, 16));
    assert_eq!((crop.top, crop.bottom), (6, 6));
}

#[test]
fn test_zoom_out_reports_recentring_only_change() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    controller.zoom_in().unwrap();
    controller.pan_left().unwrap();
    controller.pan_up().unwrap();
    assert_eq!(
        controller.current_camera().view.crop(),
        CropWindow {
            left: 0,
            right: 8,
            top: 0,
            bottom: 6
        }
    );
    let pushed = controller.session().crops().len();

    // Too small to shrink, but the re-centring pans moved and pushed the crop
    assert!(controller.zoom_out().unwrap());
    let centred = CropWindow {
        left: 4,
        right: 4,
        top: 3,
        bottom: 3,
    };
    assert_eq!(controller.current_camera().view.crop(), centred);
    assert_eq!(controller.session().crops().len(), pushed + 2);
    assert_eq!(controller.session().crops().last(), Some(&centred));

    // Now centred and minimal: a genuine rejection pushes nothing
    assert!(!controller.zoom_out().unwrap());
    assert_eq!(controller.session().crops().len(), pushed + 2);
}

#[test]
fn test_zoom_out_at_minimum_is_noop() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    controller.zoom_in().unwrap();
    let before = controller.current_camera().view.crop();
    assert!(!controller.zoom_out().unwrap());
    assert!(!controller.zoom_out().unwrap());
    assert_eq!(controller.current_camera().view.crop(), before);
}

#[test]
fn test_pan_left_then_right_restores_crop() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for _ in 0..5 {
        controller.zoom_in().unwrap();
    }
    controller.pan_up().unwrap();
    let before = controller.current_camera().view.crop();
    assert!(controller.pan_left().unwrap());
    assert!(controller.pan_right().unwrap());
    assert_eq!(controller.current_camera().view.crop(), before);
    assert!(controller.pan_down().unwrap());
    assert!(controller.pan_up().unwrap());
    assert_eq!(controller.current_camera().view.crop(), before);
}

#[test]
fn test_pan_keeps_zoom_level() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for _ in 0..4 {
        controller.zoom_in().unwrap();
    }
    let before = controller.current_camera().view.crop();
    controller.pan_right().unwrap();
    controller.pan_down().unwrap();
    let after = controller.current_camera().view.crop();
    assert_ne!(after, before);
    assert_eq!(after.horizontal(), before.horizontal());
    assert_eq!(after.vertical(), before.vertical());
}

#[test]
fn test_darken_stops_short_of_minus_one() {
    let mut controller = controller(&["A"], PipelineVariant::LightenOnly);
    let mut accepted = 0;
    for _ in 0..101 {
        if controller.darken().unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 99);
    assert!((controller.brightness() + 0.99).abs() < 1e-9);
    assert!(controller.brightness() > -1.0);

    // Idempotent at the limit
    assert!(!controller.darken().unwrap());
    assert!((controller.brightness() + 0.99).abs() < 1e-9);
}

#[test]
fn test_brightness_stays_in_open_interval() {
    let mut controller = controller(&["A"], PipelineVariant::Full);
    for i in 0..500 {
        if i % 7 < 4 {
            controller.brighten().unwrap();
        } else {
            controller.darken().unwrap();
        }
        let value = controller.brightness();
        assert!(value > -1.0 && value < 1.0, "brightness {}", value);
    }
}

#[test]
fn test_crop_on_lighten_only_is_noop() {
    let mut controller = controller(&["A"], PipelineVariant::LightenOnly);
    assert!(controller.zoom_in().unwrap());
    assert!(controller.session().crops().is_empty());

    assert!(controller.brighten().unwrap());
    assert!(
        controller
            .session()
            .calls
            .iter()
            .any(|c| matches!(c, Call::Brightness(v) if (*v - 0.01).abs() < 1e-9))
    );
}

#[test]
fn test_state_is_per_camera() {
    let mut controller = controller(&["A", "B"], PipelineVariant::Full);
    controller.zoom_in().unwrap();
    controller.brighten().unwrap();
    controller.select_next_camera().unwrap();
    assert!(controller.current_camera().view.is_default());
    assert_eq!(controller.brightness(), 0.0);
    controller.select_next_camera().unwrap();
    assert_eq!(controller.current_camera().view.crop().horizontal(), 8);
    assert!((controller.brightness() - 0.01).abs() < 1e-9);
}

#[test]
fn test_saved_view_restored_on_switch() {
    let mut controller = controller(&["A", "B"], PipelineVariant::Full);
    controller.zoom_in().unwrap();
    controller.select_next_camera().unwrap();
    controller.select_next_camera().unwrap();
    let calls = &controller.session().calls;
    let tail = &calls[calls.len() - 4..];
    assert_eq!(tail[0], Call::Start("A".to_string(), PipelineVariant::Full));
    assert_eq!(tail[1], Call::Crop(controller.current_camera().view.crop()));
    assert_eq!(tail[2], Call::Brightness(0.0));
    assert_eq!(tail[3], Call::Play);
}

#[test]
fn test_reset_view_on_switch_when_disabled() {
    let mut controller = CameraController::new(
        ["A", "B"],
        RecordingSession::default(),
        ControllerOptions {
            variant: PipelineVariant::Full,
            restore_view_on_switch: false,
            ..ControllerOptions::default()
        },
    )
    .unwrap();
    controller.start().unwrap();
    controller.zoom_in().unwrap();
    controller.select_next_camera().unwrap();
    controller.select_next_camera().unwrap();
    assert_eq!(controller.session().crops().len(), 1);
    // Saved state is kept even though it was not pushed
    assert_eq!(controller.current_camera().view.crop().horizontal(), 8);
}

#[test]
fn test_rebind_strategy_keeps_graph() {
    let mut controller = CameraController::new(
        ["A", "B"],
        RecordingSession::default(),
        ControllerOptions {
            switch_strategy: SwitchStrategy::Rebind,
            ..ControllerOptions::default()
        },
    )
    .unwrap();
    controller.start().unwrap();
    controller.select_next_camera().unwrap();
    assert_eq!(
        controller.session().calls[2..],
        [Call::Pause, Call::Rebind("B".to_string()), Call::Play]
    );
    assert_eq!(controller.session().started_addresses(), vec!["A"]);
}

#[test]
fn test_toggle_pause() {
    let mut controller = controller(&["A"], PipelineVariant::Simple);
    controller.toggle_pause().unwrap();
    assert_eq!(controller.playback_state(), PlaybackState::Paused);
    controller.toggle_pause().unwrap();
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
}

#[test]
fn test_toggle_pause_before_start_fails() {
    let mut controller = CameraController::new(
        ["A"],
        RecordingSession::default(),
        ControllerOptions::default(),
    )
    .unwrap();
    assert!(matches!(
        controller.toggle_pause(),
        Err(SessionError::InvalidTransition { .. })
    ));
}

#[test]
fn test_toggle_fullscreen_forwards_flag() {
    let mut controller = controller(&["A"], PipelineVariant::Simple);
    assert!(controller.is_fullscreen());
    assert!(!controller.toggle_fullscreen());
    assert!(controller.toggle_fullscreen());
    let flags: Vec<_> = controller
        .session()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Fullscreen(f) => Some(*f),
            _ => None,
        })
        .collect();
    assert_eq!(flags, vec![false, true]);
}

#[test]
fn test_window_commands_forwarded_once() {
    let session = RecordingSession {
        window_keys: vec![Command::ZoomIn, Command::NextCamera],
        ..RecordingSession::default()
    };
    let mut controller =
        CameraController::new(["A", "B"], session, options(PipelineVariant::Full)).unwrap();
    assert_eq!(
        controller.take_window_commands(),
        vec![Command::ZoomIn, Command::NextCamera]
    );
    assert!(controller.take_window_commands().is_empty());
}

#[test]
fn test_fullscreen_support_reported() {
    let controller = controller(&["A"], PipelineVariant::Simple);
    assert!(controller.fullscreen_supported());

    let session = RecordingSession {
        windowed_only: true,
        ..RecordingSession::default()
    };
    let controller =
        CameraController::new(["A"], session, options(PipelineVariant::Simple)).unwrap();
    assert!(controller.is_fullscreen());
    assert!(!controller.fullscreen_supported());
}

#[test]
fn test_restart_after_fatal_error() {
    let session = RecordingSession {
        pending_failure: Some(SessionError::LinkFailed("recv_rtp_src_0: refused".to_string())),
        ..RecordingSession::default()
    };
    let mut controller =
        CameraController::new(["A"], session, options(PipelineVariant::Full)).unwrap();
    controller.start().unwrap();
    controller.zoom_in().unwrap();

    let err = controller.poll().unwrap_err();
    assert!(err.is_fatal());

    controller.restart().unwrap();
    assert!(controller.poll().is_ok());
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
    assert_eq!(controller.session().started_addresses(), vec!["A", "A"]);
    // Restart always re-applies the camera's view
    assert_eq!(
        controller.session().crops().last(),
        Some(&controller.current_camera().view.crop())
    );
}

#[test]
fn test_shutdown_returns_session_to_idle() {
    let mut controller = controller(&["A"], PipelineVariant::Simple);
    controller.shutdown().unwrap();
    assert_eq!(controller.playback_state(), PlaybackState::Idle);
}
