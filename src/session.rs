use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::actuator::Actuator;
use crate::blink::{BlinkDetector, EyeContour};
use crate::camera::FrameSource;
use crate::config::AppConfig;
use crate::cooldown::CooldownTimer;
use crate::dispatch::ActionDispatcher;
use crate::error::ActuatorError;
use crate::gaze::{CursorSmoother, GazeEstimator};
use crate::gesture::classify_hand;
use crate::output::FrameSink;
use crate::pipeline::LandmarkSource;
use crate::types::{Action, Detection, GestureLabel, ScreenPoint, ScreenSize};

/// Why a session ended. The first reason recorded wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    UserStop,
    EmergencyGesture,
    CaptureEnded,
    CaptureFailed(String),
    DetectorFailed(String),
    DisplayFailed(String),
    FrameLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserStop => write!(f, "user stop"),
            Self::EmergencyGesture => write!(f, "emergency gesture"),
            Self::CaptureEnded => write!(f, "capture ended"),
            Self::CaptureFailed(e) => write!(f, "capture failed: {}", e),
            Self::DetectorFailed(e) => write!(f, "detector failed: {}", e),
            Self::DisplayFailed(e) => write!(f, "display failed: {}", e),
            Self::FrameLimit => write!(f, "frame limit reached"),
        }
    }
}

/// Runtime requests coming back from the frame sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    ToggleCursor,
    ToggleClick,
    ToggleGestures,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStatus {
    Tracking,
    Off,
    NoFace,
}

impl CursorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracking => "TRACKING",
            Self::Off => "OFF",
            Self::NoFace => "NO FACE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkStatus {
    Detected,
    Waiting,
    Off,
}

impl BlinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "DETECTED",
            Self::Waiting => "WAITING",
            Self::Off => "OFF",
        }
    }
}

/// Which branches run. Toggled at runtime, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub cursor: bool,
    pub click: bool,
    pub gestures: bool,
}

/// Everything the display needs about one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub cursor: CursorStatus,
    pub blink: BlinkStatus,
    /// Fired label, `None` when nothing fired this frame.
    pub gesture: GestureLabel,
    pub action: Action,
    pub blink_ratio: Option<f32>,
    pub cursor_position: Option<ScreenPoint>,
}

impl FrameReport {
    fn idle(toggles: Toggles) -> Self {
        Self {
            cursor: if toggles.cursor { CursorStatus::NoFace } else { CursorStatus::Off },
            blink: if toggles.click { BlinkStatus::Waiting } else { BlinkStatus::Off },
            gesture: GestureLabel::None,
            action: Action::Idle,
            blink_ratio: None,
            cursor_position: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_with_face: u64,
    pub frames_with_hand: u64,
    pub clicks: u64,
    pub gestures: BTreeMap<&'static str, u64>,
}

/// Per-run state threaded through every frame step.
pub struct Session {
    estimator: GazeEstimator,
    smoother: CursorSmoother,
    blink: BlinkDetector,
    click_cooldown: CooldownTimer,
    dispatcher: ActionDispatcher,
    iris_index: usize,
    move_duration: Duration,
    toggles: Toggles,
    camera_active: bool,
    stop_reason: Option<StopReason>,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: &AppConfig, screen: ScreenSize) -> Self {
        let t = &config.tracking;
        Self {
            estimator: GazeEstimator::from_config(t),
            smoother: CursorSmoother::new(screen, t.smoothing, t.edge_margin),
            blink: BlinkDetector::new(EyeContour::for_eye(config.blink.eye), config.blink.threshold),
            click_cooldown: CooldownTimer::new(config.blink.cooldown_s),
            dispatcher: ActionDispatcher::new(config.gestures.clone()),
            iris_index: t.iris_index,
            move_duration: Duration::from_millis(t.move_duration_ms),
            toggles: Toggles {
                cursor: t.enable_cursor,
                click: t.enable_click,
                gestures: t.enable_gestures,
            },
            camera_active: true,
            stop_reason: None,
            stats: SessionStats::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.camera_active
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.smoother.current()
    }

    pub fn blink_contour(&self) -> &EyeContour {
        self.blink.contour()
    }

    pub fn iris_index(&self) -> usize {
        self.iris_index
    }

    pub fn stop(&mut self, reason: StopReason) {
        if self.camera_active {
            info!("Stopping: {}", reason);
            self.camera_active = false;
            self.stop_reason = Some(reason);
        }
    }

    pub fn apply(&mut self, input: UserInput) {
        match input {
            UserInput::ToggleCursor => {
                self.toggles.cursor = !self.toggles.cursor;
                info!("Cursor tracking: {}", on_off(self.toggles.cursor));
            }
            UserInput::ToggleClick => {
                self.toggles.click = !self.toggles.click;
                info!("Blink click: {}", on_off(self.toggles.click));
            }
            UserInput::ToggleGestures => {
                self.toggles.gestures = !self.toggles.gestures;
                info!("Hand gestures: {}", on_off(self.toggles.gestures));
            }
            UserInput::Stop => self.stop(StopReason::UserStop),
        }
    }

    /// One frame: blink, then cursor, then gestures. Actuator failures are
    /// logged and otherwise ignored.
    pub fn process_frame(&mut self, detection: &Detection, now: f64, actuator: &mut dyn Actuator) -> FrameReport {
        let mut report = FrameReport::idle(self.toggles);
        self.stats.frames += 1;

        // -------- EYES --------
        if let Some(face) = &detection.face {
            self.stats.frames_with_face += 1;

            if let Some(reading) = self.blink.read(face) {
                report.blink_ratio = Some(reading.ratio);
                if self.toggles.click && reading.closed {
                    if self.click_cooldown.try_fire(now) {
                        degrade("click", actuator.click());
                        self.stats.clicks += 1;
                        report.blink = BlinkStatus::Detected;
                        report.action = Action::BlinkClick;
                        info!("Blink click (ratio {:.3})", reading.ratio);
                    } else {
                        debug!("Blink ignored, click cooldown");
                    }
                }
            }

            if self.toggles.cursor {
                if let Some(iris) = face.point(self.iris_index) {
                    let target = self.estimator.estimate(iris, self.smoother.screen());
                    let p = self.smoother.step(target);
                    degrade("cursor move", actuator.move_cursor(p.x, p.y, self.move_duration));
                    report.cursor = CursorStatus::Tracking;
                    report.cursor_position = Some(p);
                }
            }
        }

        // -------- HAND --------
        if let Some(hand) = &detection.hand {
            self.stats.frames_with_hand += 1;
            if self.toggles.gestures {
                let label = classify_hand(hand);
                let outcome = self.dispatcher.dispatch(label, now, actuator);
                report.gesture = outcome.fired;
                if let Some(action) = outcome.action {
                    report.action = action;
                    *self.stats.gestures.entry(outcome.fired.as_str()).or_insert(0) += 1;
                }
                if outcome.stop_requested {
                    self.stop(StopReason::EmergencyGesture);
                }
            }
        }

        report
    }

    /// Runs until something stops the session and returns why.
    /// The loop only checks for a stop at the top of each iteration.
    pub fn run(
        &mut self,
        frames: &mut dyn FrameSource,
        landmarks: &mut dyn LandmarkSource,
        actuator: &mut dyn Actuator,
        sink: &mut dyn FrameSink,
        max_frames: Option<u64>,
    ) -> StopReason {
        while self.camera_active {
            if max_frames.is_some_and(|max| self.stats.frames >= max) {
                self.stop(StopReason::FrameLimit);
                break;
            }

            let frame = match frames.capture() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.stop(StopReason::CaptureEnded);
                    break;
                }
                Err(e) => {
                    self.stop(StopReason::CaptureFailed(format!("{:#}", e)));
                    break;
                }
            };

            let detection = match landmarks.detect(&frame) {
                Ok(d) => d,
                Err(e) => {
                    self.stop(StopReason::DetectorFailed(format!("{:#}", e)));
                    break;
                }
            };

            let report = self.process_frame(&detection, frame.timestamp, actuator);

            match sink.present(&frame, &detection, &report) {
                Ok(inputs) => {
                    for input in inputs {
                        self.apply(input);
                    }
                }
                Err(e) => self.stop(StopReason::DisplayFailed(format!("{:#}", e))),
            }
        }

        self.stop_reason.clone().unwrap_or(StopReason::UserStop)
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "ON"
    } else {
        "OFF"
    }
}

fn degrade(what: &str, result: Result<(), ActuatorError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_unsupported() => debug!("{} skipped: {}", what, e),
        Err(e) => warn!("{} failed: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorCall, DryRunActuator};
    use crate::gesture::FingerStates;
    use crate::synth::{hand_with, FaceBuilder};

    fn session() -> Session {
        Session::new(&AppConfig::default(), ScreenSize::new(1920, 1080))
    }

    fn face(iris: (f32, f32), openness: f32) -> Detection {
        Detection {
            face: Some(FaceBuilder::new().iris(iris.0, iris.1).eye_openness(openness).build()),
            hand: None,
        }
    }

    #[test]
    fn reference_frame_moves_cursor() {
        let mut s = session();
        let mut a = DryRunActuator::new(None);
        let report = s.process_frame(&face((0.50, 0.48), 0.35), 0.0, &mut a);
        assert_eq!(report.cursor, CursorStatus::Tracking);
        assert_eq!(report.cursor_position, Some(ScreenPoint::new(1248, 702)));
        assert_eq!(a.calls, vec![ActuatorCall::Move { x: 1248, y: 702 }]);
        assert_eq!(report.blink, BlinkStatus::Waiting);
        assert_eq!(report.action, Action::Idle);
    }

    #[test]
    fn no_face_leaves_cursor_alone() {
        let mut s = session();
        let mut a = DryRunActuator::new(None);
        let report = s.process_frame(&Detection::empty(), 0.0, &mut a);
        assert_eq!(report.cursor, CursorStatus::NoFace);
        assert_eq!(s.cursor(), ScreenPoint::new(960, 540));
        assert!(a.calls.is_empty());
    }

    #[test]
    fn disabled_branches_report_off() {
        let mut s = session();
        s.apply(UserInput::ToggleCursor);
        s.apply(UserInput::ToggleClick);
        let mut a = DryRunActuator::new(None);
        let report = s.process_frame(&face((0.5, 0.48), 0.05), 0.0, &mut a);
        assert_eq!(report.cursor, CursorStatus::Off);
        assert_eq!(report.blink, BlinkStatus::Off);
        assert!(report.blink_ratio.is_some());
        assert!(a.calls.is_empty());
    }

    #[test]
    fn blink_then_gesture_last_action_wins() {
        let mut s = session();
        let mut a = DryRunActuator::new(None);
        let mut d = face((0.5, 0.48), 0.05);
        d.hand = Some(hand_with(FingerStates::from_bits([1, 0, 0, 0, 0])));
        let report = s.process_frame(&d, 1.0, &mut a);
        assert_eq!(report.blink, BlinkStatus::Detected);
        assert_eq!(report.gesture, GestureLabel::ThumbsUp);
        assert_eq!(report.action, Action::PlayPause);
        assert_eq!(a.calls[0], ActuatorCall::Click);
    }

    #[test]
    fn stop_keeps_first_reason() {
        let mut s = session();
        s.stop(StopReason::EmergencyGesture);
        s.apply(UserInput::Stop);
        assert!(!s.is_active());
        assert_eq!(s.stop_reason(), Some(&StopReason::EmergencyGesture));
    }
}
