use anyhow::Result;

use crate::camera::Frame;
use crate::gesture::FingerStates;
use crate::synth::{hand_with, FaceBuilder};
use crate::types::Detection;

/// Produces face and hand landmarks for a frame.
pub trait LandmarkSource {
    fn name(&self) -> String;
    fn detect(&mut self, frame: &Frame) -> Result<Detection>;
}

impl<L: LandmarkSource + ?Sized> LandmarkSource for Box<L> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        (**self).detect(frame)
    }
}

/// Hand poses the simulated source cycles through, one per slot.
const GESTURE_CYCLE: [Option<[u8; 5]>; 6] = [
    None,
    Some([0, 1, 1, 0, 0]), // victory
    None,
    Some([1, 0, 0, 0, 0]), // thumbs up
    None,
    Some([1, 1, 1, 1, 1]), // open palm
];

/// Landmarks without a detector: the iris sweeps a circle, the eyes close
/// briefly every few seconds and a hand cycles through gestures.
///
/// Driven by the frame timestamp so replays of the same clock agree.
pub struct SimulatedSource {
    pub blink_period_s: f64,
    pub blink_length_s: f64,
    pub gesture_slot_s: f64,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            blink_period_s: 3.0,
            blink_length_s: 0.15,
            gesture_slot_s: 2.0,
        }
    }

    pub fn detection_at(&self, t: f64) -> Detection {
        // Slow rotation around the middle of the calibration window
        let phase = (t * 0.8) as f32;
        let iris_x = 0.50 + phase.cos() * 0.05;
        let iris_y = 0.48 + phase.sin() * 0.03;

        let closed = t.rem_euclid(self.blink_period_s) < self.blink_length_s;
        let face = FaceBuilder::new()
            .iris(iris_x, iris_y)
            .eye_openness(if closed { 0.08 } else { 0.32 })
            .build();

        let slot = (t / self.gesture_slot_s).floor().max(0.0) as usize % GESTURE_CYCLE.len();
        let hand = GESTURE_CYCLE[slot].map(|bits| hand_with(FingerStates::from_bits(bits)));

        Detection {
            face: Some(face),
            hand,
        }
    }
}

impl LandmarkSource for SimulatedSource {
    fn name(&self) -> String {
        "Simulated landmarks".to_string()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        Ok(self.detection_at(frame.timestamp))
    }
}
