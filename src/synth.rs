//! Synthetic landmark sets with controllable iris position, eye openness
//! and finger extension. Used by the simulated source and by tests.

use crate::blink::{LEFT_EYE, RIGHT_EYE};
use crate::gesture::FingerStates;
use crate::types::{FaceLandmarks, HandLandmarks, LandmarkPoint, FACE_POINTS, HAND_POINTS};

const LEFT_IRIS_CENTER: usize = 468;
const RIGHT_IRIS_CENTER: usize = 473;
const EYE_WIDTH: f32 = 0.06;

#[derive(Debug, Clone)]
pub struct FaceBuilder {
    iris: LandmarkPoint,
    openness: f32,
}

impl Default for FaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceBuilder {
    pub fn new() -> Self {
        Self {
            iris: LandmarkPoint::new(0.5, 0.48, 0.0),
            openness: 0.35,
        }
    }

    /// Position of both iris centres.
    pub fn iris(mut self, x: f32, y: f32) -> Self {
        self.iris = LandmarkPoint::new(x, y, 0.0);
        self
    }

    /// Target eye-aspect-ratio for both eyes.
    pub fn eye_openness(mut self, ratio: f32) -> Self {
        self.openness = ratio;
        self
    }

    pub fn build(&self) -> FaceLandmarks {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5, 0.0); FACE_POINTS];

        for (contour, left_x) in [(LEFT_EYE, 0.40f32), (RIGHT_EYE, 0.54f32)] {
            let idx = contour.indices();
            let mid_x = left_x + EYE_WIDTH / 2.0;
            let y = 0.45;
            let half_gap = self.openness * EYE_WIDTH / 2.0;

            points[idx[0]] = LandmarkPoint::new(left_x, y, 0.0);
            points[idx[1]] = LandmarkPoint::new(left_x + EYE_WIDTH, y, 0.0);
            points[idx[2]] = LandmarkPoint::new(mid_x, y - half_gap, 0.0);
            points[idx[6]] = LandmarkPoint::new(mid_x, y + half_gap, 0.0);
            // the remaining contour points sit on the same lids
            for (slot, dx, dy) in [(3, -0.01, half_gap), (4, 0.01, -half_gap), (5, 0.01, half_gap), (7, 0.02, half_gap)] {
                points[idx[slot]] = LandmarkPoint::new(mid_x + dx, y + dy, 0.0);
            }
        }

        points[LEFT_IRIS_CENTER] = self.iris;
        points[RIGHT_IRIS_CENTER] = self.iris;
        FaceLandmarks::new(points)
    }
}

/// Builds a hand whose finger tips sit above or below their reference
/// joints according to `fingers`.
pub fn hand_with(fingers: FingerStates) -> HandLandmarks {
    let mut points = [LandmarkPoint::new(0.5, 0.9, 0.0); HAND_POINTS];

    for (finger, extended) in fingers.0.iter().enumerate() {
        let base = finger * 4;
        let x = 0.40 + finger as f32 * 0.05;
        let ys: [f32; 4] = if *extended {
            [0.8, 0.7, 0.6, 0.5]
        } else {
            [0.8, 0.7, 0.75, 0.78]
        };
        for (joint, y) in ys.iter().enumerate() {
            points[base + joint + 1] = LandmarkPoint::new(x, *y, 0.0);
        }
    }

    HandLandmarks::from_array(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::finger_states;

    #[test]
    fn built_hand_reads_back_its_fingers() {
        for bits in 0u8..32 {
            let mut states = [false; 5];
            for (i, s) in states.iter_mut().enumerate() {
                *s = bits & (1 << i) != 0;
            }
            let hand = hand_with(FingerStates(states));
            assert_eq!(finger_states(&hand), FingerStates(states));
        }
    }

    #[test]
    fn face_has_full_mesh() {
        let face = FaceBuilder::new().iris(0.45, 0.5).build();
        assert_eq!(face.len(), FACE_POINTS);
        assert_eq!(face.point(473).map(|p| p.x), Some(0.45));
    }
}
