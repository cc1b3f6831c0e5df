//! Eye-aspect-ratio blink detection.
//!
//! The ratio is the lid gap over the corner-to-corner width of one eye.
//! A closed eye drops well below the open-eye ratio, so a single fixed
//! threshold separates the two at typical webcam distances.

use crate::types::{Eye, FaceLandmarks};

/// Eight face-mesh indices describing one eye. Slots 0/1 are the corners,
/// slots 2/6 the top/bottom lid pair used by the ratio; the other four
/// are only drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeContour(pub [usize; 8]);

pub const LEFT_EYE: EyeContour = EyeContour([33, 133, 160, 144, 158, 153, 145, 154]);
pub const RIGHT_EYE: EyeContour = EyeContour([362, 263, 387, 373, 385, 380, 374, 381]);

impl EyeContour {
    pub fn for_eye(eye: Eye) -> Self {
        match eye {
            Eye::Left => LEFT_EYE,
            Eye::Right => RIGHT_EYE,
        }
    }

    pub fn corners(&self) -> (usize, usize) {
        (self.0[0], self.0[1])
    }

    pub fn lids(&self) -> (usize, usize) {
        (self.0[2], self.0[6])
    }

    pub fn indices(&self) -> &[usize; 8] {
        &self.0
    }
}

/// Returns `None` when the face set is too short for this contour.
/// A zero-width eye yields exactly 0.
pub fn eye_aspect_ratio(face: &FaceLandmarks, contour: &EyeContour) -> Option<f32> {
    let (top, bottom) = contour.lids();
    let (left, right) = contour.corners();

    let vertical = face.point(top)?.distance_2d(face.point(bottom)?);
    let horizontal = face.point(left)?.distance_2d(face.point(right)?);

    if horizontal == 0.0 {
        return Some(0.0);
    }
    Some(vertical / horizontal)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkReading {
    pub ratio: f32,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct BlinkDetector {
    contour: EyeContour,
    threshold: f32,
}

impl BlinkDetector {
    pub fn new(contour: EyeContour, threshold: f32) -> Self {
        Self { contour, threshold }
    }

    pub fn contour(&self) -> &EyeContour {
        &self.contour
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn read(&self, face: &FaceLandmarks) -> Option<BlinkReading> {
        let ratio = eye_aspect_ratio(face, &self.contour)?;
        Some(BlinkReading {
            ratio,
            closed: ratio < self.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::FaceBuilder;
    use crate::types::LandmarkPoint;
    use proptest::prelude::*;

    #[test]
    fn open_eye_is_not_a_blink() {
        let face = FaceBuilder::new().eye_openness(0.35).build();
        let reading = BlinkDetector::new(LEFT_EYE, 0.26).read(&face).unwrap();
        assert!((reading.ratio - 0.35).abs() < 1e-4);
        assert!(!reading.closed);
    }

    #[test]
    fn closed_eye_is_a_blink() {
        let face = FaceBuilder::new().eye_openness(0.1).build();
        let reading = BlinkDetector::new(LEFT_EYE, 0.26).read(&face).unwrap();
        assert!(reading.closed);
    }

    #[test]
    fn right_eye_contour_reads_right_eye() {
        let face = FaceBuilder::new().eye_openness(0.05).build();
        let reading = BlinkDetector::new(RIGHT_EYE, 0.26).read(&face).unwrap();
        assert!(reading.closed);
    }

    #[test]
    fn short_face_set_gives_no_reading() {
        let face = FaceLandmarks::new(vec![LandmarkPoint::default(); 100]);
        assert!(eye_aspect_ratio(&face, &RIGHT_EYE).is_none());
    }

    proptest! {
        #[test]
        fn zero_width_eye_has_zero_ratio(
            cx in 0.0f32..1.0, cy in 0.0f32..1.0,
            tx in 0.0f32..1.0, ty in 0.0f32..1.0,
            bx in 0.0f32..1.0, by in 0.0f32..1.0,
        ) {
            let mut points = vec![LandmarkPoint::default(); 478];
            let corner = LandmarkPoint::new(cx, cy, 0.0);
            points[33] = corner;
            points[133] = corner;
            points[160] = LandmarkPoint::new(tx, ty, 0.0);
            points[145] = LandmarkPoint::new(bx, by, 0.0);
            let ratio = eye_aspect_ratio(&FaceLandmarks::new(points), &LEFT_EYE);
            prop_assert_eq!(ratio, Some(0.0));
        }
    }
}
