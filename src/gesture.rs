//! Finger-extension gestures from a 21-point hand skeleton.

use crate::types::{GestureLabel, HandLandmarks};

pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
/// Index, middle, ring and pinky tips; each is compared to `tip - 2`.
pub const FINGER_TIPS: [usize; 4] = [8, 12, 16, 20];

/// `[thumb, index, middle, ring, pinky]`, true when extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerStates(pub [bool; 5]);

impl FingerStates {
    /// From a 0/1 vector, e.g. `[0, 1, 1, 0, 0]`.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    pub fn bits(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }

    pub fn thumb(&self) -> bool {
        self.0[0]
    }
}

/// Image coordinates: a smaller y is higher in the frame.
pub fn finger_states(hand: &HandLandmarks) -> FingerStates {
    let mut states = [false; 5];
    states[0] = hand.point(THUMB_TIP).y < hand.point(THUMB_IP).y;
    for (i, tip) in FINGER_TIPS.iter().enumerate() {
        states[i + 1] = hand.point(*tip).y < hand.point(tip - 2).y;
    }
    FingerStates(states)
}

/// Exact-match table, first hit wins.
pub fn classify(fingers: FingerStates) -> GestureLabel {
    match fingers.bits() {
        [1, 1, 1, 1, 1] => GestureLabel::OpenPalm,
        [0, 1, 1, 0, 0] | [1, 1, 1, 0, 0] => GestureLabel::Victory,
        [1, 0, 0, 0, 0] => GestureLabel::ThumbsUp,
        [0, 0, 0, 0, 0] => GestureLabel::Fist,
        _ => GestureLabel::None,
    }
}

pub fn classify_hand(hand: &HandLandmarks) -> GestureLabel {
    classify(finger_states(hand))
}
