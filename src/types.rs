use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;

/// Number of points in a hand skeleton.
pub const HAND_POINTS: usize = 21;

/// Number of points in a refined face mesh (468 mesh + 10 iris).
pub const FACE_POINTS: usize = 478;

/// A single landmark, x/y normalized to the frame, z relative depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, depth ignored.
    pub fn distance_2d(&self, other: &LandmarkPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Face mesh for the single tracked face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn point(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Hand skeleton for the single tracked hand. Always 21 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkPoint>", into = "Vec<LandmarkPoint>")]
pub struct HandLandmarks {
    points: [LandmarkPoint; HAND_POINTS],
}

impl HandLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self, LandmarkError> {
        let got = points.len();
        let points: [LandmarkPoint; HAND_POINTS] =
            points.try_into().map_err(|_| LandmarkError::MalformedHand {
                expected: HAND_POINTS,
                got,
            })?;
        Ok(Self { points })
    }

    pub fn from_array(points: [LandmarkPoint; HAND_POINTS]) -> Self {
        Self { points }
    }

    /// Panics if `index >= 21`; callers use the joint constants in `gesture`.
    pub fn point(&self, index: usize) -> &LandmarkPoint {
        &self.points[index]
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }
}

impl TryFrom<Vec<LandmarkPoint>> for HandLandmarks {
    type Error = LandmarkError;

    fn try_from(points: Vec<LandmarkPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<HandLandmarks> for Vec<LandmarkPoint> {
    fn from(hand: HandLandmarks) -> Self {
        hand.points.to_vec()
    }
}

/// What the landmark source saw in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub face: Option<FaceLandmarks>,
    #[serde(default)]
    pub hand: Option<HandLandmarks>,
}

impl Detection {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Integer screen-space position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2, self.height / 2)
    }
}

/// Which eye the blink detector watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

/// Discrete hand gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    OpenPalm,
    Victory,
    ThumbsUp,
    Fist,
    None,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "OPEN_PALM",
            Self::Victory => "VICTORY",
            Self::ThumbsUp => "THUMBS_UP",
            Self::Fist => "FIST",
            Self::None => "NONE",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action line shown under the frame. Last writer in a frame wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    Idle,
    BlinkClick,
    OpeningBrowser,
    Scrolling,
    PlayPause,
    EmergencyStop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::BlinkClick => "Blink Click",
            Self::OpeningBrowser => "Opening Browser",
            Self::Scrolling => "Scrolling",
            Self::PlayPause => "Play / Pause",
            Self::EmergencyStop => "Emergency Stop",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_requires_21_points() {
        let err = HandLandmarks::new(vec![LandmarkPoint::default(); 20]).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::MalformedHand {
                expected: 21,
                got: 20
            }
        );
        assert!(HandLandmarks::new(vec![LandmarkPoint::default(); 21]).is_ok());
    }

    #[test]
    fn detection_parses_with_missing_parts() {
        let d: Detection = serde_json::from_str(r#"{"face": [{"x": 0.5, "y": 0.4}]}"#).unwrap();
        assert_eq!(d.face.as_ref().map(|f| f.len()), Some(1));
        assert!(d.hand.is_none());

        let bad = serde_json::from_str::<Detection>(r#"{"hand": [{"x": 0.5, "y": 0.4}]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn face_lookup_out_of_range_is_absent() {
        let face = FaceLandmarks::new(vec![LandmarkPoint::default(); 468]);
        assert!(face.point(473).is_none());
        assert!(face.point(0).is_some());
    }
}
