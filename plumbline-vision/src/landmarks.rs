use std::collections::BTreeMap;

use anyhow::Result;
use image::DynamicImage;
use serde::Serialize;

/// Pose landmark vocabulary (33 points, BlazePose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseLandmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

pub const LANDMARK_COUNT: usize = 33;

const ALL: [PoseLandmark; LANDMARK_COUNT] = [
    PoseLandmark::Nose,
    PoseLandmark::LeftEyeInner,
    PoseLandmark::LeftEye,
    PoseLandmark::LeftEyeOuter,
    PoseLandmark::RightEyeInner,
    PoseLandmark::RightEye,
    PoseLandmark::RightEyeOuter,
    PoseLandmark::LeftEar,
    PoseLandmark::RightEar,
    PoseLandmark::MouthLeft,
    PoseLandmark::MouthRight,
    PoseLandmark::LeftShoulder,
    PoseLandmark::RightShoulder,
    PoseLandmark::LeftElbow,
    PoseLandmark::RightElbow,
    PoseLandmark::LeftWrist,
    PoseLandmark::RightWrist,
    PoseLandmark::LeftPinky,
    PoseLandmark::RightPinky,
    PoseLandmark::LeftIndex,
    PoseLandmark::RightIndex,
    PoseLandmark::LeftThumb,
    PoseLandmark::RightThumb,
    PoseLandmark::LeftHip,
    PoseLandmark::RightHip,
    PoseLandmark::LeftKnee,
    PoseLandmark::RightKnee,
    PoseLandmark::LeftAnkle,
    PoseLandmark::RightAnkle,
    PoseLandmark::LeftHeel,
    PoseLandmark::RightHeel,
    PoseLandmark::LeftFootIndex,
    PoseLandmark::RightFootIndex,
];

/// Landmarks the plumb-line analysis cannot run without
pub const REQUIRED: [PoseLandmark; 5] = [
    PoseLandmark::LeftAnkle,
    PoseLandmark::LeftEar,
    PoseLandmark::LeftShoulder,
    PoseLandmark::LeftHip,
    PoseLandmark::LeftKnee,
];

impl PoseLandmark {
    pub fn from_index(index: usize) -> Option<Self> {
        ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn all() -> &'static [PoseLandmark; LANDMARK_COUNT] {
        &ALL
    }
}

/// Pixel-space landmark positions for a single image.
///
/// An empty set means the detector found no person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LandmarkSet {
    points: BTreeMap<PoseLandmark, (u32, u32)>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert normalized `[0,1]` coordinates to pixels the way the pose
    /// model's consumers do: truncate `v * dim`, then clamp into the image.
    pub fn from_normalized(
        normalized: impl IntoIterator<Item = (PoseLandmark, f32, f32)>,
        width: u32,
        height: u32,
    ) -> Self {
        let points = normalized
            .into_iter()
            .map(|(lm, x, y)| (lm, (to_pixel(x, width), to_pixel(y, height))))
            .collect();
        Self { points }
    }

    pub fn with(mut self, landmark: PoseLandmark, x: u32, y: u32) -> Self {
        self.insert(landmark, x, y);
        self
    }

    pub fn insert(&mut self, landmark: PoseLandmark, x: u32, y: u32) {
        self.points.insert(landmark, (x, y));
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<(u32, u32)> {
        self.points.get(&landmark).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// First required landmark absent from the set, if any
    pub fn first_missing(&self) -> Option<PoseLandmark> {
        REQUIRED.iter().copied().find(|lm| !self.points.contains_key(lm))
    }

    pub fn has_required(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoseLandmark, (u32, u32))> + '_ {
        self.points.iter().map(|(lm, p)| (*lm, *p))
    }
}

fn to_pixel(v: f32, dim: u32) -> u32 {
    if dim == 0 || !v.is_finite() {
        return 0;
    }
    let px = (v * dim as f32).trunc();
    px.max(0.0).min((dim - 1) as f32) as u32
}

/// Anything that can turn an image into pose landmarks.
///
/// Implementations are built once and handed to callers by reference.
pub trait LandmarkSource {
    fn detect(&mut self, img: &DynamicImage) -> Result<LandmarkSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        assert_eq!(PoseLandmark::from_index(7), Some(PoseLandmark::LeftEar));
        assert_eq!(PoseLandmark::from_index(27), Some(PoseLandmark::LeftAnkle));
        assert_eq!(PoseLandmark::LeftKnee.index(), 25);
        assert_eq!(PoseLandmark::from_index(33), None);
    }

    #[test]
    fn test_from_normalized_truncates_and_clamps() {
        let set = LandmarkSet::from_normalized(
            [
                (PoseLandmark::Nose, 0.5, 0.25),
                (PoseLandmark::LeftEar, -0.1, 1.3),
                (PoseLandmark::LeftHip, 0.999, 0.0),
            ],
            200,
            400,
        );
        assert_eq!(set.get(PoseLandmark::Nose), Some((100, 100)));
        assert_eq!(set.get(PoseLandmark::LeftEar), Some((0, 399)));
        assert_eq!(set.get(PoseLandmark::LeftHip), Some((199, 0)));
    }

    #[test]
    fn test_first_missing() {
        let set = LandmarkSet::new()
            .with(PoseLandmark::LeftAnkle, 100, 500)
            .with(PoseLandmark::LeftEar, 100, 50)
            .with(PoseLandmark::LeftShoulder, 100, 120);
        assert_eq!(set.first_missing(), Some(PoseLandmark::LeftHip));
        assert!(!set.has_required());
        assert_eq!(LandmarkSet::new().first_missing(), Some(PoseLandmark::LeftAnkle));
    }
}
