//! Plumb-line measurement and annotation.
//!
//! The plumb line is the vertical through the left ankle. Every tracked
//! body part is measured as a signed horizontal pixel offset from it:
//! positive means the part sits toward the front of the body (larger x),
//! negative toward the back.

use std::fmt;
use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use thiserror::Error;

use crate::landmarks::{LandmarkSet, PoseLandmark};

const PLUMB_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const OFFSET_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PLUMB_WIDTH: i64 = 2;
const MARKER_RADIUS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BodyPart {
    Ear,
    Shoulder,
    Hip,
    Knee,
}

impl BodyPart {
    pub const ALL: [BodyPart; 4] = [BodyPart::Ear, BodyPart::Shoulder, BodyPart::Hip, BodyPart::Knee];

    /// Landmark measured for this part (left-side chain)
    pub fn landmark(self) -> PoseLandmark {
        match self {
            BodyPart::Ear => PoseLandmark::LeftEar,
            BodyPart::Shoulder => PoseLandmark::LeftShoulder,
            BodyPart::Hip => PoseLandmark::LeftHip,
            BodyPart::Knee => PoseLandmark::LeftKnee,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BodyPart::Ear => "Ear",
            BodyPart::Shoulder => "Shoulder",
            BodyPart::Hip => "Hip",
            BodyPart::Knee => "Knee",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed horizontal offsets from the plumb line, one per tracked part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviationMap {
    pub ear: i64,
    pub shoulder: i64,
    pub hip: i64,
    pub knee: i64,
}

impl DeviationMap {
    pub fn get(&self, part: BodyPart) -> i64 {
        match part {
            BodyPart::Ear => self.ear,
            BodyPart::Shoulder => self.shoulder,
            BodyPart::Hip => self.hip,
            BodyPart::Knee => self.knee,
        }
    }

    /// Entries in Ear, Shoulder, Hip, Knee order
    pub fn iter(&self) -> impl Iterator<Item = (BodyPart, i64)> + '_ {
        BodyPart::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no body landmarks detected")]
    EmptyLandmarks,
    #[error("required landmark {0:?} was not detected")]
    MissingLandmark(PoseLandmark),
}

/// Result of measuring one image against its plumb line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlumbLine {
    pub reference_x: u32,
    pub width: u32,
    pub height: u32,
    pub deviations: DeviationMap,
}

/// Measure deviations of ear, shoulder, hip and knee from the ankle line
pub fn analyze(width: u32, height: u32, landmarks: &LandmarkSet) -> Result<PlumbLine, AnalysisError> {
    if landmarks.is_empty() {
        return Err(AnalysisError::EmptyLandmarks);
    }
    if let Some(missing) = landmarks.first_missing() {
        return Err(AnalysisError::MissingLandmark(missing));
    }

    let x_of = |lm: PoseLandmark| -> Result<i64, AnalysisError> {
        landmarks
            .get(lm)
            .map(|(x, _)| x as i64)
            .ok_or(AnalysisError::MissingLandmark(lm))
    };

    let reference_x = x_of(PoseLandmark::LeftAnkle)?;
    let offset = |part: BodyPart| x_of(part.landmark()).map(|x| x - reference_x);

    let deviations = DeviationMap {
        ear: offset(BodyPart::Ear)?,
        shoulder: offset(BodyPart::Shoulder)?,
        hip: offset(BodyPart::Hip)?,
        knee: offset(BodyPart::Knee)?,
    };

    log::debug!(
        "plumb line at x={} ({}x{}): {:?}",
        reference_x,
        width,
        height,
        deviations
    );

    Ok(PlumbLine {
        reference_x: reference_x as u32,
        width,
        height,
        deviations,
    })
}

/// Draw the plumb line, landmark markers and offset segments onto a copy
/// of `img`. Tracked parts missing from `landmarks` are skipped.
pub fn annotate(img: &DynamicImage, plumb: &PlumbLine, landmarks: &LandmarkSet) -> RgbImage {
    let mut out = img.to_rgb8();
    let ref_x = plumb.reference_x as i64;
    let h = out.height() as i64;

    for dx in 0..PLUMB_WIDTH {
        for y in 0..h {
            put_clipped(&mut out, ref_x + dx, y, PLUMB_COLOR);
        }
    }

    for part in BodyPart::ALL {
        let Some((x, y)) = landmarks.get(part.landmark()) else {
            continue;
        };
        let (x, y) = (x as i64, y as i64);

        fill_disc(&mut out, x, y, MARKER_RADIUS, MARKER_COLOR);

        let (from, to) = if x <= ref_x { (x, ref_x) } else { (ref_x, x) };
        for sx in from..=to {
            put_clipped(&mut out, sx, y, OFFSET_COLOR);
        }
    }

    out
}

/// Encode an annotated image as PNG bytes for display
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .context("encoding annotated image")?;
    Ok(buf.into_inner())
}

fn fill_disc(img: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put_clipped(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    img.put_pixel(x as u32, y as u32, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upright(ankle_x: u32, part_x: [u32; 4]) -> LandmarkSet {
        LandmarkSet::new()
            .with(PoseLandmark::LeftAnkle, ankle_x, 380)
            .with(PoseLandmark::LeftEar, part_x[0], 40)
            .with(PoseLandmark::LeftShoulder, part_x[1], 100)
            .with(PoseLandmark::LeftHip, part_x[2], 200)
            .with(PoseLandmark::LeftKnee, part_x[3], 300)
    }

    #[test]
    fn test_signed_deviations() {
        let set = upright(100, [140, 190, 60, 100]);
        let plumb = analyze(300, 400, &set).unwrap();
        assert_eq!(plumb.reference_x, 100);
        assert_eq!(plumb.deviations.ear, 40);
        assert_eq!(plumb.deviations.shoulder, 90);
        assert_eq!(plumb.deviations.hip, -40);
        assert_eq!(plumb.deviations.knee, 0);
    }

    #[test]
    fn test_iter_order() {
        let plumb = analyze(300, 400, &upright(100, [101, 102, 103, 104])).unwrap();
        let parts: Vec<_> = plumb.deviations.iter().collect();
        assert_eq!(
            parts,
            vec![
                (BodyPart::Ear, 1),
                (BodyPart::Shoulder, 2),
                (BodyPart::Hip, 3),
                (BodyPart::Knee, 4)
            ]
        );
    }

    #[test]
    fn test_missing_landmark() {
        let set = LandmarkSet::new()
            .with(PoseLandmark::LeftAnkle, 100, 380)
            .with(PoseLandmark::LeftEar, 100, 40)
            .with(PoseLandmark::LeftShoulder, 100, 100)
            .with(PoseLandmark::LeftHip, 100, 200);
        assert_eq!(
            analyze(300, 400, &set),
            Err(AnalysisError::MissingLandmark(PoseLandmark::LeftKnee))
        );
        assert_eq!(
            analyze(300, 400, &LandmarkSet::new()),
            Err(AnalysisError::EmptyLandmarks)
        );
    }

    #[test]
    fn test_annotate_draws_plumb_and_markers() {
        let img = DynamicImage::new_rgb8(300, 400);
        let set = upright(100, [140, 190, 60, 100]);
        let plumb = analyze(300, 400, &set).unwrap();
        let out = annotate(&img, &plumb, &set);

        assert_eq!(out.dimensions(), (300, 400));
        // plumb line away from any marker row
        assert_eq!(*out.get_pixel(100, 10), PLUMB_COLOR);
        assert_eq!(*out.get_pixel(101, 390), PLUMB_COLOR);
        // offset segment between shoulder marker and plumb line
        assert_eq!(*out.get_pixel(150, 100), OFFSET_COLOR);
        // marker edge, off the segment row
        assert_eq!(*out.get_pixel(190, 104), MARKER_COLOR);
        // untouched background
        assert_eq!(*out.get_pixel(250, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_clips_at_border() {
        let img = DynamicImage::new_rgb8(20, 20);
        let set = upright(19, [0, 2, 19, 19]);
        let plumb = analyze(20, 20, &set).unwrap();
        let before = plumb;
        let out = annotate(&img, &plumb, &set);
        assert_eq!(*out.get_pixel(19, 0), PLUMB_COLOR);
        assert_eq!(plumb, before);
    }

    #[test]
    fn test_encode_png_signature() {
        let img = RgbImage::new(4, 4);
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
