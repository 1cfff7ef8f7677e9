use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, RgbImage};
use ndarray::Array4;
use ort::{session::Session, value::Value};

use crate::blazepose;
use crate::landmarks::{LandmarkSet, LandmarkSource, PoseLandmark};

pub const DEFAULT_INPUT_SIZE: u32 = 256;
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;

/// Placement of the original image on the square model canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub size: u32,
    pub scale: f32,
    pub new_width: u32,
    pub new_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Letterbox {
    pub fn new(orig_width: u32, orig_height: u32, size: u32) -> Self {
        let max_dim = orig_width.max(orig_height).max(1);
        let scale = size as f32 / max_dim as f32;
        let new_width = ((orig_width as f32 * scale) as u32).min(size);
        let new_height = ((orig_height as f32 * scale) as u32).min(size);
        Self {
            size,
            scale,
            new_width,
            new_height,
            offset_x: (size - new_width) / 2,
            offset_y: (size - new_height) / 2,
        }
    }

    /// Map a canvas-normalized point back to original-image pixels
    pub fn to_original(&self, nx: f32, ny: f32) -> (f32, f32) {
        let px = nx * self.size as f32;
        let py = ny * self.size as f32;
        (
            (px - self.offset_x as f32) / self.scale,
            (py - self.offset_y as f32) / self.scale,
        )
    }
}

/// Pad `img` to a square canvas without distortion
pub fn letterbox(img: &DynamicImage, size: u32) -> (RgbImage, Letterbox) {
    let (orig_width, orig_height) = img.dimensions();
    let placement = Letterbox::new(orig_width, orig_height, size);

    let resized = img.resize_exact(
        placement.new_width.max(1),
        placement.new_height.max(1),
        image::imageops::FilterType::Triangle,
    );
    let mut canvas = DynamicImage::new_rgb8(size, size);
    image::imageops::overlay(
        &mut canvas,
        &resized,
        placement.offset_x as i64,
        placement.offset_y as i64,
    );

    (canvas.to_rgb8(), placement)
}

/// Run the landmark model over `img`.
///
/// Single stage: the landmark model sees the whole letterboxed frame. There
/// is no person-detector pass producing a rotated, person-centred crop first,
/// so accuracy drops when the subject fills little of the frame or is tilted.
///
/// Returns an empty set when the pose presence score is below
/// `min_confidence`; otherwise the 33 landmarks in original-image pixels.
pub fn detect_pose(
    session: &mut Session,
    img: &DynamicImage,
    input_size: u32,
    min_confidence: f32,
) -> Result<LandmarkSet> {
    let (width, height) = img.dimensions();
    let (canvas, placement) = letterbox(img, input_size);
    log::debug!(
        "letterbox {}x{} -> {} (scale {:.4}, offset {},{})",
        width,
        height,
        input_size,
        placement.scale,
        placement.offset_x,
        placement.offset_y
    );

    // NHWC, RGB in [0, 1]
    let input_data: Vec<f32> = canvas.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    let input_array = Array4::from_shape_vec(
        (1, input_size as usize, input_size as usize, 3),
        input_data,
    )?;
    let input_tensor = Value::from_array(input_array)?;

    let outputs = session.run(ort::inputs![input_tensor])?;

    let mut output_data: Vec<(Vec<i64>, Vec<f32>)> = Vec::new();
    for (name, output) in outputs.iter() {
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .with_context(|| format!("extracting output {}", name))?;
        let shape_vec: Vec<i64> = shape.iter().copied().collect();
        log::debug!("output {}: {:?}", name, shape_vec);
        output_data.push((shape_vec, data.to_vec()));
    }
    let output_refs: Vec<(&[i64], &[f32])> = output_data
        .iter()
        .map(|(s, d)| (s.as_slice(), d.as_slice()))
        .collect();

    let (table, presence_logit) = blazepose::parse_pose_outputs(&output_refs)?;
    let presence = blazepose::sigmoid(presence_logit);
    if presence < min_confidence {
        log::debug!("pose presence {:.3} below {:.3}", presence, min_confidence);
        return Ok(LandmarkSet::new());
    }

    let raw = blazepose::decode_landmarks(&table, input_size as usize);
    let normalized = raw.iter().enumerate().filter_map(|(i, lm)| {
        let landmark = PoseLandmark::from_index(i)?;
        let (x, y) = placement.to_original(lm.x, lm.y);
        Some((landmark, x / width as f32, y / height as f32))
    });

    Ok(LandmarkSet::from_normalized(normalized, width, height))
}

/// Landmark source backed by a single ONNX pose session
pub struct PoseDetector {
    pub session: Session,
    pub input_size: u32,
    pub min_confidence: f32,
}

impl PoseDetector {
    pub fn new(model_path: &Path) -> Result<Self> {
        Ok(Self {
            session: crate::model::pose_session(model_path)?,
            input_size: DEFAULT_INPUT_SIZE,
            min_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
        })
    }

    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

impl LandmarkSource for PoseDetector {
    fn detect(&mut self, img: &DynamicImage) -> Result<LandmarkSet> {
        detect_pose(&mut self.session, img, self.input_size, self.min_confidence)
            .context("detecting pose landmarks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_portrait() {
        let lb = Letterbox::new(300, 600, 256);
        assert!((lb.scale - 256.0 / 600.0).abs() < 1e-6);
        assert_eq!(lb.offset_y, 0);
        assert_eq!(lb.offset_x, (256 - 128) / 2);
    }

    #[test]
    fn test_to_original_inverts_placement() {
        let lb = Letterbox::new(300, 600, 256);
        // canvas centre maps to image centre
        let (x, y) = lb.to_original(0.5, 0.5);
        assert!((x - 150.0).abs() < 1.0);
        assert!((y - 300.0).abs() < 1.0);
        // left edge of pasted image maps to x=0
        let (x, _) = lb.to_original(lb.offset_x as f32 / 256.0, 0.0);
        assert!(x.abs() < 1e-3);
    }

    #[test]
    fn test_letterbox_canvas_size() {
        let img = DynamicImage::new_rgb8(120, 60);
        let (canvas, lb) = letterbox(&img, 64);
        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(lb.offset_x, 0);
        assert_eq!(lb.offset_y, 16);
    }
}
