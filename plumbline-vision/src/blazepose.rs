//! BlazePose landmark model post-processing
//!
//! The landmark model takes a square RGB crop and produces, among others:
//! - output 0: `[1, N*5]` (or `[1, N, 5]`) landmark rows `(x, y, z, visibility, presence)`
//!   in input-pixel units, with `N >= 33`
//! - output 1: `[1, 1]` pose presence logit
//!
//! Only the first 33 rows belong to the public landmark topology; the
//! remainder are auxiliary alignment points and are dropped here.

use anyhow::Result;
use ndarray::Array2;

use crate::landmarks::LANDMARK_COUNT;

const VALUES_PER_LANDMARK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLandmark {
    pub x: f32, // normalized [0,1] on the input canvas
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
    pub presence: f32,
}

/// Split raw model outputs into the landmark table and the presence logit
pub fn parse_pose_outputs(outputs: &[(&[i64], &[f32])]) -> Result<(Array2<f32>, f32)> {
    let Some((shape, data)) = outputs.first() else {
        anyhow::bail!("Missing landmark output at index 0");
    };

    let total: i64 = shape.iter().product();
    if shape.first() != Some(&1) || total as usize != data.len() {
        anyhow::bail!(
            "Unexpected landmark shape {:?} for {} values",
            shape,
            data.len()
        );
    }
    if data.len() % VALUES_PER_LANDMARK != 0 {
        anyhow::bail!(
            "Landmark tensor length {} is not a multiple of {}",
            data.len(),
            VALUES_PER_LANDMARK
        );
    }
    let rows = data.len() / VALUES_PER_LANDMARK;
    if rows < LANDMARK_COUNT {
        anyhow::bail!(
            "Expected at least {} landmarks, got {}",
            LANDMARK_COUNT,
            rows
        );
    }
    let table = Array2::from_shape_vec((rows, VALUES_PER_LANDMARK), data.to_vec())?;

    let Some((flag_shape, flag_data)) = outputs.get(1) else {
        anyhow::bail!("Missing pose flag output at index 1");
    };
    let presence = match flag_data {
        [v] => *v,
        _ => anyhow::bail!("Unexpected pose flag shape {:?}", flag_shape),
    };

    Ok((table, presence))
}

/// Decode the first 33 landmark rows, normalizing to the input canvas
pub fn decode_landmarks(table: &Array2<f32>, input_size: usize) -> Vec<RawLandmark> {
    let scale = input_size as f32;
    (0..LANDMARK_COUNT.min(table.nrows()))
        .map(|i| RawLandmark {
            x: table[[i, 0]] / scale,
            y: table[[i, 1]] / scale,
            z: table[[i, 2]] / scale,
            visibility: sigmoid(table[[i, 3]]),
            presence: sigmoid(table[[i, 4]]),
        })
        .collect()
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
