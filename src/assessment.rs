use std::path::PathBuf;

use anyhow::{Context, Result};
use image::GenericImageView;
use log::{info, warn};
use plumbline_vision::{plumb, LandmarkSource, PlumbLine};
use serde::Serialize;

use crate::interpret::{self, PostureReport, Side};
use crate::storage::UploadStore;

/// Everything produced for one successfully analyzed image
#[derive(Debug, Clone, Serialize)]
pub struct SideAssessment {
    pub plumb: PlumbLine,
    pub report: PostureReport,
    pub upload: PathBuf,
    #[serde(skip)]
    pub annotated_png: Vec<u8>,
}

/// Per-image result; one side's failure never affects the other
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SideOutcome {
    Analyzed(SideAssessment),
    /// Detector found no person, or not the points the plumb line needs
    NoLandmarks,
    Failed { message: String },
}

impl SideOutcome {
    pub fn assessment(&self) -> Option<&SideAssessment> {
        match self {
            SideOutcome::Analyzed(a) => Some(a),
            _ => None,
        }
    }
}

/// Stage, decode, detect, measure, interpret and annotate a single upload
pub fn assess_side<S, U>(source: &mut S, store: &U, side: Side, bytes: &[u8]) -> SideOutcome
where
    S: LandmarkSource + ?Sized,
    U: UploadStore + ?Sized,
{
    match run_side(source, store, side, bytes) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{} side failed: {:#}", side, e);
            SideOutcome::Failed {
                message: format!("{:#}", e),
            }
        }
    }
}

fn run_side<S, U>(source: &mut S, store: &U, side: Side, bytes: &[u8]) -> Result<SideOutcome>
where
    S: LandmarkSource + ?Sized,
    U: UploadStore + ?Sized,
{
    let upload = store
        .store(side.label(), bytes)
        .context("staging upload")?;
    let img = image::load_from_memory(bytes).context("decoding image")?;
    let (width, height) = img.dimensions();

    let landmarks = source.detect(&img)?;
    if let Some(missing) = landmarks.first_missing() {
        if landmarks.is_empty() {
            warn!("{} side: no body landmarks detected", side);
        } else {
            warn!("{} side: landmark {:?} not detected", side, missing);
        }
        return Ok(SideOutcome::NoLandmarks);
    }

    let plumb_line = plumb::analyze(width, height, &landmarks)?;
    let report = interpret::interpret(&plumb_line.deviations, side);
    info!(
        "{} side: score {:.1} ({})",
        side, report.score, report.condition
    );

    let annotated = plumb::annotate(&img, &plumb_line, &landmarks);
    let annotated_png = plumb::encode_png(&annotated)?;

    Ok(SideOutcome::Analyzed(SideAssessment {
        plumb: plumb_line,
        report,
        upload,
        annotated_png,
    }))
}

/// Process uploads in order, each to completion, collecting every outcome
pub fn assess_all<S, U>(
    source: &mut S,
    store: &U,
    uploads: &[(Side, &[u8])],
) -> Vec<(Side, SideOutcome)>
where
    S: LandmarkSource + ?Sized,
    U: UploadStore + ?Sized,
{
    uploads
        .iter()
        .map(|&(side, bytes)| {
            info!("Analyzing {} side ({} bytes)", side, bytes.len());
            (side, assess_side(&mut *source, store, side, bytes))
        })
        .collect()
}

/// Left view first, then right view
pub fn assess_pair<S, U>(
    source: &mut S,
    store: &U,
    left: &[u8],
    right: &[u8],
) -> Vec<(Side, SideOutcome)>
where
    S: LandmarkSource + ?Sized,
    U: UploadStore + ?Sized,
{
    assess_all(source, store, &[(Side::Left, left), (Side::Right, right)])
}
