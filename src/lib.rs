pub mod assessment;
pub mod config;
pub mod interpret;
pub mod storage;

// Re-export vision types for convenience
pub use plumbline_vision::{
    plumb, AnalysisError, BodyPart, DeviationMap, LandmarkSet, LandmarkSource, PlumbLine,
    PoseDetector, PoseLandmark,
};
