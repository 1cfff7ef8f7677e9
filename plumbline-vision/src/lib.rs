pub mod blazepose;
pub mod landmarks;
pub mod model;
pub mod plumb;
pub mod pose;

// Re-export commonly used types
pub use landmarks::{LandmarkSet, LandmarkSource, PoseLandmark};
pub use plumb::{AnalysisError, BodyPart, DeviationMap, PlumbLine};
pub use pose::PoseDetector;
