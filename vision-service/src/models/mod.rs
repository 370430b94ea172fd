//! Records persisted by the analysis store.

pub mod analysis;
pub mod image;

pub use analysis::{AnalysisRecord, NewAnalysis, ANALYSIS_STATUS_COMPLETED};
pub use image::{ImageRecord, ImageStatus, ImageWithAnalysis, NewImage};
