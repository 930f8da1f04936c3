//! Error taxonomy for the analysis pipeline.
//!
//! Input-quality variants are routing signals: the analyzer turns them into a
//! fallback path instead of returning them. Only malformed landmark structure
//! and provider failures reach the caller.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no face landmarks detected")]
    NoLandmarksDetected,

    #[error("degenerate measurement: {quantity} = {value:.3}")]
    DegenerateMeasurement { quantity: &'static str, value: f32 },

    #[error("implausible ratio: cheekbone width {cheekbone:.1}px inconsistent with reference width {reference:.1}px")]
    ImplausibleRatio { cheekbone: f32, reference: f32 },

    #[error("no samplable skin region inside the image")]
    NoSamplableRegion,

    #[error("malformed landmark set: {0}")]
    MalformedLandmarks(String),

    #[error("landmark provider error: {0}")]
    Provider(String),
}

impl AnalysisError {
    /// Whether the shape pipeline should degrade to the fallback estimator.
    pub fn routes_to_fallback(&self) -> bool {
        matches!(
            self,
            Self::NoLandmarksDetected
                | Self::DegenerateMeasurement { .. }
                | Self::ImplausibleRatio { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
