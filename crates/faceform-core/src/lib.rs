//! # faceform-core
//!
//! Anatomical ratio face-shape classification for Faceform.
//!
//! This crate provides:
//! - **Measurement extraction**: pixel widths and length from named landmarks
//! - **Ratio normalization**: IPD-normalized measurements and three cross-ratios
//! - **Shape classification**: ordered threshold cascade or prototype scoring
//! - **Fallback estimation**: deterministic proportions when landmarks fail
//! - **Undertone analysis**: warm/cool/neutral from sampled skin color
//!
//! ## Example
//!
//! ```ignore
//! use faceform_core::{AnalysisInput, FaceAnalyzer, ImageDims, LandmarkSet};
//!
//! let analyzer = FaceAnalyzer::new();
//! let landmarks = LandmarkSet::from_mesh(&mesh, true, 1280, 720)?;
//!
//! let input = AnalysisInput::new(ImageDims::new(1280, 720)).with_landmarks(&landmarks);
//! let report = analyzer.analyze(&input)?;
//! println!("{} ({}%)", report.face_shape, report.confidence);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod face_shape;
pub mod fallback;
pub mod landmarks;
pub mod measurements;
pub mod provider;
pub mod ratios;
pub mod skin_tone;

pub use analyzer::{AnalysisInput, AnalysisReport, FaceAnalyzer, MeasurementSource, ShapeAnalysis};
pub use config::{ClassificationStrategy, ConfigError, EngineConfig, FallbackMode};
pub use error::{AnalysisError, Result};
pub use face_shape::{FaceShape, ShapeClassifier, ShapeResult};
pub use fallback::{FaceBox, FallbackEstimator, FallbackReason};
pub use landmarks::{ImageDims, LandmarkPoint, LandmarkSet};
pub use measurements::{extract_measurements, Measurements};
pub use provider::{FixedProvider, LandmarkProvider};
pub use ratios::{normalize, NormalizedMeasurements, RatioTriple};
pub use skin_tone::{RgbFrame, Undertone, UndertoneClassifier, UndertoneResult};

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests_proptest;
