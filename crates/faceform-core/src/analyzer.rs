//! Face Analyzer
//!
//! Runs the shape pipeline (measure, gate, normalize, classify) with the
//! fallback estimator substituted on input-quality failures, runs the
//! undertone classifier alongside it, and aggregates both into one report.

use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::error::{AnalysisError, Result};
use super::face_shape::{FaceShape, ShapeClassifier, ShapeResult};
use super::fallback::{FaceBox, FallbackEstimator, FallbackReason};
use super::landmarks::{ImageDims, LandmarkSet};
use super::measurements::{extract_measurements, Measurements};
use super::provider::LandmarkProvider;
use super::ratios::{normalize, NormalizedMeasurements, RatioTriple};
use super::skin_tone::{RgbFrame, UndertoneClassifier, UndertoneResult};

/// Where the classified measurements came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeasurementSource {
    Landmarks,
    Fallback { reason: FallbackReason },
}

impl MeasurementSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    fn describe(&self) -> String {
        match self {
            Self::Landmarks => "anatomical landmark ratios".to_string(),
            Self::Fallback { reason } => {
                format!("proportional estimate ({})", reason.describe())
            }
        }
    }
}

/// Shape pipeline output with its intermediate values
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAnalysis {
    pub result: ShapeResult,
    pub measurements: Measurements,
    pub normalized: NormalizedMeasurements,
    pub source: MeasurementSource,
}

/// One analysis request
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// `None` means the provider found no face
    pub landmarks: Option<&'a LandmarkSet>,
    pub dims: ImageDims,
    /// Detector face box, used only by the fallback estimator
    pub face_box: Option<FaceBox>,
    /// Pixels for undertone sampling
    pub frame: Option<&'a RgbFrame>,
}

impl<'a> AnalysisInput<'a> {
    pub fn new(dims: ImageDims) -> Self {
        Self {
            landmarks: None,
            dims,
            face_box: None,
            frame: None,
        }
    }

    /// Input whose dimensions are taken from `frame`
    pub fn from_frame(frame: &'a RgbFrame) -> Self {
        Self {
            frame: Some(frame),
            ..Self::new(ImageDims::new(frame.width(), frame.height()))
        }
    }

    pub fn with_landmarks(mut self, landmarks: &'a LandmarkSet) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_face_box(mut self, face_box: FaceBox) -> Self {
        self.face_box = Some(face_box);
        self
    }

    pub fn with_frame(mut self, frame: &'a RgbFrame) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// Aggregated analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub face_shape: FaceShape,
    /// 0-100; shape results stay within [60, 95]
    pub confidence: u8,
    pub reasoning: String,
    /// Pixel measurements, one decimal
    pub measurements: Measurements,
    /// IPD-normalized measurements, three decimals
    pub normalized: NormalizedMeasurements,
    /// Three decimals
    pub ratios: RatioTriple,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub runner_up: Option<(FaceShape, f32)>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub personal_color: Option<UndertoneResult>,
    pub source: MeasurementSource,
    pub details: Vec<String>,
}

impl AnalysisReport {
    fn build(shape: ShapeAnalysis, personal_color: Option<UndertoneResult>) -> Self {
        let ShapeAnalysis {
            result,
            measurements: m,
            normalized: n,
            source,
        } = shape;

        let mut details = vec![
            format!("Face shape: {}", result.shape),
            format!("Reasoning: {}", result.reasoning),
            format!("Confidence: {}%", result.confidence),
            format!("Method: {}", source.describe()),
        ];
        if let Some((label, score)) = result.runner_up {
            details.push(format!("Runner-up: {} (similarity {:.2})", label, score));
        }
        if let Some(color) = &personal_color {
            details.push(format!(
                "Undertone: {} ({}%)",
                color.undertone, color.confidence
            ));
        }

        Self {
            face_shape: result.shape,
            confidence: result.confidence,
            reasoning: result.reasoning,
            measurements: Measurements {
                forehead_width: round_to(m.forehead_width, 1),
                cheekbone_width: round_to(m.cheekbone_width, 1),
                jaw_width: round_to(m.jaw_width, 1),
                face_length: round_to(m.face_length, 1),
                interpupillary_distance: round_to(m.interpupillary_distance, 1),
            },
            normalized: NormalizedMeasurements {
                forehead_width: round_to(n.forehead_width, 3),
                cheekbone_width: round_to(n.cheekbone_width, 3),
                jaw_width: round_to(n.jaw_width, 3),
                face_length: round_to(n.face_length, 3),
            },
            ratios: RatioTriple {
                fc: round_to(result.ratios.fc, 3),
                fw_cw: round_to(result.ratios.fw_cw, 3),
                cw_jw: round_to(result.ratios.cw_jw, 3),
            },
            runner_up: result.runner_up,
            personal_color,
            source,
            details,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

/// Stateless face analyzer; safe to share across requests.
#[derive(Debug, Clone, Default)]
pub struct FaceAnalyzer {
    config: EngineConfig,
    classifier: ShapeClassifier,
    estimator: FallbackEstimator,
    undertone: UndertoneClassifier,
}

impl FaceAnalyzer {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Build from a configuration. Call [`EngineConfig::validate`] first for
    /// configurations read from outside the program.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            classifier: ShapeClassifier::with_config(&config.classifier),
            estimator: FallbackEstimator::new(config.fallback.clone(), config.plausibility.clone()),
            undertone: UndertoneClassifier::new(config.undertone.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify face shape, falling back to proportional estimates when the
    /// landmarks are absent or unusable.
    pub fn analyze_shape(
        &self,
        landmarks: Option<&LandmarkSet>,
        dims: ImageDims,
        face_box: Option<&FaceBox>,
    ) -> Result<ShapeAnalysis> {
        let err = match self.landmark_path(landmarks, dims) {
            Ok(analysis) => return Ok(analysis),
            Err(err) => err,
        };

        let reason = match FallbackReason::from_error(&err) {
            Some(reason) => reason,
            None => return Err(err),
        };
        log::warn!("landmark path abandoned ({}), using fallback estimate", err);

        let measurements = self.estimator.estimate(dims, face_box);
        let (normalized, ratios) = normalize(&measurements)?;
        let note = format!("estimated from image proportions: {}", reason.describe());
        let result = self
            .classifier
            .classify(&ratios, &normalized)
            .penalized(self.config.fallback.confidence_penalty, &note);

        Ok(ShapeAnalysis {
            result,
            measurements,
            normalized,
            source: MeasurementSource::Fallback { reason },
        })
    }

    fn landmark_path(
        &self,
        landmarks: Option<&LandmarkSet>,
        dims: ImageDims,
    ) -> Result<ShapeAnalysis> {
        let landmarks = match landmarks {
            Some(set) if !set.is_empty() => set,
            _ => return Err(AnalysisError::NoLandmarksDetected),
        };

        let measurements = extract_measurements(landmarks, dims);
        measurements.check_plausibility(&self.config.plausibility)?;
        let (normalized, ratios) = normalize(&measurements)?;
        let result = self.classifier.classify(&ratios, &normalized);

        Ok(ShapeAnalysis {
            result,
            measurements,
            normalized,
            source: MeasurementSource::Landmarks,
        })
    }

    /// Undertone for a frame; unsamplable regions yield the default result.
    pub fn analyze_undertone(
        &self,
        frame: &RgbFrame,
        landmarks: Option<&LandmarkSet>,
    ) -> Result<UndertoneResult> {
        let empty = LandmarkSet::new();
        match self.undertone.classify(frame, landmarks.unwrap_or(&empty)) {
            Ok(result) => Ok(result),
            Err(AnalysisError::NoSamplableRegion) => {
                log::warn!("no samplable skin region, using default undertone");
                Ok(UndertoneResult::default_result())
            }
            Err(err) => Err(err),
        }
    }

    /// Full analysis of one request
    pub fn analyze(&self, input: &AnalysisInput<'_>) -> Result<AnalysisReport> {
        let shape = self.analyze_shape(input.landmarks, input.dims, input.face_box.as_ref())?;

        let personal_color = match input.frame {
            Some(frame) => Some(self.analyze_undertone(frame, input.landmarks)?),
            None => None,
        };

        log::info!(
            "face shape: {} ({}%) via {}",
            shape.result.shape,
            shape.result.confidence,
            shape.source.describe()
        );

        Ok(AnalysisReport::build(shape, personal_color))
    }

    /// Detect landmarks with `provider` and analyze the frame.
    ///
    /// The provider must already be initialized; its lifecycle belongs to
    /// the caller. A frame with no face goes down the fallback path.
    pub fn analyze_with_provider(
        &self,
        provider: &mut dyn LandmarkProvider,
        frame: &RgbFrame,
        face_box: Option<FaceBox>,
    ) -> Result<AnalysisReport> {
        let landmarks = provider.detect(frame)?;
        log::debug!(
            "provider {} returned {} landmarks",
            provider.name(),
            landmarks.as_ref().map_or(0, LandmarkSet::len)
        );

        let mut input = AnalysisInput::from_frame(frame);
        input.face_box = face_box;
        if let Some(set) = landmarks.as_ref() {
            input = input.with_landmarks(set);
        }
        self.analyze(&input)
    }
}
