//! Fallback Estimator
//!
//! Synthesizes plausible measurements from image (or face box) dimensions and
//! anthropometric proportions when landmark measurements cannot be used. The
//! output re-enters normalization and classification unchanged.

use serde::{Deserialize, Serialize};

use super::config::{FallbackConfig, FallbackMode, PlausibilityConfig};
use super::error::AnalysisError;
use super::landmarks::ImageDims;
use super::measurements::Measurements;

/// Face bounding box from an external detector, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Why the landmark path was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoLandmarks,
    DegenerateMeasurement,
    ImplausibleRatio,
}

impl FallbackReason {
    /// Map a routing error onto a reason; `None` for errors that must not
    /// be absorbed by the fallback path.
    pub fn from_error(err: &AnalysisError) -> Option<Self> {
        match err {
            AnalysisError::NoLandmarksDetected => Some(Self::NoLandmarks),
            AnalysisError::DegenerateMeasurement { .. } => Some(Self::DegenerateMeasurement),
            AnalysisError::ImplausibleRatio { .. } => Some(Self::ImplausibleRatio),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoLandmarks => "no landmarks detected",
            Self::DegenerateMeasurement => "degenerate landmark measurement",
            Self::ImplausibleRatio => "implausible landmark proportions",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FallbackEstimator {
    config: FallbackConfig,
    floors: PlausibilityConfig,
}

impl FallbackEstimator {
    pub fn new(config: FallbackConfig, floors: PlausibilityConfig) -> Self {
        Self { config, floors }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Estimate measurements for an image, preferring a detected face box.
    ///
    /// Every width is raised to its plausibility floor so the result always
    /// normalizes.
    pub fn estimate(&self, dims: ImageDims, face_box: Option<&FaceBox>) -> Measurements {
        let (face_width, face_height) = match face_box.filter(|b| b.is_usable()) {
            Some(b) => (b.width, b.height),
            None => (
                dims.width as f32 * self.config.face_width_fraction,
                dims.height as f32 * self.config.face_height_fraction,
            ),
        };

        let raw = match self.config.mode {
            FallbackMode::Deterministic => self.proportional(face_width, face_height),
            FallbackMode::Seeded { seed } => self.seeded(seed, face_width, face_height),
        };

        let m = self.apply_floors(raw);
        log::debug!(
            "fallback estimate for {}x{}: forehead={:.1} cheekbone={:.1} jaw={:.1} length={:.1}",
            dims.width,
            dims.height,
            m.forehead_width,
            m.cheekbone_width,
            m.jaw_width,
            m.face_length
        );
        m
    }

    fn proportional(&self, face_width: f32, face_height: f32) -> Measurements {
        let c = &self.config;
        Measurements {
            forehead_width: face_width * c.forehead_factor,
            cheekbone_width: face_width * c.cheekbone_factor,
            jaw_width: face_width * c.jaw_factor,
            face_length: face_height * c.length_factor,
            interpupillary_distance: c.reference_ipd_px,
        }
    }

    #[cfg(feature = "stochastic-fallback")]
    fn seeded(&self, seed: u64, face_width: f32, _face_height: f32) -> Measurements {
        archetypes::sample(seed, face_width, self.config.reference_ipd_px)
    }

    #[cfg(not(feature = "stochastic-fallback"))]
    fn seeded(&self, _seed: u64, face_width: f32, face_height: f32) -> Measurements {
        log::warn!("seeded fallback requested without stochastic-fallback feature, using proportions");
        self.proportional(face_width, face_height)
    }

    fn apply_floors(&self, m: Measurements) -> Measurements {
        let f = &self.floors;
        let floor = |v: f32, min: f32| if v.is_finite() { v.max(min) } else { min };
        let ipd = if m.interpupillary_distance > 0.0 {
            m.interpupillary_distance
        } else {
            FallbackConfig::default().reference_ipd_px
        };
        Measurements {
            forehead_width: floor(m.forehead_width, f.min_forehead_px),
            cheekbone_width: floor(m.cheekbone_width, f.min_cheekbone_px),
            jaw_width: floor(m.jaw_width, f.min_jaw_px),
            face_length: floor(m.face_length, f.min_length_px),
            interpupillary_distance: ipd,
        }
    }
}

#[cfg(feature = "stochastic-fallback")]
mod archetypes {
    use rand::distributions::{Distribution, WeightedIndex};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::face_shape::FaceShape;
    use crate::measurements::Measurements;

    struct Archetype {
        shape: FaceShape,
        weight: f32,
        // Ranges as multiples of the estimated face width
        forehead: (f32, f32),
        cheekbone: (f32, f32),
        jaw: (f32, f32),
        length: (f32, f32),
    }

    const ARCHETYPES: &[Archetype] = &[
        Archetype { shape: FaceShape::Oval, weight: 0.30, forehead: (0.84, 0.90), cheekbone: (0.94, 0.98), jaw: (0.82, 0.88), length: (1.26, 1.36) },
        Archetype { shape: FaceShape::Round, weight: 0.20, forehead: (0.88, 0.94), cheekbone: (0.94, 0.98), jaw: (0.86, 0.92), length: (1.00, 1.10) },
        Archetype { shape: FaceShape::Square, weight: 0.15, forehead: (0.90, 0.95), cheekbone: (0.94, 0.98), jaw: (0.90, 0.95), length: (1.00, 1.12) },
        Archetype { shape: FaceShape::Long, weight: 0.10, forehead: (0.84, 0.90), cheekbone: (0.88, 0.94), jaw: (0.82, 0.88), length: (1.40, 1.55) },
        Archetype { shape: FaceShape::Heart, weight: 0.15, forehead: (1.00, 1.06), cheekbone: (0.94, 0.97), jaw: (0.72, 0.80), length: (1.20, 1.32) },
        Archetype { shape: FaceShape::Diamond, weight: 0.10, forehead: (0.80, 0.86), cheekbone: (0.96, 1.00), jaw: (0.76, 0.82), length: (1.20, 1.32) },
    ];

    /// Same seed and face width always yield the same measurements.
    pub(super) fn sample(seed: u64, face_width: f32, ipd: f32) -> Measurements {
        let mut rng = StdRng::seed_from_u64(seed);

        let weights: Vec<f32> = ARCHETYPES.iter().map(|a| a.weight).collect();
        let archetype = match WeightedIndex::new(&weights) {
            Ok(dist) => &ARCHETYPES[dist.sample(&mut rng)],
            Err(_) => &ARCHETYPES[0],
        };
        log::debug!("seeded fallback archetype: {}", archetype.shape.name());

        let mut pick = |(lo, hi): (f32, f32)| face_width * rng.gen_range(lo..=hi);
        Measurements {
            forehead_width: pick(archetype.forehead),
            cheekbone_width: pick(archetype.cheekbone),
            jaw_width: pick(archetype.jaw),
            face_length: pick(archetype.length),
            interpupillary_distance: ipd,
        }
    }
}
