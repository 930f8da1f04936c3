//! Face Geometry Measurements
//!
//! Pixel-space widths and length taken between named anatomical point pairs,
//! plus the inter-pupillary distance used later as the normalization
//! denominator.

use serde::{Deserialize, Serialize};

use super::config::PlausibilityConfig;
use super::error::{AnalysisError, Result};
use super::landmarks::{names, ImageDims, LandmarkSet};

/// Raw pixel measurements of one face
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Temple to temple
    pub forehead_width: f32,
    /// Widest visible cheekbone points
    pub cheekbone_width: f32,
    /// Jaw angle to jaw angle
    pub jaw_width: f32,
    /// Crown to chin
    pub face_length: f32,
    /// Outer eye corners; normalization reference
    pub interpupillary_distance: f32,
}

impl Measurements {
    pub const fn new(
        forehead_width: f32,
        cheekbone_width: f32,
        jaw_width: f32,
        face_length: f32,
        interpupillary_distance: f32,
    ) -> Self {
        Self {
            forehead_width,
            cheekbone_width,
            jaw_width,
            face_length,
            interpupillary_distance,
        }
    }

    /// Widest of forehead, cheekbone and jaw
    pub fn max_width(&self) -> f32 {
        self.forehead_width
            .max(self.cheekbone_width)
            .max(self.jaw_width)
    }

    /// Reject measurements that are too small or anatomically inconsistent
    /// to classify.
    ///
    /// Missing landmarks collapse onto the image center and produce near-zero
    /// distances; this gate is where they are caught.
    pub fn check_plausibility(&self, cfg: &PlausibilityConfig) -> Result<()> {
        if !(self.interpupillary_distance > 0.0) {
            return Err(AnalysisError::DegenerateMeasurement {
                quantity: "interpupillary_distance",
                value: self.interpupillary_distance,
            });
        }

        let floors = [
            ("forehead_width", self.forehead_width, cfg.min_forehead_px),
            ("cheekbone_width", self.cheekbone_width, cfg.min_cheekbone_px),
            ("jaw_width", self.jaw_width, cfg.min_jaw_px),
            ("face_length", self.face_length, cfg.min_length_px),
        ];
        for (quantity, value, floor) in floors {
            if !(value >= floor) {
                return Err(AnalysisError::DegenerateMeasurement { quantity, value });
            }
        }

        let reference = self.forehead_width.max(self.jaw_width);
        if self.cheekbone_width < cfg.min_cheekbone_fraction * reference {
            return Err(AnalysisError::ImplausibleRatio {
                cheekbone: self.cheekbone_width,
                reference,
            });
        }

        Ok(())
    }
}

/// Extract pixel measurements from a landmark set.
///
/// Absent point names resolve to the image center, so this never fails;
/// degenerate results are left for [`Measurements::check_plausibility`].
pub fn extract_measurements(landmarks: &LandmarkSet, dims: ImageDims) -> Measurements {
    let dist = |a: &str, b: &str| {
        let p1 = landmarks.resolve(a, dims);
        let p2 = landmarks.resolve(b, dims);
        p1.distance_2d(&p2)
    };

    let m = Measurements {
        forehead_width: dist(names::FOREHEAD_LEFT, names::FOREHEAD_RIGHT),
        cheekbone_width: dist(names::CHEEKBONE_LEFT, names::CHEEKBONE_RIGHT),
        jaw_width: dist(names::JAW_LEFT, names::JAW_RIGHT),
        face_length: dist(names::FACE_TOP, names::CHIN_BOTTOM),
        interpupillary_distance: dist(names::EYE_LEFT, names::EYE_RIGHT),
    };

    log::debug!(
        "measurements: forehead={:.1}px cheekbone={:.1}px jaw={:.1}px length={:.1}px ipd={:.1}px",
        m.forehead_width,
        m.cheekbone_width,
        m.jaw_width,
        m.face_length,
        m.interpupillary_distance
    );

    m
}
