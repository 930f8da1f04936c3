//! Ratio Normalization
//!
//! Divides raw measurements by the inter-pupillary distance and builds the
//! three cross-ratios that drive classification. Both are scale-free.

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};
use super::measurements::Measurements;

/// Measurements divided by inter-pupillary distance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedMeasurements {
    pub forehead_width: f32,
    pub cheekbone_width: f32,
    pub jaw_width: f32,
    pub face_length: f32,
}

impl NormalizedMeasurements {
    /// Widths implied by a ratio triple with cheekbone width fixed at 1.0.
    pub fn from_ratios(ratios: &RatioTriple) -> Self {
        Self {
            forehead_width: ratios.fw_cw,
            cheekbone_width: 1.0,
            jaw_width: 1.0 / ratios.cw_jw,
            face_length: ratios.fc,
        }
    }

    pub fn cheekbone_is_widest(&self) -> bool {
        self.cheekbone_width > self.forehead_width && self.cheekbone_width > self.jaw_width
    }
}

/// The three diagnostic ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioTriple {
    /// Face length / cheekbone width
    pub fc: f32,
    /// Forehead width / cheekbone width
    pub fw_cw: f32,
    /// Cheekbone width / jaw width
    pub cw_jw: f32,
}

impl RatioTriple {
    /// Build a triple, rejecting non-finite or non-positive values.
    pub fn new(fc: f32, fw_cw: f32, cw_jw: f32) -> Result<Self> {
        for (quantity, value) in [("fc", fc), ("fw_cw", fw_cw), ("cw_jw", cw_jw)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::DegenerateMeasurement { quantity, value });
            }
        }
        Ok(Self { fc, fw_cw, cw_jw })
    }
}

/// Normalize measurements and compute the ratio triple.
///
/// Fails with `DegenerateMeasurement` when the normalization reference or a
/// denominator width is not strictly positive.
pub fn normalize(m: &Measurements) -> Result<(NormalizedMeasurements, RatioTriple)> {
    let positive = [
        ("interpupillary_distance", m.interpupillary_distance),
        ("cheekbone_width", m.cheekbone_width),
        ("jaw_width", m.jaw_width),
    ];
    for (quantity, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(AnalysisError::DegenerateMeasurement { quantity, value });
        }
    }

    let ipd = m.interpupillary_distance;
    let normalized = NormalizedMeasurements {
        forehead_width: m.forehead_width / ipd,
        cheekbone_width: m.cheekbone_width / ipd,
        jaw_width: m.jaw_width / ipd,
        face_length: m.face_length / ipd,
    };

    let ratios = RatioTriple::new(
        m.face_length / m.cheekbone_width,
        m.forehead_width / m.cheekbone_width,
        m.cheekbone_width / m.jaw_width,
    )?;

    log::debug!(
        "ratios: FC={:.3} FW/CW={:.3} CW/JW={:.3}",
        ratios.fc,
        ratios.fw_cw,
        ratios.cw_jw
    );

    Ok((normalized, ratios))
}
