//! Face Shape Classification
//!
//! Maps the ratio triple (and the underlying normalized widths) to one of six
//! shape labels with an integer confidence and a short justification.
//!
//! Two strategies share the same input and output:
//!
//! - **Cascade**: rules evaluated in fixed priority order, first match wins.
//!   Rule regions overlap; the order encodes which feature is considered the
//!   more diagnostic. A boundary branch catches everything no rule claims,
//!   so every input gets a label.
//! - **Relative scoring**: Gaussian similarity to a prototype ratio triple
//!   per shape, arg-max wins.

use serde::{Deserialize, Serialize};

use super::config::{CascadeThresholds, ClassificationStrategy, ClassifierConfig, ScoringConfig};
use super::ratios::{NormalizedMeasurements, RatioTriple};

/// Lowest confidence the engine ever reports
pub const MIN_CONFIDENCE: u8 = 60;
/// Highest confidence the engine ever reports
pub const MAX_CONFIDENCE: u8 = 95;

// (base, cap) per cascade rule
const HEART_CONFIDENCE: (f32, u8) = (75.0, 95);
const DIAMOND_CONFIDENCE: (f32, u8) = (73.0, 93);
const LONG_CONFIDENCE: (f32, u8) = (70.0, 91);
const ROUND_CONFIDENCE: (f32, u8) = (78.0, 89);
const SQUARE_CONFIDENCE: (f32, u8) = (72.0, 87);
const OVAL_CONFIDENCE: (f32, u8) = (82.0, 92);

// Boundary-case confidences, kept below rule-matched results
const BOUNDARY_ELONGATED_HEART: u8 = 72;
const BOUNDARY_ELONGATED_DIAMOND: u8 = 71;
const BOUNDARY_ELONGATED_OVAL: u8 = 76;
const BOUNDARY_COMPACT_HEART: u8 = 69;
const BOUNDARY_COMPACT_DIAMOND: u8 = 70;
const BOUNDARY_COMPACT_SQUARE: u8 = 73;
const BOUNDARY_COMPACT_ROUND: u8 = 74;

/// Face shape categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceShape {
    /// Balanced proportions, slightly longer than wide
    Oval,
    /// Length close to width, soft even contour
    Round,
    /// Length close to width, forehead, cheekbones and jaw aligned
    Square,
    /// Significantly longer than wide
    Long,
    /// Wide forehead tapering to a narrow jaw
    Heart,
    /// Cheekbones dominate a narrower forehead and jaw
    Diamond,
}

impl FaceShape {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Oval => "Oval",
            Self::Round => "Round",
            Self::Square => "Square",
            Self::Long => "Long",
            Self::Heart => "Heart",
            Self::Diamond => "Diamond",
        }
    }

    /// Get all variants (for iteration)
    pub fn all() -> &'static [FaceShape] {
        &[
            FaceShape::Oval,
            FaceShape::Round,
            FaceShape::Square,
            FaceShape::Long,
            FaceShape::Heart,
            FaceShape::Diamond,
        ]
    }
}

impl std::fmt::Display for FaceShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Face shape classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeResult {
    pub shape: FaceShape,
    /// Always within [MIN_CONFIDENCE, MAX_CONFIDENCE]
    pub confidence: u8,
    /// Cites the deciding ratio and its threshold; never empty
    pub reasoning: String,
    pub ratios: RatioTriple,
    /// Second-best label and its similarity (relative scoring only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_up: Option<(FaceShape, f32)>,
}

impl ShapeResult {
    /// Lower confidence by a fixed penalty, never below the engine floor.
    pub fn penalized(mut self, penalty: u8, note: &str) -> Self {
        self.confidence = self.confidence.saturating_sub(penalty).max(MIN_CONFIDENCE);
        if !note.is_empty() {
            self.reasoning = format!("{} ({})", self.reasoning, note);
        }
        self
    }
}

/// Round and clamp a raw confidence into [MIN_CONFIDENCE, cap].
fn bounded_confidence(raw: f32, cap: u8) -> u8 {
    let cap = cap.min(MAX_CONFIDENCE) as f32;
    if !raw.is_finite() {
        return MIN_CONFIDENCE;
    }
    raw.round().clamp(MIN_CONFIDENCE as f32, cap) as u8
}

struct Decision {
    shape: FaceShape,
    confidence: u8,
    reasoning: String,
}

/// Face shape classifier
#[derive(Debug, Clone, Default)]
pub struct ShapeClassifier {
    strategy: ClassificationStrategy,
    cascade: CascadeThresholds,
    scoring: ScoringConfig,
}

impl ShapeClassifier {
    /// Create with default thresholds (cascade strategy)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ClassifierConfig) -> Self {
        Self {
            strategy: config.strategy,
            cascade: config.cascade.clone(),
            scoring: config.scoring.clone(),
        }
    }

    pub fn strategy(&self) -> ClassificationStrategy {
        self.strategy
    }

    /// Classify from ratios plus the widths they were derived from.
    pub fn classify(&self, ratios: &RatioTriple, widths: &NormalizedMeasurements) -> ShapeResult {
        let (decision, runner_up) = match self.strategy {
            ClassificationStrategy::Cascade => (self.cascade(ratios, widths), None),
            ClassificationStrategy::RelativeScoring => {
                let (decision, runner_up) = self.relative_scoring(ratios);
                (decision, Some(runner_up))
            }
        };

        ShapeResult {
            shape: decision.shape,
            confidence: decision.confidence,
            reasoning: decision.reasoning,
            ratios: *ratios,
            runner_up,
        }
    }

    /// Classify from ratios alone; widths are reconstructed with the
    /// cheekbone width as unit.
    pub fn classify_ratios(&self, ratios: &RatioTriple) -> ShapeResult {
        self.classify(ratios, &NormalizedMeasurements::from_ratios(ratios))
    }

    fn cascade(&self, r: &RatioTriple, w: &NormalizedMeasurements) -> Decision {
        let t = &self.cascade;
        let cw = w.cheekbone_width;

        // 1. Heart: forehead dominant, tapering down to the jaw
        if r.fw_cw > t.heart_fw_cw
            && w.forehead_width > w.cheekbone_width
            && w.cheekbone_width > w.jaw_width
        {
            let (base, cap) = HEART_CONFIDENCE;
            return Decision {
                shape: FaceShape::Heart,
                confidence: bounded_confidence(base + (r.fw_cw - t.heart_fw_cw) * t.heart_slope, cap),
                reasoning: format!(
                    "Forehead/cheekbone ratio {:.3} > {:.2} with forehead > cheekbone > jaw",
                    r.fw_cw, t.heart_fw_cw
                ),
            };
        }

        // 2. Diamond: cheekbones widest, narrow jaw and forehead
        if w.cheekbone_is_widest() && r.cw_jw >= t.diamond_cw_jw && r.fw_cw < t.diamond_fw_cw_max {
            let (base, cap) = DIAMOND_CONFIDENCE;
            return Decision {
                shape: FaceShape::Diamond,
                confidence: bounded_confidence(
                    base + (r.cw_jw - t.diamond_cw_jw) * t.diamond_slope,
                    cap,
                ),
                reasoning: format!(
                    "Cheekbone/jaw ratio {:.3} >= {:.2} and forehead/cheekbone {:.3} < {:.2}",
                    r.cw_jw, t.diamond_cw_jw, r.fw_cw, t.diamond_fw_cw_max
                ),
            };
        }

        // 3. Long
        if r.fc > t.long_fc {
            let (base, cap) = LONG_CONFIDENCE;
            return Decision {
                shape: FaceShape::Long,
                confidence: bounded_confidence(base + (r.fc - t.long_fc) * t.long_slope, cap),
                reasoning: format!("Length/cheekbone ratio {:.3} > {:.2}", r.fc, t.long_fc),
            };
        }

        // 4. Round: compact, forehead matches cheekbones
        if r.fc >= t.round_fc_lo
            && r.fc <= t.round_fc_hi
            && (w.forehead_width - cw).abs() < t.round_symmetry * cw
        {
            let (base, cap) = ROUND_CONFIDENCE;
            return Decision {
                shape: FaceShape::Round,
                confidence: bounded_confidence(base + (t.round_fc_hi - r.fc) * t.round_slope, cap),
                reasoning: format!(
                    "Length/cheekbone ratio {:.3} within [{:.2}, {:.2}], forehead within {:.0}% of cheekbone",
                    r.fc,
                    t.round_fc_lo,
                    t.round_fc_hi,
                    t.round_symmetry * 100.0
                ),
            };
        }

        // 5. Square: compact, all three widths aligned
        let tol = t.square_symmetry * cw;
        if r.fc <= t.square_fc_max
            && (w.forehead_width - cw).abs() < tol
            && (w.jaw_width - cw).abs() < tol
            && (w.forehead_width - w.jaw_width).abs() < tol
        {
            let (base, cap) = SQUARE_CONFIDENCE;
            return Decision {
                shape: FaceShape::Square,
                confidence: bounded_confidence(base + (t.square_fc_max - r.fc) * t.square_slope, cap),
                reasoning: format!(
                    "Length/cheekbone ratio {:.3} <= {:.2}, forehead, cheekbone and jaw within {:.0}%",
                    r.fc,
                    t.square_fc_max,
                    t.square_symmetry * 100.0
                ),
            };
        }

        // 6. Oval
        if r.fc >= t.oval_fc_lo && r.fc <= t.oval_fc_hi {
            let (base, cap) = OVAL_CONFIDENCE;
            let closeness = t.oval_center - (r.fc - t.oval_center).abs();
            return Decision {
                shape: FaceShape::Oval,
                confidence: bounded_confidence(base + closeness * t.oval_slope, cap),
                reasoning: format!(
                    "Length/cheekbone ratio {:.3} within oval range [{:.2}, {:.2}] (center {:.2})",
                    r.fc, t.oval_fc_lo, t.oval_fc_hi, t.oval_center
                ),
            };
        }

        self.boundary(r)
    }

    /// Closest label for ratios no cascade rule claims.
    fn boundary(&self, r: &RatioTriple) -> Decision {
        let t = &self.cascade;
        let elongated = r.fc > t.boundary_fc_split;

        let (shape, confidence) = if elongated {
            if r.fw_cw > t.boundary_fw_cw {
                (FaceShape::Heart, BOUNDARY_ELONGATED_HEART)
            } else if r.cw_jw >= t.boundary_cw_jw {
                (FaceShape::Diamond, BOUNDARY_ELONGATED_DIAMOND)
            } else {
                (FaceShape::Oval, BOUNDARY_ELONGATED_OVAL)
            }
        } else if r.fw_cw > t.boundary_fw_cw {
            (FaceShape::Heart, BOUNDARY_COMPACT_HEART)
        } else if r.cw_jw >= t.boundary_cw_jw {
            (FaceShape::Diamond, BOUNDARY_COMPACT_DIAMOND)
        } else if r.cw_jw <= t.boundary_square_cw_jw {
            (FaceShape::Square, BOUNDARY_COMPACT_SQUARE)
        } else {
            (FaceShape::Round, BOUNDARY_COMPACT_ROUND)
        };

        Decision {
            shape,
            confidence,
            reasoning: format!(
                "Boundary case: length/cheekbone {:.3} {} {:.2}, forehead/cheekbone {:.3}, cheekbone/jaw {:.3}; closest to {}",
                r.fc,
                if elongated { ">" } else { "<=" },
                t.boundary_fc_split,
                r.fw_cw,
                r.cw_jw,
                shape.name()
            ),
        }
    }

    fn relative_scoring(&self, r: &RatioTriple) -> (Decision, (FaceShape, f32)) {
        let s = &self.scoring;

        let mut scores: Vec<(FaceShape, f32)> = s
            .prototypes
            .iter()
            .map(|p| {
                let d_fc = (r.fc - p.fc) / s.sigma_fc;
                let d_fw = (r.fw_cw - p.fw_cw) / s.sigma_fw_cw;
                let d_cw = (r.cw_jw - p.cw_jw) / s.sigma_cw_jw;
                let score = (-0.5 * (d_fc * d_fc + d_fw * d_fw + d_cw * d_cw)).exp();
                (p.shape, if score.is_finite() { score } else { 0.0 })
            })
            .collect();

        // Sort by score descending; ties keep prototype order
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (top_shape, top_score) = scores.first().copied().unwrap_or((FaceShape::Oval, 0.0));
        let (second_shape, second_score) = scores.get(1).copied().unwrap_or((top_shape, 0.0));

        let margin = if top_score > f32::EPSILON {
            (top_score - second_score) / top_score
        } else {
            0.0
        };
        let span = (MAX_CONFIDENCE - MIN_CONFIDENCE) as f32;
        let raw = MIN_CONFIDENCE as f32 + span * (0.6 * top_score + 0.4 * margin);

        let decision = Decision {
            shape: top_shape,
            confidence: bounded_confidence(raw, MAX_CONFIDENCE),
            reasoning: format!(
                "Closest to {} prototype (FC {:.3}, FW/CW {:.3}, CW/JW {:.3}): similarity {:.2} vs {} {:.2}",
                top_shape.name(),
                r.fc,
                r.fw_cw,
                r.cw_jw,
                top_score,
                second_shape.name(),
                second_score
            ),
        };

        (decision, (second_shape, second_score))
    }
}
