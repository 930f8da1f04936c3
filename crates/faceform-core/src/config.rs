use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::face_shape::FaceShape;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub plausibility: PlausibilityConfig,
    pub fallback: FallbackConfig,
    pub undertone: UndertoneConfig,
}

/// Which classification strategy decides the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStrategy {
    /// Ordered rule cascade, first match wins
    #[default]
    Cascade,
    /// Arg-max of Gaussian similarity to per-shape prototypes
    RelativeScoring,
}

impl FromStr for ClassificationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "relative_scoring" | "scoring" => Ok(Self::RelativeScoring),
            other => Err(ConfigError::Validation(format!(
                "unknown classification strategy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub strategy: ClassificationStrategy,
    pub cascade: CascadeThresholds,
    pub scoring: ScoringConfig,
}

/// Thresholds and confidence slopes of the rule cascade.
///
/// Each `*_slope` is the multiplier applied to the distance past the rule's
/// threshold when computing confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeThresholds {
    /// FW/CW above which a tapering face reads as heart
    pub heart_fw_cw: f32,
    pub heart_slope: f32,

    /// CW/JW at or above which a cheekbone-dominant face reads as diamond
    pub diamond_cw_jw: f32,
    /// FW/CW must stay below this for diamond
    pub diamond_fw_cw_max: f32,
    pub diamond_slope: f32,

    /// FC above which the face reads as long
    pub long_fc: f32,
    pub long_slope: f32,

    pub round_fc_lo: f32,
    pub round_fc_hi: f32,
    /// |FW - CW| tolerance as a fraction of CW
    pub round_symmetry: f32,
    pub round_slope: f32,

    pub square_fc_max: f32,
    /// Pairwise width tolerance as a fraction of CW
    pub square_symmetry: f32,
    pub square_slope: f32,

    pub oval_fc_lo: f32,
    pub oval_fc_hi: f32,
    pub oval_center: f32,
    pub oval_slope: f32,

    /// Boundary case: FC split between elongated and compact faces
    pub boundary_fc_split: f32,
    /// Boundary case: FW/CW above which the upper face dominates
    pub boundary_fw_cw: f32,
    /// Boundary case: CW/JW at or above which the cheekbones dominate
    pub boundary_cw_jw: f32,
    /// Boundary case: CW/JW at or below which a compact face reads as square
    pub boundary_square_cw_jw: f32,
}

impl Default for CascadeThresholds {
    fn default() -> Self {
        Self {
            heart_fw_cw: 1.05,
            heart_slope: 200.0,
            diamond_cw_jw: 1.08,
            diamond_fw_cw_max: 0.97,
            diamond_slope: 100.0,
            long_fc: 1.45,
            long_slope: 50.0,
            round_fc_lo: 1.0,
            round_fc_hi: 1.15,
            round_symmetry: 0.10,
            round_slope: 50.0,
            square_fc_max: 1.18,
            square_symmetry: 0.16,
            square_slope: 50.0,
            oval_fc_lo: 1.22,
            oval_fc_hi: 1.45,
            oval_center: 1.35,
            oval_slope: 5.0,
            boundary_fc_split: 1.2,
            boundary_fw_cw: 1.03,
            boundary_cw_jw: 1.08,
            boundary_square_cw_jw: 1.0,
        }
    }
}

/// Prototypical ratio triple for one shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapePrototype {
    pub shape: FaceShape,
    pub fc: f32,
    pub fw_cw: f32,
    pub cw_jw: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub prototypes: Vec<ShapePrototype>,
    pub sigma_fc: f32,
    pub sigma_fw_cw: f32,
    pub sigma_cw_jw: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let proto = |shape, fc, fw_cw, cw_jw| ShapePrototype {
            shape,
            fc,
            fw_cw,
            cw_jw,
        };
        Self {
            prototypes: vec![
                proto(FaceShape::Oval, 1.35, 0.95, 1.15),
                proto(FaceShape::Round, 1.08, 0.95, 1.12),
                proto(FaceShape::Square, 1.05, 1.0, 1.0),
                proto(FaceShape::Long, 1.6, 0.95, 1.1),
                proto(FaceShape::Heart, 1.3, 1.1, 1.25),
                proto(FaceShape::Diamond, 1.3, 0.85, 1.25),
            ],
            sigma_fc: 0.12,
            sigma_fw_cw: 0.07,
            sigma_cw_jw: 0.08,
        }
    }
}

/// Minimum absolute widths and cross-width sanity for landmark measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityConfig {
    pub min_forehead_px: f32,
    pub min_cheekbone_px: f32,
    pub min_jaw_px: f32,
    pub min_length_px: f32,
    /// Cheekbone width must be at least this fraction of max(forehead, jaw)
    pub min_cheekbone_fraction: f32,
}

impl Default for PlausibilityConfig {
    fn default() -> Self {
        Self {
            min_forehead_px: 20.0,
            min_cheekbone_px: 30.0,
            min_jaw_px: 15.0,
            min_length_px: 40.0,
            min_cheekbone_fraction: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FallbackMode {
    #[default]
    Deterministic,
    /// Archetype sampling; requires the `stochastic-fallback` feature
    Seeded { seed: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub mode: FallbackMode,
    /// Estimated face width as a fraction of image width
    pub face_width_fraction: f32,
    /// Estimated face height as a fraction of image height
    pub face_height_fraction: f32,
    pub forehead_factor: f32,
    pub cheekbone_factor: f32,
    pub jaw_factor: f32,
    pub length_factor: f32,
    /// Adult average inter-pupillary distance at the assumed reference scale
    pub reference_ipd_px: f32,
    /// Subtracted from the classifier confidence for estimated measurements
    pub confidence_penalty: u8,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: FallbackMode::Deterministic,
            face_width_fraction: 0.6,
            face_height_fraction: 0.8,
            forehead_factor: 0.85,
            cheekbone_factor: 0.95,
            jaw_factor: 0.80,
            length_factor: 0.75,
            reference_ipd_px: 65.0,
            confidence_penalty: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndertoneConfig {
    /// R - B above this is warm
    pub warm_threshold: f32,
    /// R - B below this is cool
    pub cool_threshold: f32,
    /// Neighborhood half-size; 2 gives a 5x5 window
    pub sample_radius: u32,
    pub confidence_base: f32,
    /// Confidence gained per unit of |R - B|
    pub confidence_slope: f32,
    pub confidence_min: u8,
    pub confidence_max: u8,
}

impl Default for UndertoneConfig {
    fn default() -> Self {
        Self {
            warm_threshold: 5.0,
            cool_threshold: -3.0,
            sample_radius: 2,
            confidence_base: 50.0,
            confidence_slope: 1.5,
            confidence_min: 50,
            confidence_max: 85,
        }
    }
}

impl EngineConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    /// Variables are prefixed with FACEFORM_, e.g. FACEFORM_CASCADE_LONG_FC=1.4
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        // A user file replaces the default file; sections it omits take built-in defaults
        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_value::<ClassificationStrategy>("FACEFORM_CLASSIFIER_STRATEGY")? {
            self.classifier.strategy = v;
        }

        let cascade = &mut self.classifier.cascade;
        if let Some(v) = env_value("FACEFORM_CASCADE_HEART_FW_CW")? {
            cascade.heart_fw_cw = v;
        }
        if let Some(v) = env_value("FACEFORM_CASCADE_DIAMOND_CW_JW")? {
            cascade.diamond_cw_jw = v;
        }
        if let Some(v) = env_value("FACEFORM_CASCADE_LONG_FC")? {
            cascade.long_fc = v;
        }
        if let Some(v) = env_value("FACEFORM_CASCADE_ROUND_SYMMETRY")? {
            cascade.round_symmetry = v;
        }
        if let Some(v) = env_value("FACEFORM_CASCADE_SQUARE_SYMMETRY")? {
            cascade.square_symmetry = v;
        }

        if let Some(v) = env_value("FACEFORM_FALLBACK_CONFIDENCE_PENALTY")? {
            self.fallback.confidence_penalty = v;
        }
        if let Some(v) = env_value("FACEFORM_FALLBACK_REFERENCE_IPD_PX")? {
            self.fallback.reference_ipd_px = v;
        }

        if let Some(v) = env_value("FACEFORM_UNDERTONE_WARM_THRESHOLD")? {
            self.undertone.warm_threshold = v;
        }
        if let Some(v) = env_value("FACEFORM_UNDERTONE_COOL_THRESHOLD")? {
            self.undertone.cool_threshold = v;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier.cascade;

        let positive = [
            ("cascade.heart_fw_cw", c.heart_fw_cw),
            ("cascade.diamond_cw_jw", c.diamond_cw_jw),
            ("cascade.diamond_fw_cw_max", c.diamond_fw_cw_max),
            ("cascade.long_fc", c.long_fc),
            ("cascade.round_symmetry", c.round_symmetry),
            ("cascade.square_symmetry", c.square_symmetry),
            ("cascade.square_fc_max", c.square_fc_max),
            ("cascade.boundary_fc_split", c.boundary_fc_split),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Validation(format!("{} must be positive", name)));
            }
        }
        let slopes = [
            c.heart_slope,
            c.diamond_slope,
            c.long_slope,
            c.round_slope,
            c.square_slope,
            c.oval_slope,
        ];
        if slopes.iter().any(|s| !(*s >= 0.0)) {
            return Err(ConfigError::Validation(
                "cascade slopes must be non-negative".to_string(),
            ));
        }
        if c.round_fc_lo > c.round_fc_hi {
            return Err(ConfigError::Validation(
                "cascade.round_fc_lo must be <= round_fc_hi".to_string(),
            ));
        }
        if c.oval_fc_lo > c.oval_fc_hi {
            return Err(ConfigError::Validation(
                "cascade.oval_fc_lo must be <= oval_fc_hi".to_string(),
            ));
        }
        if c.oval_center < c.oval_fc_lo || c.oval_center > c.oval_fc_hi {
            return Err(ConfigError::Validation(
                "cascade.oval_center must lie within [oval_fc_lo, oval_fc_hi]".to_string(),
            ));
        }

        let s = &self.classifier.scoring;
        if !(s.sigma_fc > 0.0 && s.sigma_fw_cw > 0.0 && s.sigma_cw_jw > 0.0) {
            return Err(ConfigError::Validation(
                "scoring sigmas must be positive".to_string(),
            ));
        }
        for shape in FaceShape::all() {
            if !s.prototypes.iter().any(|p| p.shape == *shape) {
                return Err(ConfigError::Validation(format!(
                    "scoring.prototypes missing {}",
                    shape.name()
                )));
            }
        }

        let p = &self.plausibility;
        if !(p.min_forehead_px > 0.0
            && p.min_cheekbone_px > 0.0
            && p.min_jaw_px > 0.0
            && p.min_length_px > 0.0)
        {
            return Err(ConfigError::Validation(
                "plausibility minimum widths must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&p.min_cheekbone_fraction) {
            return Err(ConfigError::Validation(
                "plausibility.min_cheekbone_fraction must be in [0, 1]".to_string(),
            ));
        }

        let f = &self.fallback;
        let factors = [
            f.face_width_fraction,
            f.face_height_fraction,
            f.forehead_factor,
            f.cheekbone_factor,
            f.jaw_factor,
            f.length_factor,
            f.reference_ipd_px,
        ];
        if factors.iter().any(|v| !(*v > 0.0)) {
            return Err(ConfigError::Validation(
                "fallback factors must be positive".to_string(),
            ));
        }
        if f.confidence_penalty > 35 {
            return Err(ConfigError::Validation(
                "fallback.confidence_penalty must be <= 35".to_string(),
            ));
        }
        if matches!(f.mode, FallbackMode::Seeded { .. }) && !cfg!(feature = "stochastic-fallback") {
            return Err(ConfigError::Validation(
                "fallback.mode = seeded requires the stochastic-fallback feature".to_string(),
            ));
        }

        let u = &self.undertone;
        if u.cool_threshold >= u.warm_threshold {
            return Err(ConfigError::Validation(
                "undertone.cool_threshold must be < warm_threshold".to_string(),
            ));
        }
        if u.confidence_min > u.confidence_max || u.confidence_max > 100 {
            return Err(ConfigError::Validation(
                "undertone confidence bounds must satisfy min <= max <= 100".to_string(),
            ));
        }

        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Validation(format!("Invalid {}", key))),
        Err(_) => Ok(None),
    }
}
