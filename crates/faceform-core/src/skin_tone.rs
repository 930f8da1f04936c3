//! Skin Undertone Analysis
//!
//! Samples small pixel neighborhoods at four facial regions, averages them and
//! thresholds the red-minus-blue signal into warm, cool or neutral.

use serde::{Deserialize, Serialize};

use super::config::UndertoneConfig;
use super::error::{AnalysisError, Result};
use super::landmarks::{names, LandmarkSet};

/// Points sampled for undertone, in averaging order
pub const SAMPLE_POINTS: [&str; 4] = [
    names::FOREHEAD_CENTER,
    names::CHEEK_LEFT,
    names::CHEEK_RIGHT,
    names::CHIN_CENTER,
];

/// Borrow-free RGB8 image buffer (row-major)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbFrame {
    /// Wrap raw RGB8 data; `None` if the buffer length does not match.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Frame filled with one color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * 3);
        for _ in 0..count {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get pixel at (x, y) as [R, G, B]; black outside the frame
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Set pixel at (x, y); ignored outside the frame
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Mean RGB of the square window of `radius` around (cx, cy), clamped to
    /// the frame. `None` when the center itself lies outside.
    pub fn neighborhood_mean(&self, cx: f32, cy: f32, radius: u32) -> Option<[f32; 3]> {
        if !(cx.is_finite() && cy.is_finite()) {
            return None;
        }
        let (cx, cy) = (cx.round(), cy.round());
        if cx < 0.0 || cy < 0.0 || cx >= self.width as f32 || cy >= self.height as f32 {
            return None;
        }
        let (cx, cy) = (cx as u32, cy as u32);

        let x0 = cx.saturating_sub(radius);
        let y0 = cy.saturating_sub(radius);
        let x1 = cx.saturating_add(radius).min(self.width - 1);
        let y1 = cy.saturating_add(radius).min(self.height - 1);

        let mut sum = [0.0f64; 3];
        let mut count = 0u32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = self.get_pixel(x, y);
                sum[0] += px[0] as f64;
                sum[1] += px[1] as f64;
                sum[2] += px[2] as f64;
                count += 1;
            }
        }

        let inv = 1.0 / count as f64;
        Some([
            (sum[0] * inv) as f32,
            (sum[1] * inv) as f32,
            (sum[2] * inv) as f32,
        ])
    }
}

#[cfg(feature = "image-processing")]
impl From<&image::RgbImage> for RgbFrame {
    fn from(img: &image::RgbImage) -> Self {
        Self {
            data: img.as_raw().clone(),
            width: img.width(),
            height: img.height(),
        }
    }
}

#[cfg(feature = "image-processing")]
impl From<&image::DynamicImage> for RgbFrame {
    fn from(img: &image::DynamicImage) -> Self {
        Self::from(&img.to_rgb8())
    }
}

/// Skin undertone classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Undertone {
    Warm,
    Cool,
    Neutral,
}

impl Undertone {
    /// Recommended color palette
    pub fn palette(&self) -> &'static [&'static str] {
        match self {
            Self::Warm => &["coral", "peach", "warm beige", "gold", "olive green"],
            Self::Cool => &["rose pink", "lavender", "navy", "silver", "emerald"],
            Self::Neutral => &["dusty rose", "soft teal", "taupe", "off-white", "jade"],
        }
    }
}

impl std::fmt::Display for Undertone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

/// Undertone analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndertoneResult {
    /// Averaged skin color
    pub rgb: (u8, u8, u8),
    pub undertone: Undertone,
    /// 0-100
    pub confidence: u8,
    pub recommended_palette: Vec<String>,
}

impl UndertoneResult {
    /// Substituted when no sample point is inside the image
    pub fn default_result() -> Self {
        Self::new((200, 180, 160), Undertone::Warm, 50)
    }

    fn new(rgb: (u8, u8, u8), undertone: Undertone, confidence: u8) -> Self {
        Self {
            rgb,
            undertone,
            confidence,
            recommended_palette: undertone.palette().iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UndertoneClassifier {
    config: UndertoneConfig,
}

impl UndertoneClassifier {
    pub fn new(config: UndertoneConfig) -> Self {
        Self { config }
    }

    /// Classify undertone from the sample regions present in `landmarks`.
    ///
    /// Missing or out-of-frame points are skipped. Fails with
    /// `NoSamplableRegion` when none remain.
    pub fn classify(&self, frame: &RgbFrame, landmarks: &LandmarkSet) -> Result<UndertoneResult> {
        let samples: Vec<[f32; 3]> = SAMPLE_POINTS
            .iter()
            .filter_map(|name| landmarks.get(name))
            .filter_map(|p| frame.neighborhood_mean(p.x, p.y, self.config.sample_radius))
            .collect();

        if samples.is_empty() {
            return Err(AnalysisError::NoSamplableRegion);
        }

        let n = samples.len() as f32;
        let mut avg = [0.0f32; 3];
        for s in &samples {
            avg[0] += s[0] / n;
            avg[1] += s[1] / n;
            avg[2] += s[2] / n;
        }

        let result = self.classify_rgb(avg);
        log::debug!(
            "undertone from {} regions: rgb={:?} -> {} ({})",
            samples.len(),
            result.rgb,
            result.undertone,
            result.confidence
        );
        Ok(result)
    }

    /// Threshold an averaged color
    pub fn classify_rgb(&self, rgb: [f32; 3]) -> UndertoneResult {
        let cfg = &self.config;
        let diff = rgb[0] - rgb[2];

        let undertone = if diff > cfg.warm_threshold {
            Undertone::Warm
        } else if diff < cfg.cool_threshold {
            Undertone::Cool
        } else {
            Undertone::Neutral
        };

        let raw = cfg.confidence_base + cfg.confidence_slope * diff.abs();
        let confidence = raw
            .round()
            .clamp(cfg.confidence_min as f32, cfg.confidence_max as f32) as u8;

        let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        UndertoneResult::new(
            (channel(rgb[0]), channel(rgb[1]), channel(rgb[2])),
            undertone,
            confidence,
        )
    }
}
