//! Named Facial Landmarks
//!
//! A landmark set maps semantic point names to pixel-space points for a
//! single detected face. Names the extractor asks for but the set lacks
//! resolve to the image center, so distance arithmetic never fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Point-name vocabulary understood by the extractor and the skin sampler.
pub mod names {
    /// Left temple / hairline edge
    pub const FOREHEAD_LEFT: &str = "forehead_left";
    /// Right temple / hairline edge
    pub const FOREHEAD_RIGHT: &str = "forehead_right";
    /// Forehead center (skin sample)
    pub const FOREHEAD_CENTER: &str = "forehead_center";
    /// Left cheekbone, widest visible point
    pub const CHEEKBONE_LEFT: &str = "cheekbone_left";
    /// Right cheekbone, widest visible point
    pub const CHEEKBONE_RIGHT: &str = "cheekbone_right";
    /// Left cheek center (skin sample)
    pub const CHEEK_LEFT: &str = "cheek_left";
    /// Right cheek center (skin sample)
    pub const CHEEK_RIGHT: &str = "cheek_right";
    /// Left jaw angle
    pub const JAW_LEFT: &str = "jaw_left";
    /// Right jaw angle
    pub const JAW_RIGHT: &str = "jaw_right";
    /// Crown / top of face
    pub const FACE_TOP: &str = "face_top";
    /// Bottom of chin
    pub const CHIN_BOTTOM: &str = "chin_bottom";
    /// Chin center (skin sample)
    pub const CHIN_CENTER: &str = "chin_center";
    /// Left eye outer corner
    pub const EYE_LEFT: &str = "eye_left";
    /// Right eye outer corner
    pub const EYE_RIGHT: &str = "eye_right";
}

/// MediaPipe Face Mesh (468 points) indices for each named point.
pub mod mesh_indices {
    use super::names;

    pub const MESH_SIZE: usize = 468;

    pub const MAPPING: &[(&str, usize)] = &[
        (names::EYE_LEFT, 33),
        (names::EYE_RIGHT, 362),
        (names::FOREHEAD_LEFT, 127),
        (names::FOREHEAD_RIGHT, 356),
        (names::FOREHEAD_CENTER, 151),
        (names::CHEEKBONE_LEFT, 234),
        (names::CHEEKBONE_RIGHT, 454),
        (names::CHEEK_LEFT, 123),
        (names::CHEEK_RIGHT, 352),
        (names::JAW_LEFT, 136),
        (names::JAW_RIGHT, 365),
        (names::FACE_TOP, 10),
        (names::CHIN_BOTTOM, 152),
        (names::CHIN_CENTER, 199),
    ];
}

/// A landmark in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub const fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar distance; depth is ignored for widths and lengths.
    pub fn distance_2d(&self, other: &LandmarkPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn scaled(&self, s: f32) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Source image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> LandmarkPoint {
        LandmarkPoint::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Named landmarks for exactly one face.
///
/// Coordinates are validated on insertion; a set that exists is always
/// finite, so downstream arithmetic never produces NaN from input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, LandmarkPoint>", into = "BTreeMap<String, LandmarkPoint>")]
pub struct LandmarkSet {
    points: BTreeMap<String, LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a named point.
    pub fn insert(&mut self, name: impl Into<String>, point: LandmarkPoint) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnalysisError::MalformedLandmarks(
                "empty landmark name".to_string(),
            ));
        }
        if !point.is_finite() {
            return Err(AnalysisError::MalformedLandmarks(format!(
                "non-finite coordinates for '{}'",
                name
            )));
        }
        self.points.insert(name, point);
        Ok(())
    }

    /// Builder-style insert.
    pub fn with_point(mut self, name: impl Into<String>, point: LandmarkPoint) -> Result<Self> {
        self.insert(name, point)?;
        Ok(self)
    }

    /// Build a named set from a MediaPipe Face Mesh.
    ///
    /// # Arguments
    /// * `mesh` - Face Mesh points as `[x, y, z]`
    /// * `normalized` - Whether x/y are in 0..1 (scaled by width/height)
    /// * `width`, `height` - Source image dimensions
    pub fn from_mesh(mesh: &[[f32; 3]], normalized: bool, width: u32, height: u32) -> Result<Self> {
        let (sx, sy) = if normalized {
            (width as f32, height as f32)
        } else {
            (1.0, 1.0)
        };

        let mut set = Self::new();
        for &(name, idx) in mesh_indices::MAPPING {
            if let Some([x, y, z]) = mesh.get(idx) {
                set.insert(name, LandmarkPoint::with_depth(x * sx, y * sy, *z))?;
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&LandmarkPoint> {
        self.points.get(name)
    }

    /// Resolve a point, substituting the image center when it is absent.
    pub fn resolve(&self, name: &str, dims: ImageDims) -> LandmarkPoint {
        match self.points.get(name) {
            Some(p) => *p,
            None => {
                log::debug!("landmark '{}' missing, using image center", name);
                dims.center()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LandmarkPoint)> {
        self.points.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Uniformly scale every coordinate.
    pub fn scaled(&self, s: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|(k, p)| (k.clone(), p.scaled(s)))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, LandmarkPoint>> for LandmarkSet {
    type Error = AnalysisError;

    fn try_from(map: BTreeMap<String, LandmarkPoint>) -> Result<Self> {
        let mut set = Self::new();
        for (name, point) in map {
            set.insert(name, point)?;
        }
        Ok(set)
    }
}

impl From<LandmarkSet> for BTreeMap<String, LandmarkPoint> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name_resolves_to_center() {
        let set = LandmarkSet::new();
        let p = set.resolve(names::JAW_LEFT, ImageDims::new(640, 480));
        assert_eq!(p, LandmarkPoint::new(320.0, 240.0));
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let mut set = LandmarkSet::new();
        let err = set
            .insert(names::EYE_LEFT, LandmarkPoint::new(f32::NAN, 1.0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedLandmarks(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut set = LandmarkSet::new();
        assert!(set.insert("  ", LandmarkPoint::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_distance_ignores_depth() {
        let a = LandmarkPoint::with_depth(0.0, 0.0, 100.0);
        let b = LandmarkPoint::with_depth(3.0, 4.0, -50.0);
        assert!((a.distance_2d(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_mesh_denormalizes() {
        let mut mesh = vec![[0.5, 0.5, 0.0]; mesh_indices::MESH_SIZE];
        mesh[33] = [0.4, 0.4, 0.0];
        mesh[362] = [0.6, 0.4, 0.0];

        let set = LandmarkSet::from_mesh(&mesh, true, 1000, 500).unwrap();
        let left = set.get(names::EYE_LEFT).unwrap();
        assert!((left.x - 400.0).abs() < 1e-3);
        assert!((left.y - 200.0).abs() < 1e-3);
        assert_eq!(set.len(), mesh_indices::MAPPING.len());
    }

    #[test]
    fn test_short_mesh_leaves_names_absent() {
        let mesh = vec![[10.0, 10.0, 0.0]; 100];
        let set = LandmarkSet::from_mesh(&mesh, false, 640, 480).unwrap();
        assert!(set.contains(names::EYE_LEFT));
        assert!(set.contains(names::FACE_TOP));
        assert!(!set.contains(names::EYE_RIGHT));
        assert!(!set.contains(names::CHEEKBONE_RIGHT));
    }

    #[test]
    fn test_deserialize_defaults_depth() {
        let json = r#"{"eye_left": {"x": 1.0, "y": 2.0}}"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.get(names::EYE_LEFT).unwrap().z, 0.0);
    }
}
