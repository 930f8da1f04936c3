//! Landmark Provider seam
//!
//! The detector that turns pixels into landmarks lives outside this crate.
//! It is injected through [`LandmarkProvider`] with an explicit lifecycle
//! instead of being held as process-wide state.

use std::fmt::Debug;

use super::error::{AnalysisError, Result};
use super::landmarks::LandmarkSet;
use super::skin_tone::RgbFrame;

/// External face-landmark detector.
///
/// Implementations may wrap a native face mesh model, a remote service, or a
/// canned response for tests. `detect` returning `Ok(None)` means no face was
/// found; that outcome is routed to the fallback estimator, not treated as an
/// error.
pub trait LandmarkProvider: Debug {
    /// Acquire model resources. Called once before the first `detect`.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Detect one face in `frame`.
    fn detect(&mut self, frame: &RgbFrame) -> Result<Option<LandmarkSet>>;

    /// Release model resources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Provider name for diagnostics
    fn name(&self) -> &str;
}

/// Provider that returns a preset landmark set for every frame.
///
/// Useful when landmarks were computed upstream, and in tests.
#[derive(Debug, Clone, Default)]
pub struct FixedProvider {
    landmarks: Option<LandmarkSet>,
    ready: bool,
}

impl FixedProvider {
    pub fn new(landmarks: Option<LandmarkSet>) -> Self {
        Self {
            landmarks,
            ready: false,
        }
    }

    /// Provider that never finds a face
    pub fn empty() -> Self {
        Self::new(None)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

impl LandmarkProvider for FixedProvider {
    fn init(&mut self) -> Result<()> {
        self.ready = true;
        Ok(())
    }

    fn detect(&mut self, _frame: &RgbFrame) -> Result<Option<LandmarkSet>> {
        if !self.ready {
            return Err(AnalysisError::Provider(
                "detect called before init".to_string(),
            ));
        }
        Ok(self.landmarks.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.ready = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
