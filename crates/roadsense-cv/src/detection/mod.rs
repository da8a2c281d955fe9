//! Detection engine interface
//!
//! A detector takes one frame and returns at most one scored detection.
//! Real models plug in behind [`Detector`]; [`SimulatedDetector`] is the
//! stand-in used until one is available.

pub mod config;
pub mod detector;

pub use config::DetectionConfig;
pub use detector::{RandomSource, RngSource, ScriptedSource, SimulatedDetector};

use crate::bbox::BBox;
use crate::capture::Frame;
use serde::{Deserialize, Serialize};

/// Per-frame detection value. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bbox: BBox,
    pub label: String,
    /// Score in `[0, 1]`
    pub score: f64,
}

impl DetectionResult {
    /// Score as a whole percentage, e.g. `0.914 -> 91`
    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

/// Frame in, zero-or-one detection out.
///
/// Callers guarantee `width > 0 && height > 0`.
pub trait Detector {
    fn detect(&mut self, frame: &Frame, width: u32, height: u32) -> Option<DetectionResult>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, frame: &Frame, width: u32, height: u32) -> Option<DetectionResult> {
        (**self).detect(frame, width, height)
    }
}
