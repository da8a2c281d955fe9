//! Probabilistic stand-in detector

use super::{DetectionConfig, DetectionResult, Detector};
use crate::bbox::BBox;
use crate::capture::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of samples, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Detects with a fixed probability per frame, ignoring pixel content.
///
/// Each call draws one sample for the detect/no-detect decision; a
/// detection then draws the score, x and y in that order.
pub struct SimulatedDetector<S: RandomSource = RngSource<StdRng>> {
    config: DetectionConfig,
    source: S,
}

impl SimulatedDetector {
    /// Stand-in seeded from OS entropy
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_source(config, RngSource(StdRng::from_entropy()))
    }

    /// Reproducible stand-in
    pub fn seeded(config: DetectionConfig, seed: u64) -> Self {
        Self::with_source(config, RngSource(StdRng::seed_from_u64(seed)))
    }
}

impl<S: RandomSource> SimulatedDetector<S> {
    pub fn with_source(config: DetectionConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Uniform integer in `[0, max]`
    fn offset(&mut self, max: u32) -> i32 {
        let value = (self.source.next_unit() * (f64::from(max) + 1.0)).floor() as u32;
        i32::try_from(value.min(max)).unwrap_or(i32::MAX)
    }
}

impl<S: RandomSource> Detector for SimulatedDetector<S> {
    fn detect(&mut self, _frame: &Frame, width: u32, height: u32) -> Option<DetectionResult> {
        if width == 0 || height == 0 {
            return None;
        }

        let roll = self.source.next_unit();
        if roll < 1.0 - self.config.probability {
            return None;
        }

        let (low, high) = self.config.confidence_range;
        let score = low + self.source.next_unit() * (high - low);

        let (box_w, box_h) = self.config.box_size;
        let x = self.offset(width.saturating_sub(box_w));
        let y = self.offset(height.saturating_sub(box_h));
        let bbox = BBox::new(
            x,
            y,
            i32::try_from(box_w).unwrap_or(i32::MAX),
            i32::try_from(box_h).unwrap_or(i32::MAX),
        );

        trace!(score, x, y, "Simulated detection");
        Some(DetectionResult {
            bbox,
            label: self.config.label.clone(),
            score,
        })
    }
}
