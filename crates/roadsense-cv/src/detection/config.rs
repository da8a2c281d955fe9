//! Detection configuration

use serde::{Deserialize, Serialize};

/// Parameters of the stand-in detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Chance that any single frame yields a detection
    pub probability: f64,
    /// Scores are drawn uniformly from `[min, max)`
    pub confidence_range: (f64, f64),
    /// (width, height) of every reported box
    pub box_size: (u32, u32),
    pub label: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            probability: 0.02,
            confidence_range: (0.85, 0.99),
            box_size: (150, 100),
            label: "Pothole".to_string(),
        }
    }
}

impl DetectionConfig {
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Detect on every frame, handy for demos and soak runs
    pub fn always() -> Self {
        Self::default().with_probability(1.0)
    }
}
