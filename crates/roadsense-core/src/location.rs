//! Best-effort location sources

use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for GeoPoint {
    /// Lower Manhattan, used when no positioning service is wired in.
    fn default() -> Self {
        Self::new(40.7128, -74.0060)
    }
}

/// Anything that can report where the device currently is.
///
/// Returning `None` means no fix is available right now; callers fall
/// back to a fixed position.
pub trait LocationSource: Send {
    fn current(&self) -> Option<GeoPoint>;
}

/// Location source that always answers with the same point.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub GeoPoint);

impl LocationSource for FixedLocation {
    fn current(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}
