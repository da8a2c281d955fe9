//! Application configuration

use anyhow::Context;
use roadsense_core::GeoPoint;
use roadsense_cv::detection::DetectionConfig;
use roadsense_cv::overlay::OverlayStyle;
use roadsense_cv::utils::SnapshotConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted store
    pub data_dir: PathBuf,
    pub refresh_hz: u32,
    /// Ticks to run before stopping
    pub frames: u64,
    /// Connectivity at start-up
    pub online: bool,
    /// Reconnect and sync pending reports once detection stops
    pub sync_on_exit: bool,
    /// E-mail of the operator stamping reports
    pub user_email: String,
    pub location: GeoPoint,
    /// Synthetic camera resolution (width, height)
    pub camera_size: (u32, u32),
    /// Save an annotated frame for every detection here
    pub overlay_dir: Option<PathBuf>,
    pub detection: DetectionConfig,
    pub overlay: OverlayStyle,
    pub snapshot: SnapshotConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
            refresh_hz: 60,
            frames: 300,
            online: true,
            sync_on_exit: true,
            user_email: "john@gmail.com".to_string(),
            location: GeoPoint::default(),
            camera_size: (640, 480),
            overlay_dir: None,
            detection: DetectionConfig::default(),
            overlay: OverlayStyle::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config file: {:?}", path))
    }
}
