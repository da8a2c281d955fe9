//! Detection-to-report conversion
//!
//! Every positive detection becomes one persisted report. There is no
//! throttle between consecutive detections; see DESIGN.md.

use crate::capture::Frame;
use crate::detection::DetectionResult;
use crate::scheduler::DetectionSink;
use crate::utils::{ImageUtils, SnapshotConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roadsense_core::model::new_report_id;
use roadsense_core::{
    Clock, Connectivity, FixedLocation, GeoPoint, LocalReportStore, LocationSource, PotholeReport, StoreError,
    SystemClock, User,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Attempts at minting an id not already in the store
const ID_ATTEMPTS: usize = 4;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to capture snapshot: {0}")]
    Snapshot(String),

    #[error("could not generate a unique report id")]
    IdExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ReportRecorder {
    store: Arc<LocalReportStore>,
    user_id: String,
    user_name: String,
    location: Box<dyn LocationSource>,
    connectivity: Connectivity,
    clock: Arc<dyn Clock>,
    snapshot: SnapshotConfig,
    rng: StdRng,
}

impl ReportRecorder {
    /// Recorder stamping reports for `user`, with a fixed location and the
    /// system clock
    pub fn new(store: Arc<LocalReportStore>, user: &User, connectivity: Connectivity) -> Self {
        Self {
            store,
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            location: Box::new(FixedLocation::default()),
            connectivity,
            clock: Arc::new(SystemClock),
            snapshot: SnapshotConfig::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_location(mut self, location: Box<dyn LocationSource>) -> Self {
        self.location = location;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotConfig) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Build and persist the report for one detection.
    pub fn record(&mut self, detection: &DetectionResult, frame: &Frame) -> Result<PotholeReport, RecordError> {
        let timestamp = self.clock.now_millis();
        let id = self.fresh_id(timestamp)?;
        let position = self.location.current().unwrap_or_else(GeoPoint::default);
        let image_snapshot = ImageUtils::snapshot_data_url(&frame.image, &self.snapshot)
            .map_err(|e| RecordError::Snapshot(format!("{e:#}")))?;

        let report = PotholeReport {
            id,
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
            confidence: detection.score.clamp(0.0, 1.0),
            image_snapshot,
            timestamp,
            synced: self.connectivity.is_online(),
        };

        self.store.append(report.clone())?;
        info!(
            id = %report.id,
            confidence = report.confidence,
            synced = report.synced,
            "Report saved"
        );
        Ok(report)
    }

    fn fresh_id(&mut self, timestamp: i64) -> Result<String, RecordError> {
        for _ in 0..ID_ATTEMPTS {
            let id = new_report_id(timestamp, &mut self.rng);
            if !self.store.contains(&id) {
                return Ok(id);
            }
            debug!(%id, "Report id collision, regenerating");
        }
        Err(RecordError::IdExhausted)
    }
}

impl DetectionSink for ReportRecorder {
    fn on_detection(&mut self, detection: &DetectionResult, frame: &Frame) -> anyhow::Result<()> {
        self.record(detection, frame)?;
        Ok(())
    }
}
