//! Detection pipeline wiring
//!
//! Builds the store, capture session, scheduler and sync coordinator from
//! an [`AppConfig`] and runs one detection session.

use crate::config::AppConfig;
use anyhow::Context;
use roadsense_core::{
    Connectivity, FileBackend, FixedLocation, LocalReportStore, OfflineSyncCoordinator, PotholeReport,
    RemoteError, RemoteReportSink, ReportService, SeedPolicy, SyncReport,
};
use roadsense_cv::capture::SyntheticCamera;
use roadsense_cv::scheduler::{DetectionSink, FixedRateDisplay};
use roadsense_cv::utils::ImageUtils;
use roadsense_cv::{
    AnnotationRenderer, CaptureSession, DetectionResult, Frame, FrameScheduler, ReportRecorder, SimulatedDetector,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Remote stand-in that accepts every report
pub struct LoggingRemote;

impl RemoteReportSink for LoggingRemote {
    fn push(&self, report: &PotholeReport) -> Result<(), RemoteError> {
        info!(id = %report.id, user = %report.user_id, "Pushed report to remote");
        Ok(())
    }
}

/// Persists each detection and optionally dumps an annotated frame
pub struct PipelineSink {
    recorder: ReportRecorder,
    renderer: AnnotationRenderer,
    overlay_dir: Option<PathBuf>,
}

impl DetectionSink for PipelineSink {
    fn on_detection(&mut self, detection: &DetectionResult, frame: &Frame) -> anyhow::Result<()> {
        self.recorder.on_detection(detection, frame)?;

        if let Some(dir) = &self.overlay_dir {
            let mut annotated = frame.image.clone();
            self.renderer.render(Some(detection)).draw_on(&mut annotated);
            let path = dir.join(format!("detection-{:06}.png", frame.sequence));
            ImageUtils::save_image(&annotated, &path)?;
            info!(path = %path.display(), "Visualization saved");
        }
        Ok(())
    }
}

/// What one run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub detections: u64,
    pub save_failures: u64,
    pub last_fps: u32,
    pub reports_for_user: usize,
    pub pending_after_session: usize,
    pub sync: Option<SyncReport>,
}

pub fn run(config: &AppConfig) -> anyhow::Result<RunSummary> {
    let backend = FileBackend::new(&config.data_dir)
        .with_context(|| format!("Failed to open data directory: {:?}", config.data_dir))?;
    let store = Arc::new(LocalReportStore::initialize(backend, SeedPolicy::Demo)?);

    let user = store
        .find_user_by_email(&config.user_email)
        .with_context(|| format!("No registered user with e-mail '{}'", config.user_email))?;

    let connectivity = Connectivity::new(config.online);
    let coordinator = Arc::new(OfflineSyncCoordinator::new(
        store.clone(),
        Arc::new(LoggingRemote),
        connectivity.clone(),
    ));
    let service = ReportService::new(store.clone(), coordinator.clone());

    let (width, height) = config.camera_size;
    let mut session = CaptureSession::new(SyntheticCamera::new(width, height));
    session
        .start()
        .map_err(|e| anyhow::anyhow!("{e}. {}", e.guidance()))?;

    if let Some(dir) = &config.overlay_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create overlay directory: {:?}", dir))?;
    }

    let recorder = ReportRecorder::new(store.clone(), &user, connectivity.clone())
        .with_location(Box::new(FixedLocation(config.location)))
        .with_snapshot(config.snapshot.clone());
    let mut sink = PipelineSink {
        recorder,
        renderer: AnnotationRenderer::new(config.overlay.clone()),
        overlay_dir: config.overlay_dir.clone(),
    };

    let detector = SimulatedDetector::new(config.detection.clone());
    let mut scheduler = FrameScheduler::new(detector, config.refresh_hz);
    let mut display = FixedRateDisplay::new(config.refresh_hz);

    info!(user = %user.name, online = config.online, frames = config.frames, "Detection started");
    scheduler.set_detecting(true);
    scheduler.run(&mut display, &mut session, &mut sink, config.frames);
    let last_fps = scheduler.fps();
    let stats = scheduler.stats().clone();
    scheduler.set_detecting(false);
    session.stop();

    info!(
        ticks = stats.ticks,
        detections = stats.detections,
        save_failures = stats.save_failures,
        deadline_misses = stats.deadline_misses,
        fps = last_fps,
        "Detection stopped"
    );

    let pending_after_session = store.pending().len();
    let sync = if config.sync_on_exit {
        if connectivity.is_online() {
            Some(coordinator.sync_pending()?)
        } else {
            coordinator.connectivity_changed(true)?
        }
    } else {
        None
    };

    let reports_for_user = service.history_for_user(&user.id).len();
    info!(
        reports = reports_for_user,
        total = service.get_all_reports().len(),
        pending = store.pending().len(),
        "Report history"
    );

    Ok(RunSummary {
        ticks: stats.ticks,
        detections: stats.detections,
        save_failures: stats.save_failures,
        last_fps,
        reports_for_user,
        pending_after_session,
        sync,
    })
}
