//! RoadSense Computer Vision Library
//!
//! Live-feed side of the pipeline: camera acquisition with fallback,
//! the per-refresh detection loop, overlay rendering and turning
//! detections into stored reports.

pub mod bbox;
pub mod capture;
pub mod detection;
pub mod overlay;
pub mod recorder;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use bbox::BBox;
pub use capture::{CameraError, CaptureSession, CaptureState, Frame};
pub use detection::{DetectionConfig, DetectionResult, Detector, SimulatedDetector};
pub use overlay::{AnnotationRenderer, Overlay, OverlayStyle};
pub use recorder::{RecordError, ReportRecorder};
pub use scheduler::{DetectionSink, FrameScheduler, TickOutcome};

// Error handling
pub type Result<T> = anyhow::Result<T>;
