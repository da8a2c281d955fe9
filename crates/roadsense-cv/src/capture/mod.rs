//! Camera acquisition
//!
//! A [`CaptureSession`] owns the camera device for one continuous lifetime.
//! Acquisition walks an ordered list of [`AcquisitionStrategy`] values, each
//! attempt answering with a tagged [`Acquisition`], and classifies the last
//! failure into a [`CameraError`].

pub mod session;
pub mod synthetic;

pub use session::{CaptureSession, CaptureState, SessionError};
pub use synthetic::SyntheticCamera;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One decoded frame from the live source.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    /// Monotonic frame counter assigned by the stream
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width(), self.height())
    }
}

/// Native frame dimensions of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions known and non-zero
    pub fn is_sized(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacingMode {
    /// Outward, towards the road
    Environment,
    /// Towards the operator
    User,
    /// Whatever camera is available
    Any,
}

/// What to ask the platform for. Audio is never requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub facing: FacingMode,
}

/// One step of the acquisition fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStrategy {
    pub name: String,
    pub constraints: CameraConstraints,
}

impl AcquisitionStrategy {
    pub fn new(name: impl Into<String>, facing: FacingMode) -> Self {
        Self {
            name: name.into(),
            constraints: CameraConstraints { facing },
        }
    }

    /// Environment-facing camera first, then any camera at all.
    pub fn default_chain() -> Vec<Self> {
        vec![
            Self::new("environment camera", FacingMode::Environment),
            Self::new("any camera", FacingMode::Any),
        ]
    }
}

/// Raw failure kinds a platform reports for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFailure {
    /// The user or system refused camera access
    NotAllowed,
    /// No device matched the request
    NotFound,
    /// Anything else, with the platform's message
    Other(String),
}

impl DeviceFailure {
    /// Map a raw platform failure onto the session error taxonomy.
    pub fn classify(self) -> CameraError {
        match self {
            DeviceFailure::NotAllowed => CameraError::PermissionDenied,
            DeviceFailure::NotFound => CameraError::DeviceNotFound,
            DeviceFailure::Other(message) => CameraError::Unknown(message),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFailure::NotAllowed => write!(f, "not allowed"),
            DeviceFailure::NotFound => write!(f, "not found"),
            DeviceFailure::Other(message) => write!(f, "{message}"),
        }
    }
}

/// Tagged result of one acquisition attempt.
pub enum Acquisition {
    Success(Box<dyn CameraStream>),
    Failure(DeviceFailure),
}

/// Why the platform cannot provide a camera at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    NoCameraApi,
    InsecureContext,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedReason::NoCameraApi => write!(f, "no camera capability"),
            UnsupportedReason::InsecureContext => write!(f, "not a secure execution context"),
        }
    }
}

/// Camera failure taxonomy surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// Fatal for the session, no automatic retry
    #[error("camera unsupported: {0}")]
    Unsupported(UnsupportedReason),

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device found")]
    DeviceNotFound,

    #[error("camera error: {0}")]
    Unknown(String),
}

impl CameraError {
    /// Operator-facing guidance for the failure.
    pub fn guidance(&self) -> String {
        match self {
            CameraError::Unsupported(UnsupportedReason::InsecureContext) => {
                "Camera access requires a secure HTTPS connection or localhost.".to_string()
            }
            CameraError::Unsupported(UnsupportedReason::NoCameraApi) => {
                "Camera API is not supported on this platform.".to_string()
            }
            CameraError::PermissionDenied => {
                "Camera permission was denied. Allow camera access in the system or browser settings, then retry."
                    .to_string()
            }
            CameraError::DeviceNotFound => {
                "No camera device found on this device. Attach a camera, then retry.".to_string()
            }
            CameraError::Unknown(message) => message.clone(),
        }
    }

    /// Whether an operator-triggered retry can help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CameraError::Unsupported(_))
    }
}

/// Host capabilities checked before any acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSupport {
    pub camera_api: bool,
    pub secure_context: bool,
}

impl Default for PlatformSupport {
    fn default() -> Self {
        Self {
            camera_api: true,
            secure_context: true,
        }
    }
}

/// Source of camera devices.
pub trait CameraPlatform {
    fn support(&self) -> PlatformSupport;

    /// Try to acquire a device matching `constraints`.
    fn request(&mut self, constraints: &CameraConstraints) -> Acquisition;
}

/// An acquired, exclusively held camera device.
pub trait CameraStream {
    /// Native frame dimensions
    fn dimensions(&self) -> FrameSize;

    /// Current frame, `None` while no frame is ready yet.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Release the device. Must be safe to call more than once.
    fn release(&mut self);
}
