//! Capture session state machine
//!
//! `Uninitialized -> Requesting -> Active | Error`, with `Stopped` reachable
//! from anywhere and `Error -> Requesting` only through [`CaptureSession::retry`].
//! The device is released on every exit path, including drop.

use super::{
    AcquisitionStrategy, Acquisition, CameraError, CameraPlatform, CameraStream, Frame, FrameSize,
    UnsupportedReason,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Uninitialized,
    Requesting,
    Active,
    Error(CameraError),
    Stopped,
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Uninitialized => "uninitialized",
            CaptureState::Requesting => "requesting",
            CaptureState::Active => "active",
            CaptureState::Error(_) => "error",
            CaptureState::Stopped => "stopped",
        }
    }
}

/// Misuse of the session API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("retry is only valid from the error state (current: {0})")]
    InvalidState(&'static str),

    #[error(transparent)]
    Camera(#[from] CameraError),
}

pub struct CaptureSession<P: CameraPlatform> {
    platform: P,
    strategies: Vec<AcquisitionStrategy>,
    state: CaptureState,
    stream: Option<Box<dyn CameraStream>>,
    frame_size: Option<FrameSize>,
}

impl<P: CameraPlatform> CaptureSession<P> {
    /// Create a session using the default environment-then-any chain
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            strategies: AcquisitionStrategy::default_chain(),
            state: CaptureState::Uninitialized,
            stream: None,
            frame_size: None,
        }
    }

    /// Replace the acquisition fallback chain
    pub fn with_strategies(mut self, strategies: Vec<AcquisitionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CaptureState::Active
    }

    /// The last classified failure, if the session is in `Error`
    pub fn error(&self) -> Option<&CameraError> {
        match &self.state {
            CaptureState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Native frame dimensions of the active stream
    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame_size
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Acquire the camera.
    ///
    /// Any device still held is released before a new request is issued.
    pub fn start(&mut self) -> Result<FrameSize, CameraError> {
        self.release_stream();

        let support = self.platform.support();
        let unsupported = if !support.secure_context {
            Some(UnsupportedReason::InsecureContext)
        } else if !support.camera_api {
            Some(UnsupportedReason::NoCameraApi)
        } else {
            None
        };
        if let Some(reason) = unsupported {
            return Err(self.fail(CameraError::Unsupported(reason)));
        }

        self.transition(CaptureState::Requesting);

        let strategies = self.strategies.clone();
        let mut last_failure = None;
        for strategy in &strategies {
            debug!(strategy = %strategy.name, "Requesting camera");
            match self.platform.request(&strategy.constraints) {
                Acquisition::Success(stream) => {
                    let size = stream.dimensions();
                    info!(
                        strategy = %strategy.name,
                        width = size.width,
                        height = size.height,
                        "Camera acquired"
                    );
                    self.stream = Some(stream);
                    self.frame_size = Some(size);
                    self.transition(CaptureState::Active);
                    return Ok(size);
                }
                Acquisition::Failure(failure) => {
                    warn!(strategy = %strategy.name, %failure, "Camera request failed, trying next strategy");
                    last_failure = Some(failure);
                }
            }
        }

        let error = last_failure
            .map(|f| f.classify())
            .unwrap_or_else(|| CameraError::Unknown("no acquisition strategy configured".to_string()));
        Err(self.fail(error))
    }

    /// Release the device. Safe from any state and safe to repeat.
    pub fn stop(&mut self) {
        self.release_stream();
        self.transition(CaptureState::Stopped);
    }

    /// Stop, then start again. Only valid from `Error`.
    pub fn retry(&mut self) -> Result<FrameSize, SessionError> {
        if !matches!(self.state, CaptureState::Error(_)) {
            return Err(SessionError::InvalidState(self.state.name()));
        }
        self.stop();
        Ok(self.start()?)
    }

    /// Current frame while `Active`
    pub fn read_frame(&mut self) -> Option<Frame> {
        if !self.is_active() {
            return None;
        }
        self.stream.as_mut().and_then(|s| s.read_frame())
    }

    fn fail(&mut self, error: CameraError) -> CameraError {
        warn!(%error, guidance = %error.guidance(), "Camera unavailable");
        self.transition(CaptureState::Error(error.clone()));
        error
    }

    fn transition(&mut self, next: CaptureState) {
        if self.state != next {
            debug!(from = self.state.name(), to = next.name(), "Capture state change");
            self.state = next;
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            info!("Camera released");
        }
        self.frame_size = None;
    }
}

impl<P: CameraPlatform> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
