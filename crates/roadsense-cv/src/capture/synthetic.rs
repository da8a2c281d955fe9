//! Synthetic camera platform
//!
//! Produces asphalt-coloured frames without any hardware. Clones share the
//! same device state, so a test can keep a handle while the session owns
//! the platform.

use super::{
    Acquisition, CameraConstraints, CameraPlatform, CameraStream, DeviceFailure, FacingMode, Frame,
    FrameSize, PlatformSupport,
};
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct DeviceState {
    size: FrameSize,
    support: PlatformSupport,
    has_environment_camera: bool,
    failure: Option<DeviceFailure>,
    live_streams: usize,
    requests: Vec<FacingMode>,
}

#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    state: Arc<Mutex<DeviceState>>,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                size: FrameSize::new(width, height),
                support: PlatformSupport::default(),
                has_environment_camera: true,
                failure: None,
                live_streams: 0,
                requests: Vec::new(),
            })),
        }
    }

    /// Only a front camera: environment-facing requests fail with `NotFound`
    pub fn without_environment_camera(self) -> Self {
        self.lock().has_environment_camera = false;
        self
    }

    /// Every request fails with `failure`
    pub fn failing_with(self, failure: DeviceFailure) -> Self {
        self.lock().failure = Some(failure);
        self
    }

    pub fn with_support(self, support: PlatformSupport) -> Self {
        self.lock().support = support;
        self
    }

    /// Simulate the device becoming available again
    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// Streams acquired and not yet released
    pub fn live_streams(&self) -> usize {
        self.lock().live_streams
    }

    /// Facing modes requested so far, in order
    pub fn requests(&self) -> Vec<FacingMode> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CameraPlatform for SyntheticCamera {
    fn support(&self) -> PlatformSupport {
        self.lock().support
    }

    fn request(&mut self, constraints: &CameraConstraints) -> Acquisition {
        let mut state = self.lock();
        state.requests.push(constraints.facing);

        if let Some(failure) = state.failure.clone() {
            return Acquisition::Failure(failure);
        }
        if constraints.facing == FacingMode::Environment && !state.has_environment_camera {
            return Acquisition::Failure(DeviceFailure::NotFound);
        }
        // the device is exclusive
        if state.live_streams > 0 {
            return Acquisition::Failure(DeviceFailure::Other("device is busy".to_string()));
        }

        state.live_streams += 1;
        Acquisition::Success(Box::new(SyntheticStream {
            device: Arc::clone(&self.state),
            size: state.size,
            sequence: 0,
            released: false,
        }))
    }
}

struct SyntheticStream {
    device: Arc<Mutex<DeviceState>>,
    size: FrameSize,
    sequence: u64,
    released: bool,
}

impl CameraStream for SyntheticStream {
    fn dimensions(&self) -> FrameSize {
        self.size
    }

    fn read_frame(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        self.sequence += 1;
        Some(Frame::new(asphalt(self.size, self.sequence), self.sequence))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        device.live_streams = device.live_streams.saturating_sub(1);
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Grey road texture drifting one row per frame
fn asphalt(size: FrameSize, sequence: u64) -> RgbaImage {
    let drift = (sequence % 64) as u32;
    RgbaImage::from_fn(size.width, size.height, |x, y| {
        let grain = ((x.wrapping_mul(7) ^ (y + drift).wrapping_mul(13)) % 24) as u8;
        let shade = 72 + grain;
        Rgba([shade, shade, shade.saturating_add(4), 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_have_native_size() {
        let mut camera = SyntheticCamera::new(64, 48);
        let Acquisition::Success(mut stream) = camera.request(&CameraConstraints { facing: FacingMode::Any }) else {
            panic!("synthetic camera should be available");
        };

        let frame = stream.read_frame().unwrap();
        assert_eq!(frame.size(), FrameSize::new(64, 48));
        assert_eq!(stream.read_frame().map(|f| f.sequence), Some(2));

        stream.release();
        assert!(stream.read_frame().is_none());
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_device_is_exclusive() {
        let mut camera = SyntheticCamera::new(64, 48);
        let constraints = CameraConstraints { facing: FacingMode::Any };

        let first = camera.request(&constraints);
        assert!(matches!(first, Acquisition::Success(_)));
        assert!(matches!(camera.request(&constraints), Acquisition::Failure(DeviceFailure::Other(_))));

        drop(first);
        assert!(matches!(camera.request(&constraints), Acquisition::Success(_)));
    }
}
