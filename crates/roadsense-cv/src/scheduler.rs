//! Per-refresh detection loop
//!
//! A single-threaded cooperative scheduler with at most one outstanding
//! tick. Each tick reads the current frame, runs the detector exactly once
//! and hands positive detections to a [`DetectionSink`]. Turning detection
//! off drops the pending tick token, so nothing scheduled can fire
//! afterwards.

use crate::capture::{CameraPlatform, CaptureSession, Frame};
use crate::detection::{DetectionResult, Detector};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Receives positive detections, e.g. to persist them.
pub trait DetectionSink {
    fn on_detection(&mut self, detection: &DetectionResult, frame: &Frame) -> anyhow::Result<()>;
}

/// Sink that drops every detection
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl DetectionSink for DiscardSink {
    fn on_detection(&mut self, _detection: &DetectionResult, _frame: &Frame) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Source of display refresh signals.
pub trait DisplayLink {
    /// Block until the next refresh and return its timestamp in milliseconds.
    fn wait_for_refresh(&mut self) -> f64;
}

/// Display link pacing itself to a fixed refresh rate.
pub struct FixedRateDisplay {
    interval: Duration,
    origin: Instant,
    next: Instant,
}

impl FixedRateDisplay {
    pub fn new(refresh_hz: u32) -> Self {
        let now = Instant::now();
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1))),
            origin: now,
            next: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl DisplayLink for FixedRateDisplay {
    fn wait_for_refresh(&mut self) -> f64 {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        let fired = Instant::now();
        self.next = fired.max(self.next) + self.interval;
        fired.duration_since(self.origin).as_secs_f64() * 1000.0
    }
}

/// Handle for one scheduled tick. Only the newest token is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken(u64);

/// Why a tick did no detection work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SessionInactive,
    NoFrame,
    FrameNotSized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Token was stale or detection is off; nothing happened
    Cancelled,
    /// Tick ran but skipped detection
    Skipped(SkipReason),
    /// Detector ran once on the current frame
    Processed {
        detection: Option<DetectionResult>,
        /// `Some(false)` when the sink failed
        saved: Option<bool>,
    },
}

/// Loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub detections: u64,
    pub save_failures: u64,
    /// Detector calls slower than one refresh interval
    pub deadline_misses: u64,
    pub worst_case: Duration,
}

pub struct FrameScheduler<D: Detector> {
    detector: D,
    detecting: bool,
    pending: Option<TickToken>,
    next_token: u64,
    last_tick_ms: Option<f64>,
    fps: u32,
    last_detection: Option<DetectionResult>,
    frame_budget: Duration,
    stats: SchedulerStats,
}

impl<D: Detector> FrameScheduler<D> {
    /// `refresh_hz` sets the per-tick budget used for deadline accounting
    pub fn new(detector: D, refresh_hz: u32) -> Self {
        Self {
            detector,
            detecting: false,
            pending: None,
            next_token: 0,
            last_tick_ms: None,
            fps: 0,
            last_detection: None,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1))),
            stats: SchedulerStats::default(),
        }
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    /// Last published throughput, 0 while not detecting
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Detection kept for the overlay until the next positive one
    pub fn last_detection(&self) -> Option<&DetectionResult> {
        self.last_detection.as_ref()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Token of the tick waiting to run, if any
    pub fn pending_tick(&self) -> Option<TickToken> {
        self.pending
    }

    /// Toggle the external "detecting" flag.
    ///
    /// Switching off cancels the pending tick and resets throughput and
    /// the last detection immediately.
    pub fn set_detecting(&mut self, detecting: bool) {
        if detecting == self.detecting {
            return;
        }
        self.detecting = detecting;

        if detecting {
            debug!("Detection started");
            self.schedule();
        } else {
            debug!("Detection stopped");
            self.pending = None;
            self.last_tick_ms = None;
            self.fps = 0;
            self.last_detection = None;
        }
    }

    /// Run the tick identified by `token` at display time `now_ms`.
    ///
    /// The next tick is scheduled before returning, so exactly one tick is
    /// outstanding while detecting.
    pub fn tick<P, S>(
        &mut self,
        token: TickToken,
        now_ms: f64,
        session: &mut CaptureSession<P>,
        sink: &mut S,
    ) -> TickOutcome
    where
        P: CameraPlatform,
        S: DetectionSink + ?Sized,
    {
        if !self.detecting || self.pending != Some(token) {
            return TickOutcome::Cancelled;
        }
        self.pending = None;
        self.stats.ticks += 1;

        let outcome = self.run_tick(now_ms, session, sink);
        self.schedule();
        outcome
    }

    /// Drive up to `max_ticks` ticks from `display`, stopping early if
    /// detection is switched off.
    pub fn run<P, S, L>(&mut self, display: &mut L, session: &mut CaptureSession<P>, sink: &mut S, max_ticks: u64)
    where
        P: CameraPlatform,
        S: DetectionSink + ?Sized,
        L: DisplayLink + ?Sized,
    {
        for _ in 0..max_ticks {
            let Some(token) = self.pending else {
                break;
            };
            let now_ms = display.wait_for_refresh();
            self.tick(token, now_ms, session, sink);
        }
    }

    fn run_tick<P, S>(&mut self, now_ms: f64, session: &mut CaptureSession<P>, sink: &mut S) -> TickOutcome
    where
        P: CameraPlatform,
        S: DetectionSink + ?Sized,
    {
        if !session.is_active() {
            return TickOutcome::Skipped(SkipReason::SessionInactive);
        }
        let Some(frame) = session.read_frame() else {
            return TickOutcome::Skipped(SkipReason::NoFrame);
        };
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return TickOutcome::Skipped(SkipReason::FrameNotSized);
        }

        self.update_fps(now_ms);

        let started = Instant::now();
        let detection = self.detector.detect(&frame, width, height);
        self.account_latency(started.elapsed());

        let Some(detection) = detection else {
            return TickOutcome::Processed {
                detection: None,
                saved: None,
            };
        };

        self.stats.detections += 1;
        self.last_detection = Some(detection.clone());

        let saved = match sink.on_detection(&detection, &frame) {
            Ok(()) => true,
            Err(e) => {
                self.stats.save_failures += 1;
                warn!(error = %e, "Auto-save failed, detection loop continues");
                false
            }
        };

        TickOutcome::Processed {
            detection: Some(detection),
            saved: Some(saved),
        }
    }

    fn update_fps(&mut self, now_ms: f64) {
        if let Some(fps) = self.last_tick_ms.and_then(|last| fps_for_interval(now_ms - last)) {
            self.fps = fps;
        }
        self.last_tick_ms = Some(now_ms);
    }

    fn account_latency(&mut self, elapsed: Duration) {
        if elapsed > self.frame_budget {
            self.stats.deadline_misses += 1;
        }
        if elapsed > self.stats.worst_case {
            self.stats.worst_case = elapsed;
        }
    }

    fn schedule(&mut self) {
        self.next_token += 1;
        self.pending = Some(TickToken(self.next_token));
    }
}

/// `round(1000 / delta_ms)`, `None` when the interval is unusable
pub fn fps_for_interval(delta_ms: f64) -> Option<u32> {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return None;
    }
    Some((1000.0 / delta_ms).round() as u32)
}
