use std::time::{Duration, Instant};

use crate::assets::CancelToken;
use crate::error::FrameError;
use crate::params::ParameterSet;
use crate::surface::RenderSurface;

/// Abstraction over where animation time comes from.
pub trait Clock: Send {
    /// Seconds since the clock's origin.
    fn elapsed_seconds(&self) -> f32;
    /// Moves the origin to now.
    fn reset(&mut self);
}

/// Clock backed by the monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed_seconds(&self) -> f32 {
        self.origin.elapsed().as_secs_f32()
    }

    fn reset(&mut self) {
        self.origin = Instant::now();
    }
}

/// Clock that always reports the same timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    seconds: f32,
}

impl FixedClock {
    pub fn new(seconds: f32) -> Self {
        Self { seconds }
    }
}

impl Clock for FixedClock {
    fn elapsed_seconds(&self) -> f32 {
        self.seconds
    }

    fn reset(&mut self) {}
}

/// Anything that can draw one frame from a parameter snapshot.
pub trait FrameSink {
    fn render_frame(
        &mut self,
        elapsed_seconds: f32,
        params: &ParameterSet,
        surface: &RenderSurface,
    ) -> Result<(), FrameError>;
}

/// Cloneable stop switch for a running [`RenderLoop`].
#[derive(Debug, Clone, Default)]
pub struct RenderHandle {
    token: CancelToken,
}

impl RenderHandle {
    /// After this returns the loop issues no further draws.
    ///
    /// Only the flag is set here. An [`crate::Animation`] releases its GPU
    /// resources on its next `frame()` call; hosts that stop driving frames
    /// should call [`crate::Animation::stop`] instead.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of a single [`RenderLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    Stopped,
}

/// Drives one draw per host frame callback.
///
/// The loop never schedules itself: the host calls [`RenderLoop::tick`] once
/// per display refresh and stops calling it when `Stopped` comes back.
pub struct RenderLoop {
    clock: Box<dyn Clock>,
    handle: RenderHandle,
    stats: FrameStats,
}

impl RenderLoop {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            handle: RenderHandle::default(),
            stats: FrameStats::new(),
        }
    }

    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_stopped()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Re-arms a stopped loop with a fresh handle and clock origin.
    ///
    /// Handles issued before the restart stay stopped.
    pub fn restart(&mut self) -> RenderHandle {
        self.handle.stop();
        self.handle = RenderHandle::default();
        self.clock.reset();
        self.stats = FrameStats::new();
        tracing::debug!("render loop restarted");
        self.handle()
    }

    pub fn tick<S>(
        &mut self,
        sink: &mut S,
        params: &ParameterSet,
        surface: &RenderSurface,
    ) -> Result<TickOutcome, FrameError>
    where
        S: FrameSink + ?Sized,
    {
        if self.handle.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }
        let elapsed = self.clock.elapsed_seconds();
        sink.render_frame(elapsed, params, surface)?;
        self.stats.record(elapsed);
        Ok(TickOutcome::Rendered)
    }
}

struct FrameStats {
    window_start: Instant,
    window_frames: u32,
    total_frames: u64,
}

impl FrameStats {
    const WINDOW: Duration = Duration::from_secs(1);

    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            window_frames: 0,
            total_frames: 0,
        }
    }

    fn record(&mut self, elapsed_seconds: f32) {
        self.window_frames += 1;
        self.total_frames += 1;
        let window = self.window_start.elapsed();
        if window >= Self::WINDOW {
            let fps = self.window_frames as f64 / window.as_secs_f64();
            tracing::debug!(
                fps = format_args!("{fps:.1}"),
                frames = self.total_frames,
                elapsed = format_args!("{elapsed_seconds:.2}"),
                "render stats"
            );
            self.window_start = Instant::now();
            self.window_frames = 0;
        }
    }
}
