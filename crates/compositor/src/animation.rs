use crate::assets::AssetRef;
use crate::error::{CompositorError, FrameError};
use crate::gpu::Compositor;
use crate::params::ParameterSet;
use crate::presets::{preset, select_preset_for_wind_speed, PresetName};
use crate::runtime::{Clock, FrameSink, RenderHandle, RenderLoop, SystemClock, TickOutcome};
use crate::surface::{RenderSurface, ASPECT_WIDTH};
use crate::types::CompositorOptions;

struct Session {
    sink: Box<dyn FrameSink>,
    render_loop: RenderLoop,
}

/// The host-facing animation: current parameters, surface size and the
/// running render session, if any.
///
/// Parameter and preset changes only touch the [`ParameterSet`]; the next
/// [`Animation::frame`] uploads them. GPU resources are created once in
/// [`Animation::start`] and released by [`Animation::stop`].
pub struct Animation {
    params: ParameterSet,
    active_preset: PresetName,
    container_css_width: f64,
    device_pixel_ratio: f64,
    surface: RenderSurface,
    session: Option<Session>,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Preset last applied, for highlighting in host UIs.
    pub fn active_preset(&self) -> PresetName {
        self.active_preset
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Replaces all nine knobs at once; rejected sets leave the current one in place.
    pub fn set_parameter_set(&mut self, params: ParameterSet) -> Result<(), CompositorError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Sets amplitude and speed from the named preset.
    pub fn apply_preset(&mut self, name: PresetName) {
        let wind = preset(name);
        self.params = self.params.with_wind(wind);
        self.active_preset = name;
        tracing::info!(
            preset = %name,
            amplitude = wind.amplitude,
            speed = wind.speed,
            "applied wind preset"
        );
    }

    /// Picks the preset for an observed wind speed and applies it.
    pub fn apply_wind_speed(&mut self, wind_speed_kmh: f32) -> PresetName {
        let name = select_preset_for_wind_speed(wind_speed_kmh);
        tracing::debug!(wind_speed_kmh, preset = %name, "selected preset for wind speed");
        self.apply_preset(name);
        name
    }

    /// Recomputes the surface for a new container width.
    pub fn resize_to(&mut self, container_css_width: f64) -> &RenderSurface {
        self.container_css_width = container_css_width;
        self.refresh_surface()
    }

    /// Recomputes the surface for a new display density.
    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) -> &RenderSurface {
        self.device_pixel_ratio = device_pixel_ratio;
        self.refresh_surface()
    }

    fn refresh_surface(&mut self) -> &RenderSurface {
        let surface = RenderSurface::resize(self.container_css_width, self.device_pixel_ratio);
        if surface != self.surface {
            tracing::debug!(
                css_width = surface.css_width(),
                css_height = surface.css_height(),
                pixel_width = surface.pixel_width(),
                pixel_height = surface.pixel_height(),
                "render surface resized"
            );
            self.surface = surface;
        }
        &self.surface
    }

    /// Builds the GPU compositor for `target` and starts rendering.
    ///
    /// Any running session is stopped first. Initialisation failures are
    /// returned here and leave the animation stopped.
    pub fn start<T>(
        &mut self,
        target: T,
        foreground: AssetRef,
        background: AssetRef,
        options: &CompositorOptions,
    ) -> Result<RenderHandle, CompositorError>
    where
        T: Into<wgpu::SurfaceTarget<'static>>,
    {
        self.stop();
        let compositor = Compositor::new(target, &self.surface, foreground, background, options)
            .inspect_err(|err| tracing::error!(error = %err, "failed to start compositor"))?;
        tracing::info!(
            pixel_size = ?compositor.pixel_size(),
            sample_count = compositor.sample_count(),
            "compositor started"
        );
        Ok(self.start_with_sink(Box::new(compositor), Box::new(SystemClock::new())))
    }

    /// Starts rendering into an arbitrary sink, e.g. an offscreen recorder.
    pub fn start_with_sink(
        &mut self,
        sink: Box<dyn FrameSink>,
        clock: Box<dyn Clock>,
    ) -> RenderHandle {
        self.stop();
        let render_loop = RenderLoop::new(clock);
        let handle = render_loop.handle();
        self.session = Some(Session { sink, render_loop });
        handle
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.render_loop.is_running())
    }

    /// Draws one frame with the current parameters and surface.
    ///
    /// Once the session's handle has been stopped this releases the
    /// session and keeps returning `Stopped`.
    pub fn frame(&mut self) -> Result<TickOutcome, FrameError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(TickOutcome::Stopped);
        };
        let params = self.params;
        let outcome = session
            .render_loop
            .tick(session.sink.as_mut(), &params, &self.surface)?;
        if outcome == TickOutcome::Stopped {
            self.session = None;
            tracing::debug!("render session released");
        }
        Ok(outcome)
    }

    /// Stops the loop and drops GPU resources, cancelling pending decodes.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.render_loop.stop();
            tracing::debug!("render session stopped");
        }
    }
}

impl Default for Animation {
    fn default() -> Self {
        let container_css_width = f64::from(ASPECT_WIDTH);
        let device_pixel_ratio = 1.0;
        Self {
            params: ParameterSet::default(),
            active_preset: PresetName::Breeze,
            container_css_width,
            device_pixel_ratio,
            surface: RenderSurface::resize(container_css_width, device_pixel_ratio),
            session: None,
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runtime::FixedClock;

    type Frames = Arc<Mutex<Vec<(f32, ParameterSet, (u32, u32))>>>;

    struct RecordingSink(Frames);

    impl FrameSink for RecordingSink {
        fn render_frame(
            &mut self,
            elapsed_seconds: f32,
            params: &ParameterSet,
            surface: &RenderSurface,
        ) -> Result<(), FrameError> {
            self.0
                .lock()
                .expect("frames lock")
                .push((elapsed_seconds, *params, surface.pixel_size()));
            Ok(())
        }
    }

    fn started(time: f32) -> (Animation, RenderHandle, Frames) {
        let frames = Frames::default();
        let mut animation = Animation::new();
        let handle = animation.start_with_sink(
            Box::new(RecordingSink(frames.clone())),
            Box::new(FixedClock::new(time)),
        );
        (animation, handle, frames)
    }

    #[test]
    fn presets_only_touch_wind_fields() {
        let mut animation = Animation::new();
        let before = *animation.params();
        animation.apply_preset(PresetName::Storm);
        let after = *animation.params();
        assert_eq!(after.amplitude, 1.0);
        assert_eq!(after.speed, 20.0);
        assert_eq!(after.brightness, before.brightness);
        assert_eq!(after.chroma_threshold, before.chroma_threshold);
        assert_eq!(after.bg_scale, before.bg_scale);
        assert_eq!(animation.active_preset(), PresetName::Storm);
    }

    #[test]
    fn wind_speed_applies_the_selected_preset() {
        let mut animation = Animation::new();
        assert_eq!(animation.apply_wind_speed(20.0), PresetName::Windy);
        assert_eq!(animation.params().amplitude, 0.14);
        assert_eq!(animation.apply_wind_speed(250.0), PresetName::Calm);
        assert_eq!(animation.params().speed, 0.5);
    }

    #[test]
    fn invalid_parameter_sets_are_rejected() {
        let mut animation = Animation::new();
        let bad = ParameterSet {
            bg_scale: 0.0,
            ..ParameterSet::default()
        };
        assert!(matches!(
            animation.set_parameter_set(bad),
            Err(CompositorError::InvalidParameter { field: "bg_scale", .. })
        ));
        assert_eq!(animation.params().bg_scale, 1.1);
    }

    #[test]
    fn surface_tracks_width_and_density() {
        let mut animation = Animation::new();
        assert_eq!(animation.surface().pixel_size(), (1200, 800));
        animation.resize_to(600.0);
        assert_eq!(animation.surface().pixel_size(), (600, 400));
        animation.set_device_pixel_ratio(2.0);
        assert_eq!(animation.surface().pixel_size(), (1200, 800));
        assert_eq!(animation.surface().css_height(), 400);
    }

    #[test]
    fn frames_see_the_latest_parameters_and_surface() {
        let (mut animation, _handle, frames) = started(4.0);
        animation.frame().expect("frame");
        animation.apply_preset(PresetName::Windy);
        animation.resize_to(900.0);
        animation.frame().expect("frame");

        let frames = frames.lock().expect("frames lock");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, 4.0);
        assert_eq!(frames[0].1.speed, 1.5);
        assert_eq!(frames[1].1.speed, 3.5);
        assert_eq!(frames[1].2, (900, 600));
    }

    #[test]
    fn no_frames_after_stop() {
        let (mut animation, handle, frames) = started(0.0);
        assert_eq!(animation.frame().expect("frame"), TickOutcome::Rendered);
        animation.stop();
        assert!(handle.is_stopped());
        assert!(!animation.is_running());
        assert_eq!(animation.frame().expect("frame"), TickOutcome::Stopped);
        assert_eq!(frames.lock().expect("frames lock").len(), 1);
    }

    #[test]
    fn stopping_through_the_handle_releases_the_session() {
        let (mut animation, handle, frames) = started(0.0);
        handle.stop();
        assert!(!animation.is_running());
        // The sink is still held until the next frame call.
        assert_eq!(Arc::strong_count(&frames), 2);
        assert_eq!(animation.frame().expect("frame"), TickOutcome::Stopped);
        assert_eq!(Arc::strong_count(&frames), 1);
        assert_eq!(animation.frame().expect("frame"), TickOutcome::Stopped);
        assert!(frames.lock().expect("frames lock").is_empty());
    }

    #[test]
    fn restarting_stops_the_previous_session() {
        let (mut animation, first, _) = started(0.0);
        let frames = Frames::default();
        let second = animation.start_with_sink(
            Box::new(RecordingSink(frames.clone())),
            Box::new(FixedClock::new(1.0)),
        );
        assert!(first.is_stopped());
        assert!(!second.is_stopped());
        animation.frame().expect("frame");
        assert_eq!(frames.lock().expect("frames lock").len(), 1);
    }
}
