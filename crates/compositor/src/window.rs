use std::sync::Arc;

use anyhow::{anyhow, Result};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::animation::Animation;
use crate::assets::AssetRef;
use crate::error::FrameError;
use crate::presets::{presets, PresetName};
use crate::runtime::TickOutcome;
use crate::surface::{MAX_CSS_WIDTH, MIN_CSS_WIDTH};
use crate::types::CompositorOptions;

/// What the preview window should show.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub title: String,
    pub foreground: AssetRef,
    pub background: AssetRef,
    /// Initial window width in logical pixels.
    pub css_width: f64,
    pub compositor: CompositorOptions,
}

/// Opens a window and runs `animation` in it until closed or Escape is pressed.
///
/// Keys `1` to `5` switch between the wind presets in table order.
pub fn run_preview(mut animation: Animation, options: PreviewOptions) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let initial = animation.resize_to(options.css_width);
    let window = WindowBuilder::new()
        .with_title(options.title.as_str())
        .with_inner_size(LogicalSize::new(initial.css_width(), initial.css_height()))
        .with_min_inner_size(LogicalSize::new(MIN_CSS_WIDTH, MIN_CSS_WIDTH * 2 / 3))
        .with_max_inner_size(LogicalSize::new(MAX_CSS_WIDTH, MAX_CSS_WIDTH * 2 / 3))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);
    animation.set_device_pixel_ratio(window.scale_factor());

    animation.start(
        window.clone(),
        options.foreground,
        options.background,
        &options.compositor,
    )?;
    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            let Event::WindowEvent { window_id, event } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    animation.stop();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => match key_action(&event) {
                    Some(KeyAction::Quit) => {
                        animation.stop();
                        elwt.exit();
                    }
                    Some(KeyAction::Preset(name)) => animation.apply_preset(name),
                    None => {}
                },
                WindowEvent::Resized(size) => {
                    let logical = size.to_logical::<f64>(window.scale_factor());
                    let surface = animation.resize_to(logical.width);
                    if (logical.height - f64::from(surface.css_height())).abs() >= 1.0 {
                        let _ = window.request_inner_size(LogicalSize::new(
                            surface.css_width(),
                            surface.css_height(),
                        ));
                    }
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    animation.set_device_pixel_ratio(scale_factor);
                    window.request_redraw();
                }
                WindowEvent::RedrawRequested => match animation.frame() {
                    Ok(TickOutcome::Rendered) => window.request_redraw(),
                    Ok(TickOutcome::Stopped) => elwt.exit(),
                    Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        tracing::error!("surface out of memory; closing preview");
                        animation.stop();
                        elwt.exit();
                    }
                    Err(err @ FrameError::SurfaceTooLarge { .. }) => {
                        // Wait for the next resize instead of retrying every frame.
                        tracing::warn!(error = %err, "skipped frame");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "skipped frame");
                        window.request_redraw();
                    }
                },
                _ => {}
            }
            elwt.set_control_flow(ControlFlow::Wait);
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Preset(PresetName),
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match &event.logical_key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Character(value) => preset_for_digit(value.as_str()).map(KeyAction::Preset),
        _ => None,
    }
}

fn preset_for_digit(value: &str) -> Option<PresetName> {
    let digit: usize = value.parse().ok()?;
    presets()
        .get(digit.checked_sub(1)?)
        .map(|preset| preset.name)
}
