//! Wind-sway compositor for the bamboo scene.
//!
//! A foreground sprite is displaced by a multi-harmonic sway, chroma keyed
//! against a bright matte, colour graded and blended over a zoomable
//! background. The flow is:
//!
//! ```text
//!   host (bamboo / window)
//!          │ ParameterSet, RenderSurface
//!          ▼
//!   Animation::frame ──▶ RenderLoop::tick ──▶ Compositor::render ──▶ wgpu
//!          ▲                                        │
//!          │ apply_preset / resize_to               └─▶ TextureCache::poll ◀── decode worker
//! ```
//!
//! [`shading`] mirrors the fragment stage on the CPU so the maths can be
//! tested directly and [`still::render_still`] can export frames without a GPU.

mod animation;
mod assets;
mod compile;
mod error;
mod gpu;
mod params;
mod presets;
mod runtime;
pub mod shading;
pub mod still;
mod surface;
mod types;
mod window;

pub use animation::Animation;
pub use assets::{spawn_decode, AssetRef, CancelToken, DecodedImage, LoadState, PendingDecode};
pub use compile::{
    link_stages, validate_program, validate_stage, FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL,
};
pub use error::{CompositorError, FrameError, ShaderStageKind};
pub use gpu::Compositor;
pub use params::ParameterSet;
pub use presets::{
    preset, presets, select_preset_for_wind_speed, PresetName, WindPreset, FALLBACK_PRESET,
    WIND_PRESETS,
};
pub use runtime::{
    Clock, FixedClock, FrameSink, RenderHandle, RenderLoop, SystemClock, TickOutcome,
};
pub use surface::{
    clamp_device_pixel_ratio, RenderSurface, ASPECT_HEIGHT, ASPECT_WIDTH, MAX_CSS_WIDTH,
    MIN_CSS_WIDTH, UNMEASURED_CSS_WIDTH,
};
pub use types::{Antialiasing, CompositorOptions};
pub use window::{run_preview, PreviewOptions};
