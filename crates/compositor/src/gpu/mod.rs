//! wgpu side of the compositor.
//!
//! - `context` owns instance/device/surface wiring and swapchain resizes.
//! - `textures` holds the foreground/background handles and their decodes.
//! - `pipeline` builds the composite program, bind group layouts and quad.
//! - `uniforms` mirrors the fragment shader's parameter block.
//! - `state` glues them into [`Compositor`].

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub use state::Compositor;
