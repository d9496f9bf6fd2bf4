use crate::assets::AssetRef;
use crate::compile::validate_program;
use crate::error::{CompositorError, FrameError};
use crate::params::ParameterSet;
use crate::runtime::FrameSink;
use crate::surface::RenderSurface;
use crate::types::CompositorOptions;

use super::context::GpuContext;
use super::pipeline::{CompositePipeline, QUAD_VERTEX_COUNT};
use super::textures::TextureCache;
use super::uniforms::CompositeUniforms;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn create(context: &GpuContext) -> Option<Self> {
        if context.sample_count <= 1 {
            return None;
        }
        let (width, height) = context.pixel_size();
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: context.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: context.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some(Self {
            _texture: texture,
            view,
        })
    }
}

/// GPU side of the animation: one program, one quad, two textures.
///
/// Everything is built once in [`Compositor::new`]. Per frame only the
/// uniform buffer is written; the swapchain and MSAA target are rebuilt
/// when the requested pixel size changes, and the texture bind group when
/// a decode lands.
pub struct Compositor {
    context: GpuContext,
    pipeline: CompositePipeline,
    textures: TextureCache,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    multisample_target: Option<MultisampleTarget>,
}

impl Compositor {
    pub fn new<T>(
        target: T,
        surface: &RenderSurface,
        foreground: AssetRef,
        background: AssetRef,
        options: &CompositorOptions,
    ) -> Result<Self, CompositorError>
    where
        T: Into<wgpu::SurfaceTarget<'static>>,
    {
        validate_program()?;

        let context = GpuContext::new(target, surface.pixel_size(), options)?;
        let pipeline =
            CompositePipeline::new(&context.device, context.config.format, context.sample_count)?;
        let textures = TextureCache::new(&context.device, &context.queue, foreground, background);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("composite uniforms"),
            size: std::mem::size_of::<CompositeUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("composite uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
        let texture_bind_group = pipeline.texture_bind_group(&context.device, &textures);
        let multisample_target = MultisampleTarget::create(&context);

        Ok(Self {
            context,
            pipeline,
            textures,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
            multisample_target,
        })
    }

    pub fn sample_count(&self) -> u32 {
        self.context.sample_count
    }

    /// Configured swapchain size in physical pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.context.pixel_size()
    }

    /// Draws one frame. On error nothing was submitted for this frame.
    pub fn render(
        &mut self,
        elapsed_seconds: f32,
        params: &ParameterSet,
        surface: &RenderSurface,
    ) -> Result<(), FrameError> {
        let requested = surface.pixel_size();
        if requested != self.context.pixel_size() {
            self.context.resize(requested)?;
            self.multisample_target = MultisampleTarget::create(&self.context);
        }

        if self.textures.poll(&self.context.device, &self.context.queue) {
            self.texture_bind_group = self
                .pipeline
                .texture_bind_group(&self.context.device, &self.textures);
        }

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.context.reconfigure();
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        CompositeUniforms::new(elapsed_seconds, params)
            .upload(&self.context.queue, &self.uniform_buffer);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite encoder"),
            });
        self.encode_draw(&mut encoder, &view);
        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(view)),
            None => (view, None),
        };
        let (width, height) = self.context.pixel_size();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.pipeline.quad.slice(..));
        render_pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }
}

impl FrameSink for Compositor {
    fn render_frame(
        &mut self,
        elapsed_seconds: f32,
        params: &ParameterSet,
        surface: &RenderSurface,
    ) -> Result<(), FrameError> {
        self.render(elapsed_seconds, params, surface)
    }
}
