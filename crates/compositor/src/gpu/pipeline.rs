use wgpu::util::DeviceExt;

use crate::compile::compile_stage;
use crate::error::{CompositorError, ShaderStageKind};

use super::textures::{TextureCache, TextureSlot};

/// Interleaved `(x, y, u, v)` for two triangles covering clip space.
/// `v` is 0 along the top edge so texture rows map to screen rows.
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 24] = [
    -1.0, -1.0, 0.0, 1.0,
     1.0, -1.0, 1.0, 1.0,
    -1.0,  1.0, 0.0, 0.0,
    -1.0,  1.0, 0.0, 0.0,
     1.0, -1.0, 1.0, 1.0,
     1.0,  1.0, 1.0, 0.0,
];
pub(crate) const QUAD_VERTEX_COUNT: u32 = 6;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

pub(crate) struct CompositePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub quad: wgpu::Buffer,
}

impl CompositePipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self, CompositorError> {
        let vertex_module = compile_stage(device, ShaderStageKind::Vertex)?;
        let fragment_module = compile_stage(device, ShaderStageKind::Fragment)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite texture layout"),
            entries: &texture_layout_entries(),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("composite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (4 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(CompositorError::ShaderLink {
                diagnostic: err.to_string(),
            });
        }

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("composite quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            pipeline,
            uniform_layout,
            texture_layout,
            quad,
        })
    }

    /// Binds the current foreground and background views.
    pub fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        textures: &TextureCache,
    ) -> wgpu::BindGroup {
        let foreground = textures.handle(TextureSlot::Foreground);
        let background = textures.handle(TextureSlot::Background);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&foreground.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&foreground.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&background.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&background.sampler),
                },
            ],
        })
    }
}

fn texture_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(4);
    for slot in 0..2u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_clip_space_with_top_row_at_v_zero() {
        let vertices: Vec<[f32; 4]> = QUAD_VERTICES
            .chunks_exact(4)
            .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
            .collect();
        assert_eq!(vertices.len() as u32, QUAD_VERTEX_COUNT);
        for [x, y, u, v] in vertices {
            assert_eq!(u, (x + 1.0) / 2.0);
            assert_eq!(v, (1.0 - y) / 2.0);
        }
    }

    #[test]
    fn texture_layout_interleaves_views_and_samplers() {
        let entries = texture_layout_entries();
        let bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3]);
        assert!(matches!(entries[1].ty, wgpu::BindingType::Sampler(_)));
    }
}
