use bytemuck::{Pod, Zeroable};

use crate::params::ParameterSet;

/// std140 mirror of the `CompositeParams` block in the fragment shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CompositeUniforms {
    pub time: f32,
    pub amplitude: f32,
    pub speed: f32,
    pub chroma_threshold: f32,
    pub color_adjust: [f32; 3],
    pub _padding0: f32,
    pub bg_params: [f32; 3],
    pub _padding1: f32,
}

impl CompositeUniforms {
    pub fn new(elapsed_seconds: f32, params: &ParameterSet) -> Self {
        Self {
            time: elapsed_seconds,
            amplitude: params.amplitude,
            speed: params.speed,
            chroma_threshold: params.chroma_threshold,
            color_adjust: params.color_adjust(),
            _padding0: 0.0,
            bg_params: params.background_params(),
            _padding1: 0.0,
        }
    }

    pub fn upload(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(self));
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(size_of::<CompositeUniforms>(), 48);
        assert_eq!(offset_of!(CompositeUniforms, chroma_threshold), 12);
        assert_eq!(offset_of!(CompositeUniforms, color_adjust), 16);
        assert_eq!(offset_of!(CompositeUniforms, bg_params), 32);
    }

    #[test]
    fn packs_parameter_groups() {
        let params = ParameterSet::default();
        let uniforms = CompositeUniforms::new(2.5, &params);
        assert_eq!(uniforms.time, 2.5);
        assert_eq!(uniforms.speed, 1.5);
        assert_eq!(uniforms.color_adjust, [1.1, 1.05, 1.15]);
        assert_eq!(uniforms.bg_params, [1.1, 0.0, 0.0]);
        assert_eq!(uniforms.chroma_threshold, 0.47);
    }
}
