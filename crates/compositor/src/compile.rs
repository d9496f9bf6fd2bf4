use std::borrow::Cow;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{Binding, Module, ShaderStage, TypeInner};

use crate::error::{CompositorError, ShaderStageKind};

impl ShaderStageKind {
    fn naga_stage(self) -> ShaderStage {
        match self {
            ShaderStageKind::Vertex => ShaderStage::Vertex,
            ShaderStageKind::Fragment => ShaderStage::Fragment,
        }
    }

    fn source(self) -> &'static str {
        match self {
            ShaderStageKind::Vertex => VERTEX_SHADER_GLSL,
            ShaderStageKind::Fragment => FRAGMENT_SHADER_GLSL,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ShaderStageKind::Vertex => "composite vertex",
            ShaderStageKind::Fragment => "composite fragment",
        }
    }
}

/// Parses and validates `source`, returning the diagnostic text on failure.
pub fn validate_stage(source: &str, stage: ShaderStageKind) -> Result<Module, CompositorError> {
    let module = Frontend::default()
        .parse(&Options::from(stage.naga_stage()), source)
        .map_err(|err| CompositorError::ShaderCompile {
            stage,
            diagnostic: err.emit_to_string(source),
        })?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| CompositorError::ShaderCompile {
            stage,
            diagnostic: err.emit_to_string(source),
        })?;
    Ok(module)
}

/// Checks that every fragment input location is fed by a matching vertex output.
pub fn link_stages(vertex: &Module, fragment: &Module) -> Result<(), CompositorError> {
    let outputs = vertex
        .entry_points
        .first()
        .and_then(|entry| entry.function.result.as_ref())
        .map(|result| located(vertex, result.ty, result.binding.as_ref()))
        .unwrap_or_default();
    let inputs = fragment
        .entry_points
        .first()
        .map(|entry| {
            entry
                .function
                .arguments
                .iter()
                .flat_map(|arg| located(fragment, arg.ty, arg.binding.as_ref()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    for (location, input_ty) in inputs {
        match outputs.iter().find(|(candidate, _)| *candidate == location) {
            Some((_, output_ty)) if *output_ty == input_ty => {}
            Some((_, output_ty)) => {
                return Err(CompositorError::ShaderLink {
                    diagnostic: format!(
                        "varying at location {location} is {output_ty:?} in the vertex stage \
                         but {input_ty:?} in the fragment stage"
                    ),
                });
            }
            None => {
                return Err(CompositorError::ShaderLink {
                    diagnostic: format!(
                        "fragment input at location {location} has no matching vertex output"
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Flattens user-defined locations from a binding or an IO struct.
fn located(
    module: &Module,
    ty: wgpu::naga::Handle<wgpu::naga::Type>,
    binding: Option<&Binding>,
) -> Vec<(u32, TypeInner)> {
    match binding {
        Some(Binding::Location { location, .. }) => vec![(*location, module.types[ty].inner.clone())],
        Some(_) => Vec::new(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .flat_map(|member| located(module, member.ty, member.binding.as_ref()))
                .collect(),
            _ => Vec::new(),
        },
    }
}

/// Validates and links the built-in program without touching the GPU.
pub fn validate_program() -> Result<(), CompositorError> {
    let vertex = validate_stage(VERTEX_SHADER_GLSL, ShaderStageKind::Vertex)?;
    let fragment = validate_stage(FRAGMENT_SHADER_GLSL, ShaderStageKind::Fragment)?;
    link_stages(&vertex, &fragment)
}

/// Creates the GPU module for `stage`, surfacing driver-side validation errors.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStageKind,
) -> Result<wgpu::ShaderModule, CompositorError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage.label()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(stage.source()),
            stage: stage.naga_stage(),
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(CompositorError::ShaderCompile {
            stage,
            diagnostic: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Pass-through vertex stage for the interleaved position/texCoord quad.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_tex_coord;
layout(location = 0) out vec2 v_tex_coord;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_tex_coord = a_tex_coord;
}
";

/// Sway, matte key, root fade, grading and composite.
///
/// The uniform block layout must match `CompositeUniforms` in
/// `gpu/uniforms.rs`; each vec3 reserves a trailing float for std140 padding.
/// `v_tex_coord.y` is 0 at the top edge and 1 at the sprite's base.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_tex_coord;
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform CompositeParams {
    float time;
    float amplitude;
    float speed;
    float chroma_threshold;
    vec3 color_adjust;
    float _padding0;
    vec3 bg_params;
    float _padding1;
} params;

layout(set = 1, binding = 0) uniform texture2D foreground_texture;
layout(set = 1, binding = 1) uniform sampler foreground_sampler;
layout(set = 1, binding = 2) uniform texture2D background_texture;
layout(set = 1, binding = 3) uniform sampler background_sampler;

const float FOREGROUND_SCALE = 0.7;
const float GROUND_SHIFT = 0.2;

vec3 apply_color_adjust(vec3 color, float b, float c, float s) {
    color *= b;
    color = (color - 0.5) * c + 0.5;
    float gray = dot(color, vec3(0.299, 0.587, 0.114));
    return mix(vec3(gray), color, s);
}

void main() {
    vec2 uv = v_tex_coord;

    vec2 bg_uv = (uv - 0.5) / params.bg_params.x + 0.5;
    bg_uv.x -= params.bg_params.y;
    bg_uv.y -= params.bg_params.z;
    vec4 bg_color = texture(sampler2D(background_texture, background_sampler), bg_uv);

    float strength = pow(1.0 - uv.y, 2.8);

    float phase = params.time * params.speed;
    float base_sway = sin(phase + uv.y * 10.0);
    float secondary_sway = sin(phase * 0.6 + uv.y * 5.0) * 0.6;
    float tertiary_sway = sin(phase * 1.8 + uv.y * 15.0) * 0.3;
    float sway = (base_sway + secondary_sway + tertiary_sway) * params.amplitude * strength;

    float vertical_compress = (1.0 - abs(base_sway) * 0.08) * 0.02 * strength;

    vec2 scaled = (uv - 0.5) / FOREGROUND_SCALE + 0.5;
    scaled.y -= GROUND_SHIFT;
    vec2 fg_uv = vec2(scaled.x - sway, scaled.y - vertical_compress);
    vec4 fg_color = texture(sampler2D(foreground_texture, foreground_sampler), fg_uv);

    float luminance = (fg_color.r + fg_color.g + fg_color.b) / 3.0;
    float spread = abs(fg_color.r - fg_color.g) + abs(fg_color.g - fg_color.b);
    float alpha = 1.0;
    if (luminance > (1.0 - params.chroma_threshold) && spread < 0.1) {
        alpha = 0.0;
    }

    float root_blend = smoothstep(0.75, 1.0, uv.y);
    alpha *= (1.0 - root_blend * 0.85);

    vec3 graded = apply_color_adjust(
        fg_color.rgb,
        params.color_adjust.x,
        params.color_adjust.y,
        params.color_adjust.z
    );
    out_color = mix(bg_color, vec4(graded, 1.0), alpha * fg_color.a);
}
";
