//! CPU mirror of the fragment stage in [`crate::compile`].
//!
//! Every function here matches a line of the GLSL program one-to-one so the
//! numerical behaviour can be tested without a GPU and reused by the still
//! exporter. Coordinates follow the quad's texture space: `u` grows to the
//! right, `v` grows downwards with `v = 0` at the top edge.

use crate::params::ParameterSet;

/// Sprite extent relative to its source texture.
pub const FOREGROUND_SCALE: f32 = 0.7;
/// Downward shift that plants the sprite on the background's ground line.
pub const GROUND_SHIFT: f32 = 0.2;
/// Exponent of the rigidity falloff along `v`.
pub const STRENGTH_EXPONENT: f32 = 2.8;
/// Maximum colour spread still treated as matte.
pub const MATTE_SPREAD: f32 = 0.1;

pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

pub fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)]
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Zoom about the centre, then pan.
pub fn background_uv(uv: [f32; 2], params: &ParameterSet) -> [f32; 2] {
    [
        (uv[0] - 0.5) / params.bg_scale + 0.5 - params.bg_offset_x,
        (uv[1] - 0.5) / params.bg_scale + 0.5 - params.bg_offset_y,
    ]
}

/// 1 at `v = 0`, 0 at `v = 1`.
pub fn sway_strength(v: f32) -> f32 {
    (1.0 - v).max(0.0).powf(STRENGTH_EXPONENT)
}

/// Horizontal displacement plus the unscaled first harmonic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sway {
    pub offset: f32,
    pub base_harmonic: f32,
}

pub fn sway(elapsed: f32, v: f32, params: &ParameterSet) -> Sway {
    let phase = elapsed * params.speed;
    let base_harmonic = (phase + v * 10.0).sin();
    let secondary = (phase * 0.6 + v * 5.0).sin() * 0.6;
    let tertiary = (phase * 1.8 + v * 15.0).sin() * 0.3;
    Sway {
        offset: (base_harmonic + secondary + tertiary) * params.amplitude * sway_strength(v),
        base_harmonic,
    }
}

pub fn vertical_compress(base_harmonic: f32, strength: f32) -> f32 {
    (1.0 - base_harmonic.abs() * 0.08) * 0.02 * strength
}

/// Where the foreground texture is sampled for output coordinate `uv`.
pub fn foreground_uv(uv: [f32; 2], elapsed: f32, params: &ParameterSet) -> [f32; 2] {
    let sway = sway(elapsed, uv[1], params);
    let compress = vertical_compress(sway.base_harmonic, sway_strength(uv[1]));
    let scaled = [
        (uv[0] - 0.5) / FOREGROUND_SCALE + 0.5,
        (uv[1] - 0.5) / FOREGROUND_SCALE + 0.5 - GROUND_SHIFT,
    ];
    [scaled[0] - sway.offset, scaled[1] - compress]
}

/// 0 for bright, unsaturated matte pixels; 1 otherwise.
pub fn chroma_key_alpha(rgb: [f32; 3], chroma_threshold: f32) -> f32 {
    let brightness = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
    let spread = (rgb[0] - rgb[1]).abs() + (rgb[1] - rgb[2]).abs();
    if brightness > 1.0 - chroma_threshold && spread < MATTE_SPREAD {
        0.0
    } else {
        1.0
    }
}

pub fn root_blend(v: f32) -> f32 {
    smoothstep(0.75, 1.0, v)
}

/// Brightness, then contrast about 0.5, then saturation.
pub fn grade_color(rgb: [f32; 3], brightness: f32, contrast: f32, saturation: f32) -> [f32; 3] {
    let lit = rgb.map(|c| c * brightness);
    let contrasted = lit.map(|c| (c - 0.5) * contrast + 0.5);
    let gray = contrasted[0] * 0.299 + contrasted[1] * 0.587 + contrasted[2] * 0.114;
    mix3([gray; 3], contrasted, saturation)
}

/// Full composite for one output pixel.
///
/// `foreground` and `background` sample their textures at a texture-space
/// coordinate and return straight RGBA in `[0, 1]`.
pub fn shade_pixel<F, B>(
    uv: [f32; 2],
    elapsed: f32,
    params: &ParameterSet,
    foreground: F,
    background: B,
) -> [f32; 4]
where
    F: Fn([f32; 2]) -> [f32; 4],
    B: Fn([f32; 2]) -> [f32; 4],
{
    let bg = background(background_uv(uv, params));
    let fg = foreground(foreground_uv(uv, elapsed, params));
    let fg_rgb = [fg[0], fg[1], fg[2]];

    let mut alpha = chroma_key_alpha(fg_rgb, params.chroma_threshold);
    alpha *= 1.0 - root_blend(uv[1]) * 0.85;

    let graded = grade_color(fg_rgb, params.brightness, params.contrast, params.saturation);
    let t = alpha * fg[3];
    [
        mix(bg[0], graded[0], t),
        mix(bg[1], graded[1], t),
        mix(bg[2], graded[2], t),
        mix(bg[3], 1.0, t),
    ]
}
