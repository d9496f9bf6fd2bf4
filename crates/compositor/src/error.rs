use std::fmt;

/// Shader stage reported alongside compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures surfaced by the compositor's public operations.
///
/// Everything except [`CompositorError::AssetLoadFailed`] is fatal to
/// [`crate::Animation::start`]; asset failures are logged and leave the
/// placeholder texture bound.
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("no usable graphics context: {0}")]
    GraphicsUnavailable(String),
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    ShaderCompile {
        stage: ShaderStageKind,
        diagnostic: String,
    },
    #[error("shader program failed to link:\n{diagnostic}")]
    ShaderLink { diagnostic: String },
    #[error("failed to load asset {asset}: {reason}")]
    AssetLoadFailed { asset: String, reason: String },
    #[error("unknown wind preset '{0}' (expected calm, breeze, windy, strong or storm)")]
    UnknownPreset(String),
    #[error("parameter {field} has invalid value {value}")]
    InvalidParameter { field: &'static str, value: f32 },
}

impl CompositorError {
    pub(crate) fn graphics(context: &str, err: impl fmt::Display) -> Self {
        Self::GraphicsUnavailable(format!("{context}: {err}"))
    }
}

/// A single frame could not be produced; nothing was drawn for it.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("surface of {width}x{height} exceeds the GPU limit of {max_dimension}")]
    SurfaceTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },
}
