use std::fmt;
use std::str::FromStr;

/// Anti-aliasing policy for the composite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl fmt::Display for Antialiasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antialiasing::Auto => f.write_str("auto"),
            Antialiasing::Off => f.write_str("off"),
            Antialiasing::Samples(count) => write!(f, "{count}"),
        }
    }
}

impl FromStr for Antialiasing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "auto" | "max" => return Ok(Antialiasing::Auto),
            "off" | "none" | "0" | "1" => return Ok(Antialiasing::Off),
            _ => {}
        }
        match trimmed.parse::<u32>() {
            Ok(count @ (2 | 4 | 8 | 16)) => Ok(Antialiasing::Samples(count)),
            Ok(other) => Err(format!(
                "unsupported MSAA sample count {other} (expected 2, 4, 8 or 16)"
            )),
            Err(_) => Err(format!(
                "invalid antialiasing mode '{trimmed}' (expected auto, off, 2, 4, 8 or 16)"
            )),
        }
    }
}

/// Start-up options for the GPU compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorOptions {
    pub antialiasing: Antialiasing,
    /// Prefer the discrete adapter when more than one is present.
    pub high_performance: bool,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            antialiasing: Antialiasing::Auto,
            high_performance: false,
        }
    }
}
