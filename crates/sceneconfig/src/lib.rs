//! TOML scene description for the bamboo animation.
//!
//! ```toml
//! version = 1
//!
//! [assets]
//! foreground = "bamboo.png"
//! background = "forest.jpg"
//!
//! [parameters]
//! brightness = 1.2
//! chroma_threshold = 0.4
//!
//! [wind]
//! preset = "breeze"      # or: speed_kmh = 12.0
//!
//! [window]
//! width = 900
//! antialias = 4
//! ```
//!
//! Relative asset paths are resolved against the directory of the file
//! they were loaded from.

use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Widest window, in CSS pixels, a scene may ask for.
pub const MAX_WINDOW_WIDTH: f64 = 4096.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub version: u32,
    #[serde(default)]
    pub assets: Assets,
    #[serde(default)]
    pub parameters: ParameterOverrides,
    #[serde(default)]
    pub wind: WindSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Assets {
    pub foreground: Option<PathBuf>,
    pub background: Option<PathBuf>,
}

/// Any subset of the nine animation knobs; unset fields keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    pub speed: Option<f32>,
    pub amplitude: Option<f32>,
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub bg_scale: Option<f32>,
    pub bg_offset_x: Option<f32>,
    pub bg_offset_y: Option<f32>,
    pub chroma_threshold: Option<f32>,
}

impl ParameterOverrides {
    /// `(field, value)` pairs for every override that is set.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("speed", self.speed),
            ("amplitude", self.amplitude),
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("bg_scale", self.bg_scale),
            ("bg_offset_x", self.bg_offset_x),
            ("bg_offset_y", self.bg_offset_y),
            ("chroma_threshold", self.chroma_threshold),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindPresetSetting {
    Calm,
    Breeze,
    Windy,
    Strong,
    Storm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindSettings {
    pub preset: Option<WindPresetSetting>,
    pub speed_kmh: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSettings {
    /// Initial container width in CSS (logical) pixels.
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    /// MSAA sample count, or `None` for automatic selection.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            let samples = u32::try_from(value)
                .map_err(|_| de::Error::custom("antialias value must be non-negative"))?;
            Some(AntialiasSetting::from_samples(samples).ok_or_else(|| {
                de::Error::custom(format!("invalid antialias setting '{samples}'"))
            })?)
        }
    };
    Ok(result)
}

fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates `path`, anchoring relative asset paths at its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.assets.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        for (field, value) in self.parameters.entries() {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "parameters.{field} must be a finite number"
                )));
            }
        }

        if self.wind.preset.is_some() && self.wind.speed_kmh.is_some() {
            return Err(ConfigError::Invalid(
                "wind.preset and wind.speed_kmh are mutually exclusive".into(),
            ));
        }
        if let Some(speed) = self.wind.speed_kmh {
            if !speed.is_finite() || speed < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "wind.speed_kmh must be a non-negative number, got {speed}"
                )));
            }
        }

        if let Some(width) = self.window.width {
            if !width.is_finite() || width <= 0.0 || width > MAX_WINDOW_WIDTH {
                return Err(ConfigError::Invalid(format!(
                    "window.width must be in (0, {MAX_WINDOW_WIDTH}], got {width}"
                )));
            }
        }

        for (name, path) in [
            ("foreground", &self.assets.foreground),
            ("background", &self.assets.background),
        ] {
            if path.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "assets.{name} may not be empty"
                )));
            }
        }

        Ok(())
    }
}

impl Assets {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.foreground, &mut self.background]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
