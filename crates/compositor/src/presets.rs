//! Discrete wind levels and the wind-speed to preset mapping.
//!
//! [`WIND_PRESETS`] is ordered from the calmest to the most violent level and
//! the order carries meaning: [`select_preset_for_wind_speed`] returns the
//! first entry whose upper bound covers the measured speed, so every bound
//! must be strictly greater than the one before it.

use std::fmt;
use std::str::FromStr;

use crate::error::CompositorError;

/// Names of the closed set of wind levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetName {
    Calm,
    Breeze,
    Windy,
    Strong,
    Storm,
}

impl PresetName {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::Calm => "Calm",
            PresetName::Breeze => "Breeze",
            PresetName::Windy => "Windy",
            PresetName::Strong => "Strong",
            PresetName::Storm => "Storm",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = CompositorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        WIND_PRESETS
            .iter()
            .map(|preset| preset.name)
            .find(|name| name.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CompositorError::UnknownPreset(trimmed.to_string()))
    }
}

/// One wind level: sway parameters plus the highest wind speed it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindPreset {
    pub name: PresetName,
    pub amplitude: f32,
    pub speed: f32,
    pub max_wind_speed_kmh: f32,
}

/// Preset table in ascending wind order. Scan order decides selection.
pub const WIND_PRESETS: [WindPreset; 5] = [
    WindPreset {
        name: PresetName::Calm,
        amplitude: 0.005,
        speed: 0.5,
        max_wind_speed_kmh: 2.0,
    },
    WindPreset {
        name: PresetName::Breeze,
        amplitude: 0.08,
        speed: 2.2,
        max_wind_speed_kmh: 15.0,
    },
    WindPreset {
        name: PresetName::Windy,
        amplitude: 0.14,
        speed: 3.5,
        max_wind_speed_kmh: 25.0,
    },
    WindPreset {
        name: PresetName::Strong,
        amplitude: 0.20,
        speed: 3.8,
        max_wind_speed_kmh: 100.0,
    },
    WindPreset {
        name: PresetName::Storm,
        amplitude: 1.0,
        speed: 20.0,
        max_wind_speed_kmh: 200.0,
    },
];

/// Preset returned when no bound covers the measured speed.
///
/// Speeds above the Storm bound land here, not on Storm. This mirrors the
/// behaviour the animation has always shipped with.
pub const FALLBACK_PRESET: PresetName = PresetName::Calm;

/// Iterates the table in selection order.
pub fn presets() -> &'static [WindPreset] {
    &WIND_PRESETS
}

/// Looks up the record for `name`.
pub fn preset(name: PresetName) -> &'static WindPreset {
    match name {
        PresetName::Calm => &WIND_PRESETS[0],
        PresetName::Breeze => &WIND_PRESETS[1],
        PresetName::Windy => &WIND_PRESETS[2],
        PresetName::Strong => &WIND_PRESETS[3],
        PresetName::Storm => &WIND_PRESETS[4],
    }
}

/// Maps a measured wind speed to the first preset whose bound covers it.
pub fn select_preset_for_wind_speed(wind_speed_kmh: f32) -> PresetName {
    WIND_PRESETS
        .iter()
        .find(|preset| preset.max_wind_speed_kmh >= wind_speed_kmh)
        .map(|preset| preset.name)
        .unwrap_or(FALLBACK_PRESET)
}
