use crate::error::CompositorError;
use crate::presets::WindPreset;

/// The nine knobs that fully determine one frame's appearance.
///
/// A `ParameterSet` is replaced as a whole; the compositor only ever reads
/// the copy it is handed for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    /// Multiplier on elapsed time fed to the sway harmonics.
    pub speed: f32,
    /// Horizontal sway scale in texture space.
    pub amplitude: f32,
    pub brightness: f32,
    /// Contrast pivoted around mid-gray.
    pub contrast: f32,
    /// 0 is grayscale, 1 leaves colour unmodified.
    pub saturation: f32,
    /// Background zoom factor.
    pub bg_scale: f32,
    pub bg_offset_x: f32,
    pub bg_offset_y: f32,
    /// Luminance window for the matte key, in `[0, 1]`.
    pub chroma_threshold: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            speed: 1.5,
            amplitude: 0.05,
            brightness: 1.1,
            contrast: 1.05,
            saturation: 1.15,
            bg_scale: 1.1,
            bg_offset_x: 0.0,
            bg_offset_y: 0.0,
            chroma_threshold: 0.47,
        }
    }
}

impl ParameterSet {
    /// Returns a copy with amplitude and speed taken from `preset`.
    pub fn with_wind(self, preset: &WindPreset) -> Self {
        Self {
            amplitude: preset.amplitude,
            speed: preset.speed,
            ..self
        }
    }

    /// Colour grading triple uploaded as one vector.
    pub fn color_adjust(&self) -> [f32; 3] {
        [self.brightness, self.contrast, self.saturation]
    }

    /// Background framing triple uploaded as one vector.
    pub fn background_params(&self) -> [f32; 3] {
        [self.bg_scale, self.bg_offset_x, self.bg_offset_y]
    }

    /// Checks every field against its documented range.
    pub fn validate(&self) -> Result<(), CompositorError> {
        let fields: [(&'static str, f32, fn(f32) -> bool); 9] = [
            ("speed", self.speed, |v| v > 0.0),
            ("amplitude", self.amplitude, |v| v >= 0.0),
            ("brightness", self.brightness, |v| v >= 0.0),
            ("contrast", self.contrast, |v| v >= 0.0),
            ("saturation", self.saturation, |v| v >= 0.0),
            ("bg_scale", self.bg_scale, |v| v > 0.0),
            ("bg_offset_x", self.bg_offset_x, |_| true),
            ("bg_offset_y", self.bg_offset_y, |_| true),
            ("chroma_threshold", self.chroma_threshold, |v| {
                (0.0..=1.0).contains(&v)
            }),
        ];
        for (field, value, in_range) in fields {
            if !value.is_finite() || !in_range(value) {
                return Err(CompositorError::InvalidParameter { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{preset, PresetName};

    #[test]
    fn defaults_are_valid() {
        ParameterSet::default().validate().expect("defaults valid");
    }

    #[test]
    fn with_wind_only_touches_amplitude_and_speed() {
        let base = ParameterSet {
            brightness: 0.9,
            bg_offset_x: 0.25,
            ..ParameterSet::default()
        };
        let windy = base.with_wind(preset(PresetName::Windy));
        assert_eq!(windy.amplitude, 0.14);
        assert_eq!(windy.speed, 3.5);
        assert_eq!(
            ParameterSet {
                amplitude: base.amplitude,
                speed: base.speed,
                ..windy
            },
            base
        );
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let zero_speed = ParameterSet {
            speed: 0.0,
            ..ParameterSet::default()
        };
        assert!(matches!(
            zero_speed.validate(),
            Err(CompositorError::InvalidParameter { field: "speed", .. })
        ));

        let threshold = ParameterSet {
            chroma_threshold: 1.5,
            ..ParameterSet::default()
        };
        assert!(matches!(
            threshold.validate(),
            Err(CompositorError::InvalidParameter {
                field: "chroma_threshold",
                ..
            })
        ));

        let nan_offset = ParameterSet {
            bg_offset_y: f32::NAN,
            ..ParameterSet::default()
        };
        assert!(nan_offset.validate().is_err());
    }

    #[test]
    fn offsets_are_unbounded() {
        let panned = ParameterSet {
            bg_offset_x: -3.0,
            bg_offset_y: 7.5,
            ..ParameterSet::default()
        };
        assert!(panned.validate().is_ok());
    }
}
