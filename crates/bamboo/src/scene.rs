use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use compositor::{Animation, Antialiasing, AssetRef, ParameterSet, PresetName, ASPECT_WIDTH};
use directories_next::BaseDirs;
use sceneconfig::{AntialiasSetting, ParameterOverrides, SceneConfig, WindPresetSetting};

use crate::cli::SceneArgs;

const CONFIG_DIR_NAME: &str = "bamboo";
const CONFIG_FILE_NAME: &str = "scene.toml";

/// Where the wind level came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindChoice {
    Preset(PresetName),
    SpeedKmh(f32),
}

/// CLI flags layered over the scene file.
#[derive(Debug, Clone)]
pub struct Scene {
    pub params: ParameterSet,
    pub wind: Option<WindChoice>,
    pub foreground: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub css_width: f64,
    pub antialiasing: Antialiasing,
}

impl Scene {
    pub fn resolve(args: &SceneArgs) -> Result<Self> {
        let config = match config_path(args) {
            Some(path) => {
                let config = SceneConfig::load(&path)
                    .with_context(|| format!("failed to load scene config {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded scene config");
                Some(config)
            }
            None => None,
        };
        Ok(Self::merge(args, config.as_ref()))
    }

    fn merge(args: &SceneArgs, config: Option<&SceneConfig>) -> Self {
        let params = config
            .map(|config| apply_overrides(ParameterSet::default(), &config.parameters))
            .unwrap_or_default();

        let cli_wind = args
            .preset
            .map(WindChoice::Preset)
            .or(args.wind_kmh.map(WindChoice::SpeedKmh));
        let config_wind = config.and_then(|config| {
            config
                .wind
                .preset
                .map(|preset| WindChoice::Preset(preset_name(preset)))
                .or(config.wind.speed_kmh.map(WindChoice::SpeedKmh))
        });

        let assets = config.map(|config| &config.assets);
        let foreground = args
            .foreground
            .clone()
            .or_else(|| assets.and_then(|assets| assets.foreground.clone()));
        let background = args
            .background
            .clone()
            .or_else(|| assets.and_then(|assets| assets.background.clone()));

        let css_width = args
            .width
            .or(config.and_then(|config| config.window.width))
            .unwrap_or(f64::from(ASPECT_WIDTH));
        let antialiasing = args
            .antialias
            .or(config
                .and_then(|config| config.window.antialias)
                .map(antialiasing))
            .unwrap_or_default();

        Self {
            params,
            wind: cli_wind.or(config_wind),
            foreground,
            background,
            css_width,
            antialiasing,
        }
    }

    /// Builds the animation state; a wind choice overrides amplitude and speed.
    pub fn animation(&self) -> Result<Animation> {
        let mut animation = Animation::new();
        animation
            .set_parameter_set(self.params)
            .context("invalid scene parameters")?;
        match self.wind {
            Some(WindChoice::Preset(name)) => animation.apply_preset(name),
            Some(WindChoice::SpeedKmh(kmh)) => {
                animation.apply_wind_speed(kmh);
            }
            None => {}
        }
        animation.resize_to(self.css_width);
        Ok(animation)
    }

    /// Both asset paths, or an error naming the missing one.
    pub fn assets(&self) -> Result<(PathBuf, PathBuf)> {
        let missing = |name: &str| {
            anyhow!("no {name} image configured; pass --{name} or set assets.{name} in the scene config")
        };
        let foreground = self.foreground.clone().ok_or_else(|| missing("foreground"))?;
        let background = self.background.clone().ok_or_else(|| missing("background"))?;
        Ok((foreground, background))
    }

    pub fn asset_refs(&self) -> Result<(AssetRef, AssetRef)> {
        let (foreground, background) = self.assets()?;
        Ok((AssetRef::path(foreground), AssetRef::path(background)))
    }
}

fn config_path(args: &SceneArgs) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let path = default_config_path()?;
    path.is_file().then_some(path)
}

fn default_config_path() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    Some(config_file_in(dirs.config_dir()))
}

fn config_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

fn apply_overrides(params: ParameterSet, overrides: &ParameterOverrides) -> ParameterSet {
    let ParameterOverrides {
        speed,
        amplitude,
        brightness,
        contrast,
        saturation,
        bg_scale,
        bg_offset_x,
        bg_offset_y,
        chroma_threshold,
    } = *overrides;
    ParameterSet {
        speed: speed.unwrap_or(params.speed),
        amplitude: amplitude.unwrap_or(params.amplitude),
        brightness: brightness.unwrap_or(params.brightness),
        contrast: contrast.unwrap_or(params.contrast),
        saturation: saturation.unwrap_or(params.saturation),
        bg_scale: bg_scale.unwrap_or(params.bg_scale),
        bg_offset_x: bg_offset_x.unwrap_or(params.bg_offset_x),
        bg_offset_y: bg_offset_y.unwrap_or(params.bg_offset_y),
        chroma_threshold: chroma_threshold.unwrap_or(params.chroma_threshold),
    }
}

fn preset_name(setting: WindPresetSetting) -> PresetName {
    match setting {
        WindPresetSetting::Calm => PresetName::Calm,
        WindPresetSetting::Breeze => PresetName::Breeze,
        WindPresetSetting::Windy => PresetName::Windy,
        WindPresetSetting::Strong => PresetName::Strong,
        WindPresetSetting::Storm => PresetName::Storm,
    }
}

fn antialiasing(setting: AntialiasSetting) -> Antialiasing {
    match setting.samples() {
        None => Antialiasing::Auto,
        Some(1) => Antialiasing::Off,
        Some(count) => Antialiasing::Samples(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> SceneConfig {
        SceneConfig::from_toml_str(toml).expect("config")
    }

    #[test]
    fn defaults_without_config_or_flags() {
        let scene = Scene::merge(&SceneArgs::default(), None);
        assert_eq!(scene.params, ParameterSet::default());
        assert_eq!(scene.wind, None);
        assert_eq!(scene.css_width, 1200.0);
        assert_eq!(scene.antialiasing, Antialiasing::Auto);
        assert!(scene.assets().is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let config = config(
            r#"
version = 1
[assets]
foreground = "/cfg/fg.png"
background = "/cfg/bg.png"
[parameters]
brightness = 1.3
[wind]
preset = "storm"
[window]
width = 800
antialias = "off"
"#,
        );
        let args = SceneArgs {
            foreground: Some(PathBuf::from("/cli/fg.png")),
            wind_kmh: Some(10.0),
            antialias: Some(Antialiasing::Samples(4)),
            ..SceneArgs::default()
        };
        let scene = Scene::merge(&args, Some(&config));
        assert_eq!(scene.params.brightness, 1.3);
        assert_eq!(scene.params.contrast, 1.05);
        assert_eq!(scene.wind, Some(WindChoice::SpeedKmh(10.0)));
        assert_eq!(scene.foreground, Some(PathBuf::from("/cli/fg.png")));
        assert_eq!(scene.background, Some(PathBuf::from("/cfg/bg.png")));
        assert_eq!(scene.css_width, 800.0);
        assert_eq!(scene.antialiasing, Antialiasing::Samples(4));
    }

    #[test]
    fn wind_choice_sets_amplitude_and_speed() {
        let config = config("version = 1\n[parameters]\nspeed = 9.0\n[wind]\nspeed_kmh = 12.0\n");
        let scene = Scene::merge(&SceneArgs::default(), Some(&config));
        let animation = scene.animation().expect("animation");
        assert_eq!(animation.active_preset(), PresetName::Breeze);
        assert_eq!(animation.params().speed, 2.2);
        assert_eq!(animation.params().amplitude, 0.08);
    }

    #[test]
    fn invalid_overrides_are_reported() {
        let config = config("version = 1\n[parameters]\nbg_scale = 0.0\n");
        let scene = Scene::merge(&SceneArgs::default(), Some(&config));
        assert!(scene.animation().is_err());
    }

    #[test]
    fn default_config_lives_under_bamboo() {
        let path = config_file_in(Path::new("/home/user/.config"));
        assert_eq!(path, PathBuf::from("/home/user/.config/bamboo/scene.toml"));
    }
}
