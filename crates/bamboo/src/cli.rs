use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use compositor::{Antialiasing, PresetName, MAX_CSS_WIDTH};

#[derive(Parser, Debug)]
#[command(
    name = "bamboo",
    author,
    version,
    about = "Bamboo swaying in the wind over a background photo"
)]
pub struct Cli {
    #[command(flatten)]
    pub scene: SceneArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Scene options shared by the preview window and still export.
#[derive(Args, Debug, Default, Clone)]
pub struct SceneArgs {
    /// Scene TOML file; defaults to `<config dir>/bamboo/scene.toml` when present.
    #[arg(long, value_name = "FILE", env = "BAMBOO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Foreground sprite (keyed against its bright matte).
    #[arg(long, value_name = "PATH", global = true)]
    pub foreground: Option<PathBuf>,

    /// Background photo.
    #[arg(long, value_name = "PATH", global = true)]
    pub background: Option<PathBuf>,

    /// Wind preset: calm, breeze, windy, strong or storm.
    #[arg(long, value_name = "NAME", value_parser = parse_preset, global = true)]
    pub preset: Option<PresetName>,

    /// Pick the preset from a measured wind speed in km/h.
    #[arg(
        long,
        value_name = "KMH",
        conflicts_with = "preset",
        value_parser = parse_wind_speed,
        global = true
    )]
    pub wind_kmh: Option<f32>,

    /// Container width in CSS pixels; the height follows the 3:2 aspect.
    #[arg(long, value_name = "CSS_PX", value_parser = parse_width, global = true)]
    pub width: Option<f64>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias, global = true)]
    pub antialias: Option<Antialiasing>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the animated preview window (default).
    Run,
    /// Print the wind preset table in selection order.
    Presets,
    /// Print the preset chosen for a wind speed in km/h.
    Select {
        #[arg(value_name = "KMH", value_parser = parse_wind_speed, allow_negative_numbers = true)]
        kmh: f32,
    },
    /// Render one frame on the CPU and write it as a PNG.
    Still(StillArgs),
}

#[derive(Args, Debug)]
pub struct StillArgs {
    /// Destination PNG.
    #[arg(long, short, value_name = "FILE")]
    pub output: PathBuf,

    /// Animation time in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f32,

    /// Device pixel ratio (clamped to 1..=2).
    #[arg(long, value_name = "RATIO", default_value_t = 1.0)]
    pub dpr: f64,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_preset(value: &str) -> Result<PresetName, String> {
    value.parse::<PresetName>().map_err(|err| err.to_string())
}

fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    if value.trim().is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }
    value.parse()
}

fn parse_wind_speed(value: &str) -> Result<f32, String> {
    let speed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid wind speed '{value}'"))?;
    if speed.is_nan() {
        return Err("wind speed must be a number".to_string());
    }
    Ok(speed)
}

fn parse_width(value: &str) -> Result<f64, String> {
    let width: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{value}'"))?;
    if !width.is_finite() || width <= 0.0 || width > f64::from(MAX_CSS_WIDTH) {
        return Err(format!("width must be in (0, {MAX_CSS_WIDTH}], got {value}"));
    }
    Ok(width)
}
