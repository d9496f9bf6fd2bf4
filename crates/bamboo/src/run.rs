use anyhow::{Context, Result};
use compositor::{
    presets, run_preview, select_preset_for_wind_speed, CompositorOptions, PreviewOptions,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::scene::Scene;
use crate::still;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command.unwrap_or(Command::Run) {
        Command::Presets => {
            print_presets();
            Ok(())
        }
        Command::Select { kmh } => {
            println!("{}", select_preset_for_wind_speed(kmh));
            Ok(())
        }
        Command::Still(args) => {
            let scene = Scene::resolve(&cli.scene)?;
            still::export(&scene, &args)
        }
        Command::Run => {
            let scene = Scene::resolve(&cli.scene)?;
            preview(&scene)
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_presets() {
    println!("{:<8} {:>9} {:>6} {:>12}", "preset", "amplitude", "speed", "max km/h");
    for preset in presets() {
        println!(
            "{:<8} {:>9} {:>6} {:>12}",
            preset.name.as_str(),
            preset.amplitude,
            preset.speed,
            preset.max_wind_speed_kmh
        );
    }
}

fn preview(scene: &Scene) -> Result<()> {
    let animation = scene.animation()?;
    let (foreground, background) = scene.asset_refs()?;
    tracing::info!(
        foreground = %foreground,
        background = %background,
        wind = ?scene.wind,
        antialias = %scene.antialiasing,
        "opening preview (keys 1-5 switch wind presets, Esc quits)"
    );
    run_preview(
        animation,
        PreviewOptions {
            title: "Bamboo".to_string(),
            foreground,
            background,
            css_width: scene.css_width,
            compositor: CompositorOptions {
                antialiasing: scene.antialiasing,
                ..CompositorOptions::default()
            },
        },
    )
    .context("preview window failed")
}
