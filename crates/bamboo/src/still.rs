use std::path::Path;

use anyhow::{Context, Result};
use compositor::still::render_still;
use compositor::RenderSurface;
use image::RgbaImage;

use crate::cli::StillArgs;
use crate::scene::Scene;

pub fn export(scene: &Scene, args: &StillArgs) -> Result<()> {
    let animation = scene.animation()?;
    let (foreground_path, background_path) = scene.assets()?;
    let foreground = load_rgba(&foreground_path)?;
    let background = load_rgba(&background_path)?;

    let surface = RenderSurface::resize(scene.css_width, args.dpr);
    let frame = render_still(
        animation.params(),
        args.time,
        &surface,
        &foreground,
        &background,
    );
    frame
        .save_with_format(&args.output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(
        output = %args.output.display(),
        width = frame.width(),
        height = frame.height(),
        time = args.time,
        wind = ?scene.wind,
        "wrote still frame"
    );
    Ok(())
}

fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok(image.to_rgba8())
}
