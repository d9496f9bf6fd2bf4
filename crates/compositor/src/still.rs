//! GPU-free rendering of a single frame, used for still export.

use image::{Rgba, RgbaImage};

use crate::params::ParameterSet;
use crate::shading::shade_pixel;
use crate::surface::RenderSurface;

/// Shades every pixel centre of `surface` at `elapsed_seconds`.
///
/// Row 0 of the output is the top of the frame, matching the GPU path.
pub fn render_still(
    params: &ParameterSet,
    elapsed_seconds: f32,
    surface: &RenderSurface,
    foreground: &RgbaImage,
    background: &RgbaImage,
) -> RgbaImage {
    let (width, height) = surface.pixel_size();
    RgbaImage::from_fn(width, height, |x, y| {
        let uv = [
            (x as f32 + 0.5) / width as f32,
            (y as f32 + 0.5) / height as f32,
        ];
        let color = shade_pixel(
            uv,
            elapsed_seconds,
            params,
            |uv| sample_bilinear(foreground, uv),
            |uv| sample_bilinear(background, uv),
        );
        Rgba(color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

/// Linear filtering with clamp-to-edge addressing.
pub fn sample_bilinear(image: &RgbaImage, uv: [f32; 2]) -> [f32; 4] {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let x = (uv[0] * width as f32 - 0.5).clamp(0.0, (width - 1) as f32);
    let y = (uv[1] * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let texel = |x: u32, y: u32| image.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
    let (a, b, c, d) = (texel(x0, y0), texel(x1, y0), texel(x0, y1), texel(x1, y1));
    std::array::from_fn(|i| {
        let top = a[i] + (b[i] - a[i]) * tx;
        let bottom = c[i] + (d[i] - c[i]) * tx;
        top + (bottom - top) * ty
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(pixel))
    }

    #[test]
    fn output_matches_surface_pixel_size() {
        let surface = RenderSurface::resize(300.0, 2.0);
        let image = render_still(
            &ParameterSet::default(),
            0.0,
            &surface,
            &solid(4, 4, [0, 0, 0, 0]),
            &solid(4, 4, [0, 0, 0, 255]),
        );
        assert_eq!(image.dimensions(), (600, 400));
    }

    #[test]
    fn white_matte_shows_the_background() {
        let surface = RenderSurface::resize(200.0, 1.0);
        let image = render_still(
            &ParameterSet::default(),
            1.0,
            &surface,
            &solid(8, 8, [255, 255, 255, 255]),
            &solid(8, 8, [10, 120, 200, 255]),
        );
        for pixel in image.pixels() {
            assert_eq!(pixel.0, [10, 120, 200, 255]);
        }
    }

    #[test]
    fn opaque_foreground_covers_the_top_of_the_frame() {
        let params = ParameterSet {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            ..ParameterSet::default()
        };
        let surface = RenderSurface::resize(200.0, 1.0);
        let image = render_still(
            &params,
            0.0,
            &surface,
            &solid(8, 8, [20, 160, 40, 255]),
            &solid(8, 8, [0, 0, 255, 255]),
        );
        assert_eq!(image.get_pixel(100, 10).0, [20, 160, 40, 255]);
        // The root fade lets most of the background through at the bottom edge.
        let bottom = image.get_pixel(100, image.height() - 1).0;
        assert!(bottom[2] > 180, "bottom pixel {bottom:?}");
    }

    #[test]
    fn bilinear_sampling_clamps_and_interpolates() {
        let mut image = solid(2, 1, [0, 0, 0, 255]);
        image.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        assert_eq!(sample_bilinear(&image, [-1.0, 0.5])[0], 0.0);
        assert_eq!(sample_bilinear(&image, [2.0, 0.5])[0], 1.0);
        let middle = sample_bilinear(&image, [0.5, 0.5])[0];
        assert!((middle - 0.5).abs() < 1e-6);
    }
}
