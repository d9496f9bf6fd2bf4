/// Reference frame width; together with [`ASPECT_HEIGHT`] it fixes 3:2.
pub const ASPECT_WIDTH: u32 = 1200;
pub const ASPECT_HEIGHT: u32 = 800;

/// Narrowest CSS width the output is allowed to shrink to.
pub const MIN_CSS_WIDTH: u32 = 200;

/// Widest CSS width the output grows to; wider containers render at this width.
pub const MAX_CSS_WIDTH: u32 = 4096;

/// Width assumed when the container cannot be measured.
pub const UNMEASURED_CSS_WIDTH: u32 = 300;

const MIN_DEVICE_PIXEL_RATIO: f64 = 1.0;
const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

/// Sized, aspect-locked output buffer derived from the hosting container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    css_width: u32,
    css_height: u32,
    device_pixel_ratio: f64,
    pixel_width: u32,
    pixel_height: u32,
}

impl RenderSurface {
    /// Derives the surface for a container `container_css_width` CSS pixels wide.
    pub fn resize(container_css_width: f64, device_pixel_ratio: f64) -> Self {
        let css_width = if container_css_width.is_finite() {
            container_css_width
                .floor()
                .clamp(f64::from(MIN_CSS_WIDTH), f64::from(MAX_CSS_WIDTH)) as u32
        } else {
            UNMEASURED_CSS_WIDTH
        };
        let css_height = (css_width as u64 * ASPECT_HEIGHT as u64 / ASPECT_WIDTH as u64) as u32;
        let dpr = clamp_device_pixel_ratio(device_pixel_ratio);
        Self {
            css_width,
            css_height,
            device_pixel_ratio: dpr,
            pixel_width: (css_width as f64 * dpr).floor() as u32,
            pixel_height: (css_height as f64 * dpr).floor() as u32,
        }
    }

    pub fn css_width(&self) -> u32 {
        self.css_width
    }

    pub fn css_height(&self) -> u32 {
        self.css_height
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Physical pixel size the compositor's viewport must match.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::resize(ASPECT_WIDTH as f64, MIN_DEVICE_PIXEL_RATIO)
    }
}

/// Clamps a display's pixel ratio into `[1, 2]`; unknown ratios count as 1.
pub fn clamp_device_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(MIN_DEVICE_PIXEL_RATIO, MAX_DEVICE_PIXEL_RATIO)
    } else {
        MIN_DEVICE_PIXEL_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_three_by_two_aspect() {
        let full = RenderSurface::resize(1200.0, 1.0);
        assert_eq!((full.css_width(), full.css_height()), (1200, 800));
        let half = RenderSurface::resize(600.0, 1.0);
        assert_eq!((half.css_width(), half.css_height()), (600, 400));
        let odd = RenderSurface::resize(601.7, 1.0);
        assert_eq!((odd.css_width(), odd.css_height()), (601, 400));
    }

    #[test]
    fn enforces_minimum_width() {
        let narrow = RenderSurface::resize(120.0, 1.0);
        assert_eq!((narrow.css_width(), narrow.css_height()), (200, 133));
        let empty = RenderSurface::resize(0.0, 1.0);
        assert_eq!(empty.css_width(), MIN_CSS_WIDTH);
    }

    #[test]
    fn caps_huge_containers_at_three_by_two() {
        for width in [4097.0, 1.0e9, 1.0e12, f64::MAX] {
            let surface = RenderSurface::resize(width, 2.0);
            assert_eq!((surface.css_width(), surface.css_height()), (4096, 2730), "width {width}");
            assert_eq!(surface.pixel_size(), (8192, 5460), "width {width}");
        }
    }

    #[test]
    fn unmeasured_container_uses_fallback_width() {
        let surface = RenderSurface::resize(f64::NAN, 1.0);
        assert_eq!((surface.css_width(), surface.css_height()), (300, 200));
    }

    #[test]
    fn clamps_device_pixel_ratio() {
        let inputs = [0.5, 1.0, 1.5, 2.0, 3.0];
        let expected = [1.0, 1.0, 1.5, 2.0, 2.0];
        for (input, want) in inputs.into_iter().zip(expected) {
            assert_eq!(clamp_device_pixel_ratio(input), want, "dpr {input}");
        }
        assert_eq!(clamp_device_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn pixel_size_scales_with_ratio() {
        let surface = RenderSurface::resize(601.0, 1.5);
        assert_eq!(surface.css_height(), 400);
        assert_eq!(surface.pixel_size(), (901, 600));
        let retina = RenderSurface::resize(1200.0, 3.0);
        assert_eq!(retina.device_pixel_ratio(), 2.0);
        assert_eq!(retina.pixel_size(), (2400, 1600));
    }
}
