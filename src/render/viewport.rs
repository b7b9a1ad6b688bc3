use crate::foundation::core::{Canvas, Point, Size};
use crate::foundation::error::{MaskplayError, MaskplayResult};

/// "Cover" fit of a source video into a display box.
///
/// The overlay surface is backed at the visible source resolution and stretched to the display
/// size, so one surface pixel is one source pixel shifted by the crop offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub source: Canvas,
    pub display: Size,
    pub scale: f64,
    /// Visible region of the source, in source pixels.
    pub visible: Size,
    /// Top-left of the visible region, in source pixels.
    pub crop: Point,
}

impl Viewport {
    pub fn cover(source: Canvas, display: Size) -> MaskplayResult<Self> {
        if !(display.width.is_finite() && display.height.is_finite())
            || display.width <= 0.0
            || display.height <= 0.0
        {
            return Err(MaskplayError::validation(
                "display width/height must be finite and > 0",
            ));
        }
        if source.width == 0 || source.height == 0 {
            return Err(MaskplayError::validation("source width/height must be > 0"));
        }

        let sw = f64::from(source.width);
        let sh = f64::from(source.height);
        let sx = display.width / sw;
        let sy = display.height / sh;

        // The axis that fills the display is shown whole; the other is cropped symmetrically.
        let (scale, visible, crop) = if sx >= sy {
            let vh = display.height * sw / display.width;
            (sx, Size::new(sw, vh), Point::new(0.0, (sh - vh) / 2.0))
        } else {
            let vw = display.width * sh / display.height;
            (sy, Size::new(vw, sh), Point::new((sw - vw) / 2.0, 0.0))
        };

        Ok(Self {
            source,
            display,
            scale,
            visible,
            crop,
        })
    }

    /// Backing resolution of the overlay surface.
    pub fn surface(&self) -> Canvas {
        fn px(v: f64) -> u32 {
            (v.floor() as u32).max(1)
        }
        Canvas {
            width: px(self.visible.width),
            height: px(self.visible.height),
        }
    }

    /// Integer crop offset used when sampling masks.
    pub fn crop_px(&self) -> (i64, i64) {
        (self.crop.x.floor() as i64, self.crop.y.floor() as i64)
    }

    /// Display-space point to surface pixel, or `None` when outside the surface.
    pub fn display_to_surface(&self, p: Point) -> Option<(u32, u32)> {
        let surface = self.surface();
        let x = (p.x * f64::from(surface.width) / self.display.width).floor();
        let y = (p.y * f64::from(surface.height) / self.display.height).floor();
        if !(x.is_finite() && y.is_finite())
            || x < 0.0
            || y < 0.0
            || x >= f64::from(surface.width)
            || y >= f64::from(surface.height)
        {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Surface pixel to the source pixel it samples.
    pub fn surface_to_source(&self, x: u32, y: u32) -> (i64, i64) {
        let (cx, cy) = self.crop_px();
        (i64::from(x) + cx, i64::from(y) + cy)
    }
}
