use crate::assets::decode::MaskImage;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{MaskplayError, MaskplayResult};

pub type PremulRgba8 = [u8; 4];

/// Premultiplied RGBA8 raster, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Surface {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.pixel_count() * 4],
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy of the pixels, for image encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Source-over of a straight-alpha layer onto a premultiplied surface of the same size.
pub fn over_straight_in_place(dst: &mut [u8], src_straight: &[u8]) -> MaskplayResult<()> {
    if dst.len() != src_straight.len() || !dst.len().is_multiple_of(4) {
        return Err(MaskplayError::evaluation(
            "over_straight_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src_straight.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let src = Rgba8Premul::from_straight_rgba(s[0], s[1], s[2], s[3]).to_array();
        let out = over([d[0], d[1], d[2], d[3]], src, 1.0);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Alpha-stencil recolor of the visible part of `mask` into `scratch` (straight RGBA8).
///
/// Surface pixel `(x, y)` samples mask pixel `(x + crop.0, y + crop.1)`. The output color is
/// exactly `color_straight[..3]` and the output alpha is `mask_alpha * color_alpha / 255`; pixels
/// the mask does not cover are fully transparent.
pub fn stencil_recolor(
    scratch: &mut [u8],
    canvas: Canvas,
    mask: &MaskImage,
    crop: (i64, i64),
    color_straight: [u8; 4],
) -> MaskplayResult<()> {
    if scratch.len() != canvas.pixel_count() * 4 {
        return Err(MaskplayError::evaluation(
            "stencil scratch buffer does not match canvas size",
        ));
    }

    let [r, g, b, ca] = color_straight;
    let width = canvas.width as usize;
    for (i, px) in scratch.chunks_exact_mut(4).enumerate() {
        let x = (i % width) as i64 + crop.0;
        let y = (i / width) as i64 + crop.1;
        let a = mul_div255(u16::from(mask.alpha_at(x, y)), u16::from(ca));
        if a == 0 {
            px.copy_from_slice(&[0, 0, 0, 0]);
        } else {
            px.copy_from_slice(&[r, g, b, a]);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src, 1.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn stencil_preserves_alpha_and_exact_color() {
        let mask = MaskImage::from_alpha(3, 1, vec![0, 77, 255]).unwrap();
        let canvas = Canvas::new(3, 1).unwrap();
        let mut scratch = vec![9u8; 12];
        stencil_recolor(&mut scratch, canvas, &mask, (0, 0), [0xFF, 0xB3, 0xB3, 255]).unwrap();
        assert_eq!(
            scratch,
            vec![0, 0, 0, 0, 0xFF, 0xB3, 0xB3, 77, 0xFF, 0xB3, 0xB3, 255]
        );
    }

    #[test]
    fn stencil_applies_crop_offset() {
        // 4x2 mask, only column 3 opaque; a 2x2 canvas cropped at x=2 sees it in column 1.
        let alpha = vec![0, 0, 0, 255, 0, 0, 0, 255];
        let mask = MaskImage::from_alpha(4, 2, alpha).unwrap();
        let canvas = Canvas::new(2, 2).unwrap();
        let mut scratch = vec![0u8; 16];
        stencil_recolor(&mut scratch, canvas, &mask, (2, 0), [1, 2, 3, 255]).unwrap();
        let alphas: Vec<u8> = scratch.chunks_exact(4).map(|p| p[3]).collect();
        assert_eq!(alphas, vec![0, 255, 0, 255]);
    }

    #[test]
    fn stencil_scales_alpha_by_color_alpha() {
        let mask = MaskImage::from_alpha(2, 1, vec![255, 128]).unwrap();
        let canvas = Canvas::new(2, 1).unwrap();
        let mut scratch = vec![0u8; 8];
        stencil_recolor(&mut scratch, canvas, &mask, (0, 0), [255, 255, 255, 77]).unwrap();
        assert_eq!(scratch[3], 77);
        assert_eq!(scratch[7], ((128u32 * 77 + 127) / 255) as u8);
    }

    #[test]
    fn over_straight_rejects_mismatched_buffers() {
        let mut dst = vec![0u8; 8];
        assert!(over_straight_in_place(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn straight_export_unpremultiplies() {
        let mut s = Surface::new(Canvas::new(1, 1).unwrap());
        over_straight_in_place(&mut s.data, &[200, 100, 50, 255]).unwrap();
        assert_eq!(s.to_straight_rgba8(), vec![200, 100, 50, 255]);
        assert_eq!(s.pixel(0, 0), Some([200, 100, 50, 255]));
        assert_eq!(s.pixel(1, 0), None);
    }
}
