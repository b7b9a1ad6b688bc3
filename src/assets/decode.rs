use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::MaskplayResult;

/// Opacity plane of one (entity, frame) mask.
#[derive(Clone, Debug)]
pub struct MaskImage {
    pub width: u32,
    pub height: u32,
    /// One alpha byte per pixel, row-major, tightly packed.
    pub alpha: Arc<Vec<u8>>,
}

impl MaskImage {
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> MaskplayResult<Self> {
        if alpha.len() != width as usize * height as usize {
            return Err(crate::MaskplayError::asset(format!(
                "mask alpha plane has {} bytes, expected {width}x{height}",
                alpha.len()
            )));
        }
        Ok(Self {
            width,
            height,
            alpha: Arc::new(alpha),
        })
    }

    /// Alpha at `(x, y)`; pixels outside the image are transparent.
    pub fn alpha_at(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return 0;
        }
        self.alpha[y as usize * self.width as usize + x as usize]
    }
}

/// Parsed SVG icon.
#[derive(Clone, Debug)]
pub struct PreparedSvg {
    pub tree: Arc<usvg::Tree>,
}

pub fn decode_mask(bytes: &[u8]) -> MaskplayResult<MaskImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode mask image from memory")?;
    let (width, height) = (dyn_img.width(), dyn_img.height());

    let alpha = if dyn_img.color().has_alpha() {
        dyn_img
            .to_rgba8()
            .into_raw()
            .chunks_exact(4)
            .map(|px| px[3])
            .collect()
    } else {
        vec![255u8; width as usize * height as usize]
    };

    MaskImage::from_alpha(width, height, alpha)
}

pub fn parse_svg(bytes: &[u8]) -> MaskplayResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode_png(img: image::DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_mask_keeps_alpha_plane() {
        let img = image::RgbaImage::from_raw(2, 1, vec![9, 9, 9, 0, 255, 255, 255, 200]).unwrap();
        let buf = encode_png(image::DynamicImage::ImageRgba8(img));

        let mask = decode_mask(&buf).unwrap();
        assert_eq!((mask.width, mask.height), (2, 1));
        assert_eq!(mask.alpha.as_slice(), &[0, 200]);
    }

    #[test]
    fn decode_mask_without_alpha_is_opaque() {
        let img = image::GrayImage::from_raw(2, 2, vec![0, 10, 20, 30]).unwrap();
        let buf = encode_png(image::DynamicImage::ImageLuma8(img));

        let mask = decode_mask(&buf).unwrap();
        assert_eq!(mask.alpha.as_slice(), &[255, 255, 255, 255]);
    }

    #[test]
    fn decode_mask_rejects_garbage() {
        assert!(decode_mask(b"not an image").is_err());
    }

    #[test]
    fn alpha_at_outside_is_transparent() {
        let mask = MaskImage::from_alpha(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(mask.alpha_at(1, 1), 4);
        assert_eq!(mask.alpha_at(-1, 0), 0);
        assert_eq!(mask.alpha_at(2, 0), 0);
        assert_eq!(mask.alpha_at(0, 2), 0);
        assert!(MaskImage::from_alpha(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn decode_svg_parse_ok_and_err() {
        let ok = br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"></svg>"#;
        parse_svg(ok).unwrap();

        let bad = br#"<svg"#;
        assert!(parse_svg(bad).is_err());
    }
}
