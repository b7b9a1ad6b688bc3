use crate::foundation::error::{MaskplayError, MaskplayResult};

// Icons are palette-sized; anything larger is a caller bug.
const MAX_ICON_DIM: u32 = 4_096;

/// Rasterize an SVG tree into premultiplied RGBA8, scaled to fit `width`x`height` exactly.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> MaskplayResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(MaskplayError::validation("icon raster size must be > 0"));
    }
    if width > MAX_ICON_DIM || height > MAX_ICON_DIM {
        return Err(MaskplayError::validation(format!(
            "icon raster size too large: {width}x{height} (max {MAX_ICON_DIM}x{MAX_ICON_DIM})"
        )));
    }

    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(MaskplayError::evaluation("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| MaskplayError::evaluation("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}
