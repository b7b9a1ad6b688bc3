use std::collections::BTreeMap;

use crate::{
    assets::color::ColorDef,
    assets::store::AssetCache,
    config::{GameConfig, LabelId},
    foundation::core::{Canvas, EntityId, FrameIndex},
    foundation::error::MaskplayResult,
    render::composite::{Surface, over_straight_in_place, stencil_recolor},
    render::viewport::Viewport,
};

/// One recolored mask draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayDraw {
    pub entity: EntityId,
    pub color: ColorDef,
}

/// Draw list for `frame`, back to front.
///
/// Assigned entities come first in ascending id order, each in its label color; the selected
/// entity follows in the selection overlay color. Entities without a mask at `frame` are skipped.
pub fn overlay_draws(
    config: &GameConfig,
    assets: &AssetCache,
    frame: FrameIndex,
    assignments: &BTreeMap<EntityId, LabelId>,
    selection: Option<EntityId>,
) -> Vec<OverlayDraw> {
    let mut draws: Vec<OverlayDraw> = config
        .entities()
        .filter(|&e| assets.mask(e, frame).is_some())
        .filter_map(|e| {
            let label = config.label(assignments.get(&e)?)?;
            Some(OverlayDraw {
                entity: e,
                color: label.color,
            })
        })
        .collect();

    if let Some(sel) = selection
        && assets.mask(sel, frame).is_some()
    {
        draws.push(OverlayDraw {
            entity: sel,
            color: config.selection_overlay,
        });
    }
    draws
}

/// Renders entity overlays into a surface sized by the current [`Viewport`].
#[derive(Debug)]
pub struct MaskCompositor {
    surface: Surface,
    scratch: Vec<u8>,
}

impl MaskCompositor {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            surface: Surface::new(canvas),
            scratch: vec![0u8; canvas.pixel_count() * 4],
        }
    }

    /// Reallocate buffers when the backing resolution changes.
    pub fn resize(&mut self, canvas: Canvas) {
        if self.surface.canvas() == canvas {
            return;
        }
        self.surface = Surface::new(canvas);
        self.scratch = vec![0u8; canvas.pixel_count() * 4];
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    #[tracing::instrument(level = "trace", skip_all, fields(frame = frame.0))]
    pub fn render(
        &mut self,
        config: &GameConfig,
        assets: &AssetCache,
        viewport: &Viewport,
        frame: FrameIndex,
        assignments: &BTreeMap<EntityId, LabelId>,
        selection: Option<EntityId>,
    ) -> MaskplayResult<&Surface> {
        self.resize(viewport.surface());
        self.surface.clear();

        let canvas = self.surface.canvas();
        let crop = viewport.crop_px();
        for draw in overlay_draws(config, assets, frame, assignments, selection) {
            let Some(mask) = assets.mask(draw.entity, frame) else {
                continue;
            };
            stencil_recolor(
                &mut self.scratch,
                canvas,
                mask,
                crop,
                straight_rgba8(draw.color),
            )?;
            over_straight_in_place(&mut self.surface.data, &self.scratch)?;
        }
        Ok(&self.surface)
    }
}

fn straight_rgba8(color: ColorDef) -> [u8; 4] {
    fn to_u8(x: f64) -> u8 {
        (x.clamp(0.0, 1.0) * 255.0).round() as u8
    }
    [to_u8(color.r), to_u8(color.g), to_u8(color.b), to_u8(color.a)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::decode::MaskImage;
    use crate::foundation::core::Size;

    fn setup() -> (GameConfig, AssetCache) {
        let mut cfg = GameConfig::zodiac();
        cfg.total_frames = 4;
        let mut assets = AssetCache::empty(&cfg);
        // Entity 0 covers the left column, entity 1 the whole 2x2 frame.
        for f in 0..4 {
            assets
                .set_mask(
                    EntityId(0),
                    FrameIndex(f),
                    Some(MaskImage::from_alpha(2, 2, vec![255, 0, 255, 0]).unwrap()),
                )
                .unwrap();
            if f != 2 {
                assets
                    .set_mask(
                        EntityId(1),
                        FrameIndex(f),
                        Some(MaskImage::from_alpha(2, 2, vec![255; 4]).unwrap()),
                    )
                    .unwrap();
            }
        }
        (cfg, assets)
    }

    fn assign(pairs: &[(u32, &str)]) -> BTreeMap<EntityId, LabelId> {
        pairs
            .iter()
            .map(|(e, l)| (EntityId(*e), LabelId::from(*l)))
            .collect()
    }

    #[test]
    fn draw_order_is_ascending_then_selection() {
        let (cfg, assets) = setup();
        let draws = overlay_draws(
            &cfg,
            &assets,
            FrameIndex(0),
            &assign(&[(1, "taurus"), (0, "aries")]),
            Some(EntityId(0)),
        );
        let ids: Vec<u32> = draws.iter().map(|d| d.entity.0).collect();
        assert_eq!(ids, vec![0, 1, 0]);
        assert_eq!(draws[2].color, cfg.selection_overlay);
    }

    #[test]
    fn missing_mask_is_never_drawn() {
        let (cfg, assets) = setup();
        let draws = overlay_draws(
            &cfg,
            &assets,
            FrameIndex(2),
            &assign(&[(0, "aries"), (1, "taurus")]),
            Some(EntityId(1)),
        );
        let ids: Vec<u32> = draws.iter().map(|d| d.entity.0).collect();
        assert_eq!(ids, vec![0]);
    }

    #[test]
    fn unassigned_entities_are_not_drawn() {
        let (cfg, assets) = setup();
        let draws = overlay_draws(&cfg, &assets, FrameIndex(0), &BTreeMap::new(), None);
        assert!(draws.is_empty());
    }

    #[test]
    fn render_later_draws_occlude_earlier() {
        let (cfg, assets) = setup();
        let vp = Viewport::cover(Canvas::new(2, 2).unwrap(), Size::new(2.0, 2.0)).unwrap();
        let mut comp = MaskCompositor::new(Canvas::new(1, 1).unwrap());

        let s = comp
            .render(
                &cfg,
                &assets,
                &vp,
                FrameIndex(0),
                &assign(&[(0, "aries"), (1, "taurus")]),
                None,
            )
            .unwrap();
        assert_eq!((s.width, s.height), (2, 2));
        // Entity 1 (taurus, #FFD9B3) is drawn after entity 0 and covers every pixel.
        assert_eq!(s.pixel(0, 0), Some([0xFF, 0xD9, 0xB3, 255]));
        assert_eq!(s.pixel(1, 1), Some([0xFF, 0xD9, 0xB3, 255]));
    }

    #[test]
    fn render_selection_tints_on_top() {
        let (cfg, assets) = setup();
        let vp = Viewport::cover(Canvas::new(2, 2).unwrap(), Size::new(2.0, 2.0)).unwrap();
        let mut comp = MaskCompositor::new(vp.surface());

        let s = comp
            .render(
                &cfg,
                &assets,
                &vp,
                FrameIndex(0),
                &assign(&[(0, "aries")]),
                Some(EntityId(0)),
            )
            .unwrap();
        let sel = cfg.selection_overlay.to_rgba8_premul().to_array();
        let expected = crate::render::composite::over([0xFF, 0xB3, 0xB3, 255], sel, 1.0);
        assert_eq!(s.pixel(0, 0), Some(expected));
        assert_eq!(s.pixel(1, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn render_at_missing_frame_clears_previous_output() {
        let (cfg, assets) = setup();
        let vp = Viewport::cover(Canvas::new(2, 2).unwrap(), Size::new(2.0, 2.0)).unwrap();
        let mut comp = MaskCompositor::new(vp.surface());
        let a = assign(&[(1, "taurus")]);

        comp.render(&cfg, &assets, &vp, FrameIndex(0), &a, None).unwrap();
        assert_ne!(comp.surface().pixel(1, 1), Some([0, 0, 0, 0]));

        let s = comp.render(&cfg, &assets, &vp, FrameIndex(2), &a, None).unwrap();
        assert!(s.data.iter().all(|&b| b == 0));
    }
}
