use crate::{
    assets::store::AssetCache,
    config::GameConfig,
    foundation::core::{EntityId, FrameIndex, Point},
    render::viewport::Viewport,
};

/// Topmost entity whose mask is non-transparent under the display-space `pointer`.
///
/// Entities are tested from the highest id down, so the entity drawn last wins overlaps.
/// Entities without a mask at `frame` can never be hit.
pub fn hit_test(
    config: &GameConfig,
    assets: &AssetCache,
    viewport: &Viewport,
    frame: FrameIndex,
    pointer: Point,
) -> Option<EntityId> {
    let (sx, sy) = viewport.display_to_surface(pointer)?;
    let (mx, my) = viewport.surface_to_source(sx, sy);

    config.entities().rev().find(|&entity| {
        assets
            .mask(entity, frame)
            .is_some_and(|mask| mask.alpha_at(mx, my) > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::decode::MaskImage;
    use crate::foundation::core::{Canvas, Size};

    fn config(entities: u32) -> GameConfig {
        let mut cfg = GameConfig::zodiac();
        cfg.total_frames = 2;
        cfg.entity_count = entities;
        cfg.answer_key.clear();
        cfg
    }

    #[test]
    fn overlap_prefers_higher_id() {
        let cfg = config(3);
        let mut assets = AssetCache::empty(&cfg);
        for e in 0..3 {
            let m = MaskImage::from_alpha(2, 1, vec![255, if e == 1 { 255 } else { 0 }]).unwrap();
            assets.set_mask(EntityId(e), FrameIndex(0), Some(m)).unwrap();
        }
        let vp = Viewport::cover(Canvas::new(2, 1).unwrap(), Size::new(2.0, 1.0)).unwrap();

        assert_eq!(
            hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(0.5, 0.5)),
            Some(EntityId(2))
        );
        assert_eq!(
            hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(1.5, 0.5)),
            Some(EntityId(1))
        );
    }

    #[test]
    fn background_and_missing_masks_miss() {
        let cfg = config(2);
        let mut assets = AssetCache::empty(&cfg);
        let m = MaskImage::from_alpha(2, 2, vec![0, 0, 0, 255]).unwrap();
        assets.set_mask(EntityId(0), FrameIndex(0), Some(m)).unwrap();
        let vp = Viewport::cover(Canvas::new(2, 2).unwrap(), Size::new(20.0, 20.0)).unwrap();

        assert_eq!(hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(5.0, 5.0)), None);
        assert_eq!(
            hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(15.0, 15.0)),
            Some(EntityId(0))
        );
        assert_eq!(hit_test(&cfg, &assets, &vp, FrameIndex(1), Point::new(15.0, 15.0)), None);
        assert_eq!(hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(25.0, 5.0)), None);
    }

    #[test]
    fn pointer_is_shifted_by_crop() {
        // 4x2 source shown in a 2x2 display: one column cropped on each side.
        let cfg = config(1);
        let mut assets = AssetCache::empty(&cfg);
        let m = MaskImage::from_alpha(4, 2, vec![255, 0, 0, 0, 255, 0, 0, 0]).unwrap();
        assets.set_mask(EntityId(0), FrameIndex(0), Some(m)).unwrap();
        let vp = Viewport::cover(Canvas::new(4, 2).unwrap(), Size::new(2.0, 2.0)).unwrap();
        assert_eq!(vp.crop_px(), (1, 0));

        // Source column 0 is cropped away, so nothing on screen hits it.
        for x in [0.1, 0.9, 1.1, 1.9] {
            assert_eq!(hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(x, 0.5)), None);
        }

        let m = MaskImage::from_alpha(4, 2, vec![0, 255, 0, 0, 0, 255, 0, 0]).unwrap();
        assets.set_mask(EntityId(0), FrameIndex(0), Some(m)).unwrap();
        assert_eq!(
            hit_test(&cfg, &assets, &vp, FrameIndex(0), Point::new(0.5, 1.5)),
            Some(EntityId(0))
        );
    }
}
