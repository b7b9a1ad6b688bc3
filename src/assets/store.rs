use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::decode::{self, MaskImage, PreparedSvg},
    assets::svg_raster,
    config::{GameConfig, LabelId},
    foundation::core::{EntityId, FrameIndex},
    foundation::error::{MaskplayError, MaskplayResult},
};

/// Byte source for mask and icon files, addressed by `/`-separated relative paths.
pub trait AssetSource: Sync {
    fn read(&self, rel_path: &str) -> MaskplayResult<Vec<u8>>;
}

/// Reads assets from a directory on disk.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FsAssetSource {
    fn read(&self, rel_path: &str) -> MaskplayResult<Vec<u8>> {
        let path = rel_path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .fold(self.root.clone(), |acc, seg| acc.join(seg));
        let bytes =
            std::fs::read(&path).with_context(|| format!("read asset '{}'", path.display()))?;
        Ok(bytes)
    }
}

/// In-memory asset files, keyed by relative path.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rel_path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(rel_path.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    fn read(&self, rel_path: &str) -> MaskplayResult<Vec<u8>> {
        self.files
            .get(rel_path)
            .cloned()
            .ok_or_else(|| MaskplayError::asset(format!("no such asset '{rel_path}'")))
    }
}

/// Palette icon for a label: the parsed SVG, or a text stand-in when it failed to load.
#[derive(Clone, Debug)]
pub enum LabelIcon {
    Svg(PreparedSvg),
    Text(String),
}

impl LabelIcon {
    /// Premultiplied RGBA8 raster of an SVG icon; `None` for text fallbacks.
    pub fn rasterize(&self, width: u32, height: u32) -> MaskplayResult<Option<Vec<u8>>> {
        match self {
            LabelIcon::Svg(svg) => {
                svg_raster::rasterize_svg_to_premul_rgba8(&svg.tree, width, height).map(Some)
            }
            LabelIcon::Text(_) => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub masks_loaded: usize,
    pub masks_missing: usize,
    pub icons_loaded: usize,
    pub icons_fallback: usize,
}

/// Masks for every (entity, frame) pair and icons for every label.
///
/// Built once by [`AssetCache::load`] and read-only afterwards, so it can be shared between
/// sessions behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AssetCache {
    entity_count: u32,
    total_frames: u64,
    // Indexed `frame * entity_count + entity`.
    masks: Vec<Option<MaskImage>>,
    icons: BTreeMap<LabelId, LabelIcon>,
    stats: LoadStats,
}

impl AssetCache {
    /// A cache with every mask absent and every icon on its text fallback.
    pub fn empty(config: &GameConfig) -> Self {
        // Oversized grids are rejected by `GameConfig::validate`; clamp for unvalidated configs.
        let slots = config.mask_slots().unwrap_or(0);
        let icons = config
            .labels
            .iter()
            .map(|l| (l.id.clone(), LabelIcon::Text(l.abbreviation())))
            .collect();
        Self {
            entity_count: config.entity_count,
            total_frames: config.total_frames,
            masks: vec![None; slots],
            icons,
            stats: LoadStats {
                masks_missing: slots,
                icons_fallback: config.labels.len(),
                ..LoadStats::default()
            },
        }
    }

    /// Fetch every icon and mask the configuration names.
    ///
    /// Returns once every attempt has finished. Individual failures are logged and leave the
    /// asset absent (masks) or on its text fallback (icons).
    #[tracing::instrument(skip_all, fields(entities = config.entity_count, frames = config.total_frames))]
    pub fn load(config: &GameConfig, source: &dyn AssetSource) -> Self {
        let mut out = Self::empty(config);

        for label in &config.labels {
            let path = config.layout.icon_path(&label.id);
            match source.read(&path).and_then(|b| decode::parse_svg(&b)) {
                Ok(svg) => {
                    out.icons.insert(label.id.clone(), LabelIcon::Svg(svg));
                    out.stats.icons_loaded += 1;
                    out.stats.icons_fallback -= 1;
                }
                Err(err) => {
                    tracing::warn!(label = %label.id, %path, error = %err, "icon failed to load");
                }
            }
        }

        let entity_count = u64::from(config.entity_count);
        let masks: Vec<Option<MaskImage>> = (0..out.masks.len() as u64)
            .into_par_iter()
            .map(|slot| {
                let frame = FrameIndex(slot / entity_count);
                let entity = EntityId((slot % entity_count) as u32);
                let path = config.layout.mask_path(frame, entity);
                match source.read(&path).and_then(|b| decode::decode_mask(&b)) {
                    Ok(mask) => Some(mask),
                    Err(err) => {
                        tracing::warn!(frame = frame.0, entity = entity.0, %path, error = %err, "mask not found");
                        None
                    }
                }
            })
            .collect();

        let loaded = masks.iter().filter(|m| m.is_some()).count();
        out.stats.masks_loaded = loaded;
        out.stats.masks_missing = masks.len() - loaded;
        out.masks = masks;

        tracing::info!(
            masks_loaded = out.stats.masks_loaded,
            masks_missing = out.stats.masks_missing,
            icons_loaded = out.stats.icons_loaded,
            icons_fallback = out.stats.icons_fallback,
            "assets loaded"
        );
        out
    }

    fn slot(&self, entity: EntityId, frame: FrameIndex) -> Option<usize> {
        if entity.0 >= self.entity_count || frame.0 >= self.total_frames {
            return None;
        }
        let i = usize::try_from(frame.0)
            .ok()?
            .checked_mul(self.entity_count as usize)?
            .checked_add(entity.0 as usize)?;
        (i < self.masks.len()).then_some(i)
    }

    /// Mask for `entity` at `frame`, if it loaded.
    pub fn mask(&self, entity: EntityId, frame: FrameIndex) -> Option<&MaskImage> {
        self.slot(entity, frame)
            .and_then(|i| self.masks.get(i))
            .and_then(Option::as_ref)
    }

    /// Replace (or clear, with `None`) one mask slot.
    pub fn set_mask(
        &mut self,
        entity: EntityId,
        frame: FrameIndex,
        mask: Option<MaskImage>,
    ) -> MaskplayResult<()> {
        let i = self.slot(entity, frame).ok_or_else(|| {
            MaskplayError::validation(format!(
                "mask slot (entity {entity}, frame {}) is out of range",
                frame.0
            ))
        })?;
        match (self.masks[i].is_some(), mask.is_some()) {
            (false, true) => {
                self.stats.masks_loaded += 1;
                self.stats.masks_missing -= 1;
            }
            (true, false) => {
                self.stats.masks_loaded -= 1;
                self.stats.masks_missing += 1;
            }
            _ => {}
        }
        self.masks[i] = mask;
        Ok(())
    }

    pub fn icon(&self, label: &LabelId) -> Option<&LabelIcon> {
        self.icons.get(label)
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }
}
