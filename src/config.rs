use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;

use crate::{
    assets::color::ColorDef,
    foundation::core::{EntityId, Fps, FrameIndex},
    foundation::error::{MaskplayError, MaskplayResult},
};

/// String identifier of a label (for example `"aries"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable category.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabelDef {
    pub id: LabelId,
    pub name: String,
    pub color: ColorDef,
}

impl LabelDef {
    /// Text shown in place of the icon when the icon asset is missing.
    pub fn abbreviation(&self) -> String {
        self.name.chars().take(2).collect()
    }
}

/// Whether two entities may hold the same label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    #[default]
    AllowDuplicates,
    Unique,
}

/// Where masks and icons live, relative to the asset root.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    pub mask_dir: String,
    pub mask_ext: String,
    pub icon_dir: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            mask_dir: "masks".to_owned(),
            mask_ext: "png".to_owned(),
            icon_dir: "assets/svg".to_owned(),
        }
    }
}

impl AssetLayout {
    pub fn mask_path(&self, frame: FrameIndex, entity: EntityId) -> String {
        format!(
            "{}/{}_{}.{}",
            self.mask_dir.trim_end_matches('/'),
            frame.0,
            entity.0,
            self.mask_ext
        )
    }

    pub fn icon_path(&self, label: &LabelId) -> String {
        format!("{}/{}.svg", self.icon_dir.trim_end_matches('/'), label.0)
    }
}

/// Upper bound on `total_frames * entity_count`.
pub const MAX_MASK_SLOTS: usize = 1 << 24;

fn default_selection_overlay() -> ColorDef {
    ColorDef::rgba(1.0, 1.0, 1.0, 0.3)
}

/// Game constants fixed for the lifetime of a session.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GameConfig {
    pub fps: Fps,
    pub total_frames: u64,
    pub entity_count: u32,
    pub labels: Vec<LabelDef>,
    pub answer_key: BTreeMap<EntityId, LabelId>,
    #[serde(default = "default_selection_overlay")]
    pub selection_overlay: ColorDef,
    #[serde(default)]
    pub label_policy: LabelPolicy,
    #[serde(default)]
    pub layout: AssetLayout,
}

impl GameConfig {
    /// The two-person zodiac game the crate ships with.
    pub fn zodiac() -> Self {
        const SIGNS: [(&str, &str, &str); 12] = [
            ("aries", "Aries", "#FFB3B3"),
            ("taurus", "Taurus", "#FFD9B3"),
            ("gemini", "Gemini", "#FFFFB3"),
            ("cancer", "Cancer", "#D9FFB3"),
            ("leo", "Leo", "#B3FFB3"),
            ("virgo", "Virgo", "#B3FFD9"),
            ("libra", "Libra", "#B3FFFF"),
            ("scorpio", "Scorpio", "#B3D9FF"),
            ("sagittarius", "Sagittarius", "#B3B3FF"),
            ("capricorn", "Capricorn", "#D9B3FF"),
            ("aquarius", "Aquarius", "#FFB3FF"),
            ("pisces", "Pisces", "#FFB3D9"),
        ];

        let labels = SIGNS
            .iter()
            .map(|(id, name, hex)| LabelDef {
                id: LabelId::from(*id),
                name: (*name).to_owned(),
                color: ColorDef::parse(hex).unwrap_or(ColorDef::rgba(1.0, 1.0, 1.0, 1.0)),
            })
            .collect();

        let mut answer_key = BTreeMap::new();
        answer_key.insert(EntityId(0), LabelId::from("aries"));
        answer_key.insert(EntityId(1), LabelId::from("taurus"));

        Self {
            fps: Fps {
                num: 2997,
                den: 100,
            },
            total_frames: 282,
            entity_count: 2,
            labels,
            answer_key,
            selection_overlay: default_selection_overlay(),
            label_policy: LabelPolicy::AllowDuplicates,
            layout: AssetLayout::default(),
        }
    }

    pub fn from_json(json: &str) -> MaskplayResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> MaskplayResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read game config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> MaskplayResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(MaskplayError::validation("fps must have num>0 and den>0"));
        }
        if self.total_frames == 0 {
            return Err(MaskplayError::validation("total_frames must be > 0"));
        }
        if self.entity_count == 0 {
            return Err(MaskplayError::validation("entity_count must be > 0"));
        }
        if self.mask_slots().is_none() {
            return Err(MaskplayError::validation(format!(
                "total_frames * entity_count must be <= {MAX_MASK_SLOTS}"
            )));
        }
        if self.labels.is_empty() {
            return Err(MaskplayError::validation("at least one label is required"));
        }

        let mut seen = BTreeSet::new();
        for label in &self.labels {
            if label.id.0.is_empty() {
                return Err(MaskplayError::validation("label id must be non-empty"));
            }
            if !seen.insert(&label.id) {
                return Err(MaskplayError::validation(format!(
                    "duplicate label id \"{}\"",
                    label.id
                )));
            }
        }

        for (entity, label) in &self.answer_key {
            if entity.0 >= self.entity_count {
                return Err(MaskplayError::validation(format!(
                    "answer key entity {entity} is outside [0, {})",
                    self.entity_count
                )));
            }
            if !seen.contains(label) {
                return Err(MaskplayError::validation(format!(
                    "answer key for entity {entity} references unknown label \"{label}\""
                )));
            }
        }

        if self.layout.mask_ext.is_empty() {
            return Err(MaskplayError::validation("layout.mask_ext must be non-empty"));
        }
        Ok(())
    }

    /// Number of (frame, entity) mask slots, `None` when it exceeds [`MAX_MASK_SLOTS`].
    pub fn mask_slots(&self) -> Option<usize> {
        usize::try_from(self.total_frames)
            .ok()
            .and_then(|f| f.checked_mul(self.entity_count as usize))
            .filter(|&n| n <= MAX_MASK_SLOTS)
    }

    pub fn label(&self, id: &LabelId) -> Option<&LabelDef> {
        self.labels.iter().find(|l| &l.id == id)
    }

    pub fn entities(&self) -> impl DoubleEndedIterator<Item = EntityId> + use<> {
        (0..self.entity_count).map(EntityId)
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        entity.0 < self.entity_count
    }

    pub fn last_frame(&self) -> FrameIndex {
        FrameIndex(self.total_frames.saturating_sub(1))
    }
}
