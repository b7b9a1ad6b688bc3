//! maskplay composites per-frame segmentation masks over a playing video and turns clicks on
//! them into a labelling game.
//!
//! The crate is toolkit independent. A host:
//!
//! - loads a [`GameConfig`] and an [`AssetCache`] of masks and label icons
//! - creates a [`GameSession`]
//! - forwards input as [`GameEvent`]s and carries out the returned [`HostCommand`]s
//! - calls [`GameSession::tick`] every display refresh and [`GameSession::render`] when it says so
#![forbid(unsafe_code)]

pub mod assets;
pub mod clock;
pub mod config;
pub mod foundation;
pub mod game;
pub mod render;
pub mod session;

pub use crate::assets::color::ColorDef;
pub use crate::assets::decode::MaskImage;
pub use crate::assets::store::{
    AssetCache, AssetSource, FsAssetSource, LabelIcon, LoadStats, MemoryAssetSource,
};
pub use crate::clock::FrameClock;
pub use crate::config::{AssetLayout, GameConfig, LabelDef, LabelId, LabelPolicy};
pub use crate::foundation::core::{Canvas, EntityId, Fps, FrameIndex, Point, Rgba8Premul, Size};
pub use crate::foundation::error::{MaskplayError, MaskplayResult};
pub use crate::game::score::{MessageTier, ScoreReport, score};
pub use crate::game::state::{GameState, HostCommand, LabelButton, Phase};
pub use crate::render::composite::Surface;
pub use crate::render::compositor::{MaskCompositor, OverlayDraw, overlay_draws};
pub use crate::render::hit_test::hit_test;
pub use crate::render::viewport::Viewport;
pub use crate::session::{GameEvent, GameSession};
