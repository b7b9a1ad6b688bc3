//! Per-game context tying the clock, assets, compositor and state machine together.
//!
//! A host forwards its input as [`GameEvent`]s, executes the [`HostCommand`]s that come back,
//! calls [`GameSession::tick`] once per display refresh with the video's current time, and
//! redraws with [`GameSession::render`] whenever a tick or a command asks for it.

use std::sync::Arc;

use crate::{
    assets::store::AssetCache,
    clock::FrameClock,
    config::{GameConfig, LabelId},
    foundation::core::{Canvas, EntityId, FrameIndex, Point, Size},
    foundation::error::MaskplayResult,
    game::state::{GameState, HostCommand, LabelButton, Phase},
    render::composite::Surface,
    render::compositor::MaskCompositor,
    render::hit_test::hit_test,
    render::viewport::Viewport,
};

/// Input delivered by the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Native resolution of the video became known or changed.
    SourceResized { width: u32, height: u32 },
    /// The on-screen box the video and overlay occupy changed size.
    DisplayResized { width: f64, height: f64 },
    /// Click/tap in display units, relative to the overlay's top-left corner.
    Pointer { x: f64, y: f64 },
    LabelChosen { label: LabelId },
    PlaybackStarted,
    PlaybackPaused,
    Submit,
    Reset,
}

pub struct GameSession {
    config: Arc<GameConfig>,
    assets: Option<Arc<AssetCache>>,
    clock: FrameClock,
    source: Option<Canvas>,
    display: Option<Size>,
    viewport: Option<Viewport>,
    compositor: MaskCompositor,
    state: GameState,
}

impl GameSession {
    pub fn new(config: Arc<GameConfig>) -> Self {
        let clock = FrameClock::new(config.fps, config.total_frames);
        Self {
            state: GameState::new(config.clone()),
            config,
            assets: None,
            clock,
            source: None,
            display: None,
            viewport: None,
            compositor: MaskCompositor::new(Canvas {
                width: 1,
                height: 1,
            }),
        }
    }

    /// Convenience for a session whose assets are already loaded.
    pub fn with_assets(config: Arc<GameConfig>, assets: Arc<AssetCache>) -> Self {
        let mut session = Self::new(config);
        session.attach_assets(assets);
        session
    }

    /// Enable interaction and rendering. Until this is called, pointer and label events are
    /// ignored and the overlay stays empty.
    pub fn attach_assets(&mut self, assets: Arc<AssetCache>) {
        self.assets = Some(assets);
        self.clock.invalidate();
    }

    pub fn is_loaded(&self) -> bool {
        self.assets.is_some()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn current_frame(&self) -> Option<FrameIndex> {
        self.clock.current()
    }

    pub fn label_palette(&self) -> Vec<LabelButton> {
        self.state.label_palette()
    }

    /// Advance the frame clock to `time_secs`. Returns `true` when the overlay needs a redraw.
    pub fn tick(&mut self, time_secs: f64) -> bool {
        if self.assets.is_none() {
            return false;
        }
        self.clock.tick(time_secs).is_some()
    }

    /// Entity under a display-space point at the current frame.
    pub fn hit_test(&self, pointer: Point) -> Option<EntityId> {
        let assets = self.assets.as_deref()?;
        let viewport = self.viewport.as_ref()?;
        let frame = self.clock.current()?;
        hit_test(&self.config, assets, viewport, frame, pointer)
    }

    pub fn handle(&mut self, event: GameEvent) -> MaskplayResult<Vec<HostCommand>> {
        tracing::trace!(?event, "handle");
        let cmds = match event {
            GameEvent::SourceResized { width, height } => {
                let Ok(source) = Canvas::new(width, height) else {
                    tracing::debug!(width, height, "ignoring degenerate source size");
                    return Ok(Vec::new());
                };
                self.refresh_viewport(Some(source), self.display)?
            }
            GameEvent::DisplayResized { width, height } => {
                if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
                    tracing::debug!(width, height, "ignoring degenerate display size");
                    return Ok(Vec::new());
                }
                self.refresh_viewport(self.source, Some(Size::new(width, height)))?
            }
            GameEvent::Pointer { x, y } => {
                if self.assets.is_none() {
                    return Ok(Vec::new());
                }
                match self.hit_test(Point::new(x, y)) {
                    Some(entity) => self.state.select(entity),
                    None => self.state.deselect(),
                }
            }
            GameEvent::LabelChosen { label } => {
                if self.assets.is_none() {
                    return Ok(Vec::new());
                }
                self.state.choose_label(&label)
            }
            GameEvent::PlaybackStarted => self.state.playback_started(),
            GameEvent::PlaybackPaused => self.state.playback_paused(),
            GameEvent::Submit => self.state.submit(),
            GameEvent::Reset => self.state.reset(),
        };
        Ok(cmds)
    }

    /// Sizes are stored only once the viewport they produce is known to be valid.
    fn refresh_viewport(
        &mut self,
        source: Option<Canvas>,
        display: Option<Size>,
    ) -> MaskplayResult<Vec<HostCommand>> {
        let (Some(s), Some(d)) = (source, display) else {
            self.source = source;
            self.display = display;
            return Ok(Vec::new());
        };
        let viewport = Viewport::cover(s, d)?;
        self.source = source;
        self.display = display;
        if self.viewport == Some(viewport) {
            return Ok(Vec::new());
        }
        tracing::debug!(
            surface_w = viewport.surface().width,
            surface_h = viewport.surface().height,
            crop_x = viewport.crop.x,
            crop_y = viewport.crop.y,
            "viewport updated"
        );
        self.compositor.resize(viewport.surface());
        self.viewport = Some(viewport);
        Ok(vec![HostCommand::Redraw])
    }

    /// Compose the overlay for the current frame.
    ///
    /// Before assets, a viewport and a first tick are available this yields a cleared surface.
    pub fn render(&mut self) -> MaskplayResult<&Surface> {
        let (Some(assets), Some(viewport), Some(frame)) =
            (self.assets.as_deref(), self.viewport.as_ref(), self.clock.current())
        else {
            self.compositor.clear();
            return Ok(self.compositor.surface());
        };
        self.compositor.render(
            &self.config,
            assets,
            viewport,
            frame,
            self.state.assignments(),
            self.state.selection(),
        )
    }
}
