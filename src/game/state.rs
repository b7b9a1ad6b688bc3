use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    config::{GameConfig, LabelId, LabelPolicy},
    foundation::core::EntityId,
    game::score::{ScoreReport, score},
};

/// Side effects the host must carry out after a transition, in order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum HostCommand {
    Play,
    Pause,
    SetSubmitVisible(bool),
    SetPickerEnabled(bool),
    ShowResult(ScoreReport),
    DismissResult,
    Redraw,
}

/// Coarse game phase, derived from the state fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Paused,
    Selecting(EntityId),
    ReadyToSubmit,
    Submitted,
}

/// Palette button state for one label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelButton {
    pub label: LabelId,
    pub enabled: bool,
    /// Held by an entity other than the current selection.
    pub used: bool,
}

/// Assignment, selection and submission state of one game.
#[derive(Clone, Debug)]
pub struct GameState {
    config: Arc<GameConfig>,
    assignments: BTreeMap<EntityId, LabelId>,
    selection: Option<EntityId>,
    result: Option<ScoreReport>,
    playing: bool,
    paused_by_selection: bool,
}

impl GameState {
    /// A fresh game. Playback is assumed to be running.
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self {
            config,
            assignments: BTreeMap::new(),
            selection: None,
            result: None,
            playing: true,
            paused_by_selection: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn assignments(&self) -> &BTreeMap<EntityId, LabelId> {
        &self.assignments
    }

    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&ScoreReport> {
        self.result.as_ref()
    }

    pub fn all_assigned(&self) -> bool {
        self.assignments.len() == self.config.entity_count as usize
    }

    pub fn submit_visible(&self) -> bool {
        self.all_assigned() && self.playing && self.selection.is_none()
    }

    pub fn phase(&self) -> Phase {
        if self.result.is_some() {
            Phase::Submitted
        } else if let Some(e) = self.selection {
            Phase::Selecting(e)
        } else if self.submit_visible() {
            Phase::ReadyToSubmit
        } else if self.playing {
            Phase::Playing
        } else {
            Phase::Paused
        }
    }

    fn holder_other_than_selection(&self, label: &LabelId) -> bool {
        self.assignments
            .iter()
            .any(|(e, l)| l == label && Some(*e) != self.selection)
    }

    pub fn label_palette(&self) -> Vec<LabelButton> {
        let picking = self.selection.is_some() && self.result.is_none();
        self.config
            .labels
            .iter()
            .map(|l| {
                let used = self.holder_other_than_selection(&l.id);
                let blocked = used && self.config.label_policy == LabelPolicy::Unique;
                LabelButton {
                    label: l.id.clone(),
                    enabled: picking && !blocked,
                    used,
                }
            })
            .collect()
    }

    /// Pointer landed on `entity`.
    pub fn select(&mut self, entity: EntityId) -> Vec<HostCommand> {
        if self.result.is_some() || !self.config.contains_entity(entity) {
            return Vec::new();
        }
        tracing::debug!(entity = entity.0, "entity selected");

        let mut out = Vec::new();
        if self.playing {
            self.playing = false;
            self.paused_by_selection = true;
            out.push(HostCommand::Pause);
        }
        self.selection = Some(entity);
        out.extend([
            HostCommand::SetSubmitVisible(false),
            HostCommand::SetPickerEnabled(true),
            HostCommand::Redraw,
        ]);
        out
    }

    /// Pointer landed on no entity.
    pub fn deselect(&mut self) -> Vec<HostCommand> {
        if self.result.is_some() || self.selection.take().is_none() {
            return Vec::new();
        }
        tracing::debug!("selection cleared");

        let mut out = Vec::new();
        if self.paused_by_selection && !self.playing {
            self.playing = true;
            out.push(HostCommand::Play);
        }
        self.paused_by_selection = false;
        out.extend([
            HostCommand::SetPickerEnabled(false),
            HostCommand::SetSubmitVisible(self.submit_visible()),
            HostCommand::Redraw,
        ]);
        out
    }

    /// Assign `label` to the selected entity.
    pub fn choose_label(&mut self, label: &LabelId) -> Vec<HostCommand> {
        let Some(entity) = self.selection else {
            return Vec::new();
        };
        if self.result.is_some() || self.config.label(label).is_none() {
            return Vec::new();
        }
        if self.config.label_policy == LabelPolicy::Unique
            && self.holder_other_than_selection(label)
        {
            tracing::debug!(entity = entity.0, %label, "label already taken");
            return Vec::new();
        }
        tracing::debug!(entity = entity.0, %label, "label assigned");

        self.assignments.insert(entity, label.clone());
        self.selection = None;
        self.paused_by_selection = false;

        let mut out = vec![HostCommand::SetPickerEnabled(false)];
        if !self.playing {
            self.playing = true;
            out.push(HostCommand::Play);
        }
        out.extend([
            HostCommand::SetSubmitVisible(self.submit_visible()),
            HostCommand::Redraw,
        ]);
        out
    }

    pub fn playback_started(&mut self) -> Vec<HostCommand> {
        self.playing = true;
        self.paused_by_selection = false;
        vec![HostCommand::SetSubmitVisible(self.submit_visible())]
    }

    pub fn playback_paused(&mut self) -> Vec<HostCommand> {
        self.playing = false;
        vec![HostCommand::SetSubmitVisible(false)]
    }

    /// Score the current assignments once; later calls are no-ops until [`GameState::reset`].
    pub fn submit(&mut self) -> Vec<HostCommand> {
        if self.result.is_some() {
            tracing::debug!("submit ignored, already submitted");
            return Vec::new();
        }
        let report = score(&self.config, &self.assignments);
        tracing::debug!(score = %report, "submitted");
        self.result = Some(report.clone());

        let mut out = Vec::new();
        if self.playing {
            self.playing = false;
            out.push(HostCommand::Pause);
        }
        self.paused_by_selection = false;
        if self.selection.take().is_some() {
            out.extend([HostCommand::SetPickerEnabled(false), HostCommand::Redraw]);
        }
        out.extend([
            HostCommand::SetSubmitVisible(false),
            HostCommand::ShowResult(report),
        ]);
        out
    }

    pub fn reset(&mut self) -> Vec<HostCommand> {
        tracing::debug!("game reset");
        self.assignments.clear();
        self.selection = None;
        self.result = None;
        self.paused_by_selection = false;
        self.playing = true;
        vec![
            HostCommand::DismissResult,
            HostCommand::SetPickerEnabled(false),
            HostCommand::Play,
            HostCommand::SetSubmitVisible(self.submit_visible()),
            HostCommand::Redraw,
        ]
    }
}
