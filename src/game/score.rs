use std::collections::BTreeMap;

use crate::{
    config::{GameConfig, LabelId},
    foundation::core::EntityId,
};

/// Result band shown with the score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTier {
    AllCorrect,
    NoneCorrect,
    Partial,
}

impl MessageTier {
    pub fn message(self) -> &'static str {
        match self {
            MessageTier::AllCorrect => "Perfect! The stars were in your favor!",
            MessageTier::NoneCorrect => "0/100 pts. Good try! The stars weren't in your favor.",
            MessageTier::Partial => "Good try! The stars weren't in your favor.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScoreReport {
    pub correct: u32,
    pub total: u32,
    pub tier: MessageTier,
}

impl ScoreReport {
    pub fn message(&self) -> &'static str {
        self.tier.message()
    }
}

/// `"{correct}/{total}"`.
impl std::fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// Count entities whose assigned label matches the answer key.
pub fn score(config: &GameConfig, assignments: &BTreeMap<EntityId, LabelId>) -> ScoreReport {
    let correct = config
        .entities()
        .filter(|e| match (assignments.get(e), config.answer_key.get(e)) {
            (Some(given), Some(expected)) => given == expected,
            _ => false,
        })
        .count() as u32;
    let total = config.entity_count;

    let tier = if correct == total {
        MessageTier::AllCorrect
    } else if correct == 0 {
        MessageTier::NoneCorrect
    } else {
        MessageTier::Partial
    };

    ScoreReport {
        correct,
        total,
        tier,
    }
}
