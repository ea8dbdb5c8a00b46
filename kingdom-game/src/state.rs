//! The root persisted aggregate and the per-round choice record.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_OPENING_STATUS;
use crate::endgame::GameOverInfo;
use crate::event::{EventError, GameEvent, OptionId};
use crate::resources::{ResourceDelta, ResourceVector};

/// What the player picked last round and what it did. Written by the applier,
/// read once by the Feedback screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastChoiceResult {
    pub chosen_option_id: OptionId,
    pub resource_changes: ResourceDelta,
    pub outcome_text: String,
}

impl LastChoiceResult {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.outcome_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainState {
    pub round_number: u32,
    pub resources: ResourceVector,
    #[serde(default)]
    pub current_event: Option<GameEvent>,
    #[serde(default)]
    pub last_choice_result: Option<LastChoiceResult>,
    #[serde(default)]
    pub game_over: GameOverInfo,
    #[serde(default)]
    pub status_message: String,
    pub kingdom_background: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("round number must start at 1")]
    InvalidRound,
    #[error("resources are outside the allowed range")]
    ResourcesOutOfRange,
    #[error("kingdom background is missing")]
    MissingBackground,
    #[error("game is running but there is no current event")]
    MissingCurrentEvent,
    #[error("current event is unplayable: {0}")]
    InvalidCurrentEvent(#[from] EventError),
    #[error("game-over record carries details while the game is not over")]
    InconsistentGameOver,
}

impl MainState {
    /// Fresh run at round 1 built from the backend's opening content.
    #[must_use]
    pub fn opening(
        kingdom_background: String,
        first_event: GameEvent,
        status_message: Option<String>,
        resources: ResourceVector,
    ) -> Self {
        let status_message = status_message
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPENING_STATUS.to_string());
        Self {
            round_number: 1,
            resources: resources.clamped(),
            current_event: Some(first_event),
            last_choice_result: None,
            game_over: GameOverInfo::not_over(),
            status_message,
            kingdom_background,
        }
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over.is_over
    }

    /// Structural check applied to everything read back from storage.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.round_number < 1 {
            return Err(StateError::InvalidRound);
        }
        if !self.resources.is_within_bounds() {
            return Err(StateError::ResourcesOutOfRange);
        }
        if self.kingdom_background.trim().is_empty() {
            return Err(StateError::MissingBackground);
        }
        if !self.game_over.is_consistent() {
            return Err(StateError::InconsistentGameOver);
        }
        if !self.game_over.is_over {
            let event = self
                .current_event
                .as_ref()
                .ok_or(StateError::MissingCurrentEvent)?;
            event.validate()?;
        }
        Ok(())
    }
}
