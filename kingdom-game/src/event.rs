//! Narrative events and their options, as delivered by the content backend.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::resources::ResourceDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionId {
    A,
    B,
    C,
}

impl OptionId {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            _ => Err(()),
        }
    }
}

/// A single choice. `resource_changes` and `outcome_text` are optional on the
/// wire so that an incomplete option can be reported precisely instead of
/// failing the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOption {
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub resource_changes: Option<ResourceDelta>,
    #[serde(default)]
    pub outcome_text: Option<String>,
}

impl EventOption {
    /// The pre-resolved outcome, if present and not blank.
    #[must_use]
    pub fn resolved_outcome(&self) -> Option<&str> {
        self.outcome_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// # Errors
    ///
    /// Returns the first missing piece that makes this option unplayable.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.text.trim().is_empty() {
            return Err(EventError::MissingOptionText(self.id));
        }
        match self.resource_changes {
            None => return Err(EventError::MissingResourceChanges(self.id)),
            Some(delta) if delta.is_empty() => {
                return Err(EventError::MissingResourceChanges(self.id));
            }
            Some(_) => {}
        }
        if self.resolved_outcome().is_none() {
            return Err(EventError::MissingOutcome(self.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<u32>,
    #[serde(default)]
    pub options: Vec<EventOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

/// Structural problems with an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event description is empty")]
    EmptyDescription,
    #[error("event has no options")]
    NoOptions,
    #[error("event has {0} options; at most 3 are allowed")]
    TooManyOptions(usize),
    #[error("option {0} appears more than once")]
    DuplicateOption(OptionId),
    #[error("option {0} has no text")]
    MissingOptionText(OptionId),
    #[error("option {0} has no resource changes")]
    MissingResourceChanges(OptionId),
    #[error("option {0} has no pre-resolved outcome text")]
    MissingOutcome(OptionId),
}

impl GameEvent {
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&EventOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Check that the event can be rendered and every option chosen with no
    /// further network traffic.
    ///
    /// # Errors
    ///
    /// Returns the first [`EventError`] found.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.description.trim().is_empty() {
            return Err(EventError::EmptyDescription);
        }
        if self.options.is_empty() {
            return Err(EventError::NoOptions);
        }
        if self.options.len() > OptionId::ALL.len() {
            return Err(EventError::TooManyOptions(self.options.len()));
        }
        for (index, option) in self.options.iter().enumerate() {
            if self.options[..index].iter().any(|prior| prior.id == option.id) {
                return Err(EventError::DuplicateOption(option.id));
            }
            option.validate()?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::event;
    use super::*;

    #[test]
    fn complete_event_validates() {
        assert_eq!(event("A comet crosses the sky").validate(), Ok(()));
    }

    #[test]
    fn structural_failures_are_reported() {
        let mut e = event("  ");
        assert_eq!(e.validate(), Err(EventError::EmptyDescription));

        e = event("Drought");
        e.options.clear();
        assert_eq!(e.validate(), Err(EventError::NoOptions));

        e = event("Drought");
        e.options[1].outcome_text = Some(String::new());
        assert_eq!(e.validate(), Err(EventError::MissingOutcome(OptionId::B)));

        e = event("Drought");
        e.options[2].resource_changes = None;
        assert_eq!(
            e.validate(),
            Err(EventError::MissingResourceChanges(OptionId::C))
        );

        e = event("Drought");
        e.options[0].resource_changes = Some(ResourceDelta::default());
        assert_eq!(
            e.validate(),
            Err(EventError::MissingResourceChanges(OptionId::A))
        );

        e = event("Drought");
        e.options[1].id = OptionId::A;
        assert_eq!(e.validate(), Err(EventError::DuplicateOption(OptionId::A)));
    }

    #[test]
    fn wire_event_parses_with_partial_deltas() {
        let json = r#"{
            "description": "Envoys arrive from the east.",
            "stage": 2,
            "options": [
                {"id": "A", "text": "Welcome them", "resourceChanges": {"treasury": 1, "faith": -1}, "outcomeText": "Trade flourishes."},
                {"id": "B", "text": "Turn them away", "resourceChanges": {"army": 1}, "outcomeText": "The border hardens."}
            ]
        }"#;
        let parsed: GameEvent = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.validate(), Ok(()));
        assert_eq!(parsed.stage, Some(2));
        let a = parsed.option(OptionId::A).unwrap();
        assert_eq!(a.resource_changes.unwrap().people, None);
        assert_eq!(a.resource_changes.unwrap().treasury, Some(1));
        assert!(parsed.option(OptionId::C).is_none());
    }

    #[test]
    fn option_without_outcome_parses_but_fails_validation() {
        let json = r#"{"description": "x", "options": [{"id": "A", "text": "t", "resourceChanges": {"army": 1}}]}"#;
        let parsed: GameEvent = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.validate(), Err(EventError::MissingOutcome(OptionId::A)));
    }
}
