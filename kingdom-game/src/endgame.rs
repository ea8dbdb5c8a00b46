//! Terminal bookkeeping: the persisted game-over record and the local
//! ending texts used when the backend never supplied one.
use serde::{Deserialize, Serialize};

use crate::resources::{Bound, Channel, TerminalCheck, TerminalReason};

const FALLBACK_ENDING: &str = "Your reign has come to its end...";

/// Persisted terminal status. When `is_over` is false every other field is
/// `None`; [`GameOverInfo::is_consistent`] checks that.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverInfo {
    pub is_over: bool,
    #[serde(default)]
    pub reason: Option<TerminalReason>,
    #[serde(default)]
    pub ending_text: Option<String>,
    #[serde(default)]
    pub final_rounds: Option<u32>,
}

impl GameOverInfo {
    #[must_use]
    pub fn not_over() -> Self {
        Self::default()
    }

    /// Build the record for a round that just ended. `decisive_round` is the
    /// round in which the terminal choice was made.
    #[must_use]
    pub fn from_check(check: TerminalCheck, decisive_round: u32) -> Self {
        if !check.is_over {
            return Self::not_over();
        }
        Self {
            is_over: true,
            reason: check.reason,
            ending_text: Some(generic_ending_text(check.reason).to_string()),
            final_rounds: Some(decisive_round),
        }
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.is_over
            || (self.reason.is_none() && self.ending_text.is_none() && self.final_rounds.is_none())
    }

    /// Ending text to show, preferring a non-blank stored text.
    #[must_use]
    pub fn display_text(&self) -> String {
        self.ending_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map_or_else(
                || generic_ending_text(self.reason).to_string(),
                str::to_string,
            )
    }
}

/// Total lookup from terminal reason to a closing line.
#[must_use]
pub const fn generic_ending_text(reason: Option<TerminalReason>) -> &'static str {
    let Some(reason) = reason else {
        return FALLBACK_ENDING;
    };
    match (reason.channel, reason.bound) {
        (Channel::People, Bound::Zero) => {
            "Your people scatter and their loyalty is gone; the kingdom fades into desolation..."
        }
        (Channel::People, Bound::Max) => {
            "The population swells beyond what the land can bear; order collapses and your rule ends in chaos..."
        }
        (Channel::Army, Bound::Zero) => {
            "With the army in ruins, invaders pour across the border and the kingdom burns..."
        }
        (Channel::Army, Bound::Max) => {
            "The generals grow too strong, rise against the crown and hand the realm to warlords..."
        }
        (Channel::Treasury, Bound::Zero) => {
            "The treasury runs dry, trade withers and the kingdom breaks apart in poverty..."
        }
        (Channel::Treasury, Bound::Max) => {
            "Hoarded wealth breeds corruption; the court rots in luxury and the dynasty falls..."
        }
        (Channel::Faith, Bound::Zero) => {
            "Faith crumbles, heresies spread and the kingdom loses its soul..."
        }
        (Channel::Faith, Bound::Max) => {
            "Zealotry sweeps the land; the clergy rule in your name and you reign as their puppet..."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_reason_has_a_distinct_ending() {
        let mut seen = HashSet::new();
        for channel in Channel::ALL {
            for reason in [TerminalReason::zero(channel), TerminalReason::max(channel)] {
                let text = generic_ending_text(Some(reason));
                assert_ne!(text, FALLBACK_ENDING);
                assert!(seen.insert(text), "duplicate ending for {reason}");
            }
        }
        assert_eq!(generic_ending_text(None), FALLBACK_ENDING);
    }

    #[test]
    fn not_over_record_carries_no_details() {
        let info = GameOverInfo::from_check(TerminalCheck::default(), 4);
        assert_eq!(info, GameOverInfo::not_over());
        assert!(info.is_consistent());

        let stale = GameOverInfo {
            is_over: false,
            final_rounds: Some(3),
            ..GameOverInfo::default()
        };
        assert!(!stale.is_consistent());
    }

    #[test]
    fn terminal_record_uses_generic_text_and_decisive_round() {
        let check = TerminalCheck {
            is_over: true,
            reason: Some(TerminalReason::zero(Channel::Faith)),
        };
        let info = GameOverInfo::from_check(check, 7);
        assert!(info.is_over);
        assert_eq!(info.final_rounds, Some(7));
        assert_eq!(
            info.ending_text.as_deref(),
            Some(generic_ending_text(check.reason))
        );
    }

    #[test]
    fn blank_stored_text_falls_back_to_table() {
        let info = GameOverInfo {
            is_over: true,
            reason: Some(TerminalReason::max(Channel::Army)),
            ending_text: Some(String::from("   ")),
            final_rounds: Some(2),
        };
        assert_eq!(
            info.display_text(),
            generic_ending_text(Some(TerminalReason::max(Channel::Army)))
        );
    }

    #[test]
    fn wire_shape_uses_reason_codes() {
        let json = r#"{"isOver":true,"reason":"treasury_max","endingText":null,"finalRounds":9}"#;
        let info: GameOverInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.reason, Some(TerminalReason::max(Channel::Treasury)));
        let back = serde_json::to_value(&info).unwrap();
        assert_eq!(back["reason"], "treasury_max");
    }
}
