//! Bounded conversation log passed to the backend as context.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Keep only the most recent `limit` turns, preserving order.
#[must_use]
pub fn most_recent(turns: &[HistoryTurn], limit: usize) -> &[HistoryTurn] {
    let skip = turns.len().saturating_sub(limit);
    &turns[skip..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_drops_oldest_first() {
        let turns: Vec<HistoryTurn> = (0..7).map(|i| HistoryTurn::user(i.to_string())).collect();
        let kept = most_recent(&turns, 3);
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["4", "5", "6"]);
        assert_eq!(most_recent(&turns, 10).len(), 7);
        assert!(most_recent(&turns, 0).is_empty());
    }
}
