//! The four bounded kingdom channels and the pure arithmetic over them.
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{INITIAL_CHANNEL_VALUE, RESOURCE_MAX, RESOURCE_MIN};

/// One of the four named resources, in the fixed scan order used by
/// [`check_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    People,
    Army,
    Treasury,
    Faith,
}

impl Channel {
    pub const ALL: [Self; 4] = [Self::People, Self::Army, Self::Treasury, Self::Faith];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Army => "army",
            Self::Treasury => "treasury",
            Self::Faith => "faith",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "people" => Ok(Self::People),
            "army" => Ok(Self::Army),
            "treasury" => Ok(Self::Treasury),
            "faith" => Ok(Self::Faith),
            _ => Err(()),
        }
    }
}

/// Absolute channel values. Always within `[RESOURCE_MIN, RESOURCE_MAX]` once
/// it has passed through [`apply_delta`] or [`ResourceVector::clamped`].
///
/// Deserialization is lenient per channel: a missing or non-integer value is
/// replaced by the initial channel value so that a damaged record can still
/// be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVector {
    #[serde(default = "initial_channel", deserialize_with = "lenient_channel")]
    pub people: i32,
    #[serde(default = "initial_channel", deserialize_with = "lenient_channel")]
    pub army: i32,
    #[serde(default = "initial_channel", deserialize_with = "lenient_channel")]
    pub treasury: i32,
    #[serde(default = "initial_channel", deserialize_with = "lenient_channel")]
    pub faith: i32,
}

const fn initial_channel() -> i32 {
    INITIAL_CHANNEL_VALUE
}

fn lenient_channel<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = value
        .as_i64()
        .and_then(|raw| i32::try_from(raw).ok())
        .unwrap_or_else(|| {
            log::warn!("resource channel value {value} is not an integer; using initial value");
            INITIAL_CHANNEL_VALUE
        });
    Ok(parsed)
}

impl Default for ResourceVector {
    fn default() -> Self {
        Self::initial()
    }
}

impl ResourceVector {
    #[must_use]
    pub const fn new(people: i32, army: i32, treasury: i32, faith: i32) -> Self {
        Self {
            people,
            army,
            treasury,
            faith,
        }
    }

    #[must_use]
    pub const fn initial() -> Self {
        Self::new(
            INITIAL_CHANNEL_VALUE,
            INITIAL_CHANNEL_VALUE,
            INITIAL_CHANNEL_VALUE,
            INITIAL_CHANNEL_VALUE,
        )
    }

    #[must_use]
    pub const fn get(&self, channel: Channel) -> i32 {
        match channel {
            Channel::People => self.people,
            Channel::Army => self.army,
            Channel::Treasury => self.treasury,
            Channel::Faith => self.faith,
        }
    }

    pub fn set(&mut self, channel: Channel, value: i32) {
        match channel {
            Channel::People => self.people = value,
            Channel::Army => self.army = value,
            Channel::Treasury => self.treasury = value,
            Channel::Faith => self.faith = value,
        }
    }

    #[must_use]
    pub fn clamped(mut self) -> Self {
        for channel in Channel::ALL {
            self.set(channel, self.get(channel).clamp(RESOURCE_MIN, RESOURCE_MAX));
        }
        self
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        Channel::ALL
            .iter()
            .all(|&channel| (RESOURCE_MIN..=RESOURCE_MAX).contains(&self.get(channel)))
    }
}

/// Partial change to a [`ResourceVector`]; omitted channels mean "no change".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub army: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faith: Option<i32>,
}

impl ResourceDelta {
    #[must_use]
    pub const fn get(&self, channel: Channel) -> Option<i32> {
        match channel {
            Channel::People => self.people,
            Channel::Army => self.army,
            Channel::Treasury => self.treasury,
            Channel::Faith => self.faith,
        }
    }

    #[must_use]
    pub fn with(mut self, channel: Channel, amount: i32) -> Self {
        let slot = match channel {
            Channel::People => &mut self.people,
            Channel::Army => &mut self.army,
            Channel::Treasury => &mut self.treasury,
            Channel::Faith => &mut self.faith,
        };
        *slot = Some(amount);
        self
    }

    /// True when no channel is mentioned at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Channel::ALL.iter().all(|&channel| self.get(channel).is_none())
    }

    /// Human-readable summary such as `+1 people, -2 treasury`. Zero and
    /// omitted channels are skipped.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<String> = Channel::ALL
            .iter()
            .filter_map(|&channel| match self.get(channel) {
                Some(amount) if amount != 0 => Some(format!("{amount:+} {channel}")),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            String::from("no change")
        } else {
            parts.join(", ")
        }
    }
}

/// Apply a partial delta and clamp every channel into range.
#[must_use]
pub fn apply_delta(base: &ResourceVector, delta: &ResourceDelta) -> ResourceVector {
    let mut next = *base;
    for channel in Channel::ALL {
        let current = base.get(channel);
        let amount = delta.get(channel).unwrap_or(0);
        next.set(
            channel,
            current
                .saturating_add(amount)
                .clamp(RESOURCE_MIN, RESOURCE_MAX),
        );
    }
    log::debug!("applied delta {delta:?} to {base:?} -> {next:?}");
    next
}

/// Which bound a channel hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Zero,
    Max,
}

/// Why a run ended: a channel reaching one of its bounds. Serialized as
/// `<channel>_zero` / `<channel>_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalReason {
    pub channel: Channel,
    pub bound: Bound,
}

impl TerminalReason {
    #[must_use]
    pub const fn zero(channel: Channel) -> Self {
        Self {
            channel,
            bound: Bound::Zero,
        }
    }

    #[must_use]
    pub const fn max(channel: Channel) -> Self {
        Self {
            channel,
            bound: Bound::Max,
        }
    }

    #[must_use]
    pub fn code(&self) -> String {
        let suffix = match self.bound {
            Bound::Zero => "zero",
            Bound::Max => "max",
        };
        format!("{}_{suffix}", self.channel)
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for TerminalReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, bound) = s.rsplit_once('_').ok_or(())?;
        let channel = channel.parse::<Channel>()?;
        match bound {
            "zero" => Ok(Self::zero(channel)),
            "max" => Ok(Self::max(channel)),
            _ => Err(()),
        }
    }
}

impl Serialize for TerminalReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for TerminalReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|()| serde::de::Error::custom(format!("unknown terminal reason `{raw}`")))
    }
}

/// Result of scanning a vector for a terminal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCheck {
    pub is_over: bool,
    pub reason: Option<TerminalReason>,
}

/// Scan channels in [`Channel::ALL`] order; the first channel at a bound
/// decides the reason.
#[must_use]
pub fn check_terminal(resources: &ResourceVector) -> TerminalCheck {
    for channel in Channel::ALL {
        let value = resources.get(channel);
        let reason = if value <= RESOURCE_MIN {
            TerminalReason::zero(channel)
        } else if value >= RESOURCE_MAX {
            TerminalReason::max(channel)
        } else {
            continue;
        };
        log::info!("terminal configuration reached: {reason}");
        return TerminalCheck {
            is_over: true,
            reason: Some(reason),
        };
    }
    TerminalCheck::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fives() -> ResourceVector {
        ResourceVector::new(5, 5, 5, 5)
    }

    #[test]
    fn apply_delta_clamps_every_channel() {
        let deltas = [-100, -11, -6, -5, -1, 0, 1, 5, 6, 11, 100, i32::MAX, i32::MIN];
        for base in [ResourceVector::new(0, 10, 3, 7), fives()] {
            for &d in &deltas {
                let delta = ResourceDelta::default()
                    .with(Channel::People, d)
                    .with(Channel::Faith, d.saturating_neg());
                let next = apply_delta(&base, &delta);
                assert!(next.is_within_bounds(), "{base:?} + {d} -> {next:?}");
            }
        }
    }

    #[test]
    fn omitted_channels_are_unchanged() {
        let base = ResourceVector::new(2, 3, 4, 6);
        let next = apply_delta(&base, &ResourceDelta::default().with(Channel::Army, 1));
        assert_eq!(next, ResourceVector::new(2, 4, 4, 6));
    }

    #[test]
    fn treasury_drain_reports_treasury_zero() {
        let next = apply_delta(&fives(), &ResourceDelta::default().with(Channel::Treasury, -5));
        assert_eq!(next, ResourceVector::new(5, 5, 0, 5));
        let check = check_terminal(&next);
        assert!(check.is_over);
        assert_eq!(check.reason.map(|r| r.code()), Some("treasury_zero".into()));
    }

    #[test]
    fn people_overflow_clamps_and_reports_people_max() {
        let base = ResourceVector::new(9, 5, 5, 5);
        let next = apply_delta(&base, &ResourceDelta::default().with(Channel::People, 2));
        assert_eq!(next.people, 10);
        assert_eq!(
            check_terminal(&next).reason,
            Some(TerminalReason::max(Channel::People))
        );
    }

    #[test]
    fn first_channel_in_order_wins_ties() {
        let check = check_terminal(&ResourceVector::new(5, 0, 10, 0));
        assert_eq!(check.reason, Some(TerminalReason::zero(Channel::Army)));

        let check = check_terminal(&ResourceVector::new(10, 0, 5, 5));
        assert_eq!(check.reason, Some(TerminalReason::max(Channel::People)));

        for (index, channel) in Channel::ALL.iter().enumerate() {
            let mut v = fives();
            v.set(*channel, 0);
            for later in &Channel::ALL[index + 1..] {
                v.set(*later, 0);
            }
            assert_eq!(check_terminal(&v).reason, Some(TerminalReason::zero(*channel)));
        }
    }

    #[test]
    fn interior_vectors_are_not_terminal() {
        for value in 1..10 {
            let v = ResourceVector::new(value, 10 - value, value, 10 - value);
            assert_eq!(check_terminal(&v), TerminalCheck::default());
        }
    }

    #[test]
    fn malformed_channels_fall_back_to_initial_value() {
        let parsed: ResourceVector =
            serde_json::from_str(r#"{"people": "lots", "army": 2, "faith": null}"#).unwrap();
        assert_eq!(parsed, ResourceVector::new(5, 2, 5, 5));
        let next = apply_delta(&parsed, &ResourceDelta::default().with(Channel::People, 1));
        assert_eq!(next.people, 6);
    }

    #[test]
    fn terminal_reason_codes_round_trip_through_strings() {
        for channel in Channel::ALL {
            for reason in [TerminalReason::zero(channel), TerminalReason::max(channel)] {
                assert_eq!(reason.code().parse::<TerminalReason>(), Ok(reason));
            }
        }
        assert!("gold_zero".parse::<TerminalReason>().is_err());
        assert!("people_low".parse::<TerminalReason>().is_err());
    }

    #[test]
    fn delta_summary_skips_zero_changes() {
        let delta = ResourceDelta::default()
            .with(Channel::People, 1)
            .with(Channel::Army, 0)
            .with(Channel::Treasury, -2);
        assert_eq!(delta.summary(), "+1 people, -2 treasury");
        assert_eq!(ResourceDelta::default().summary(), "no change");
    }
}
