use clap::ValueEnum;
use kingdom_game::constants::{RESOURCE_MAX, RESOURCE_MIN};
use kingdom_game::{Channel, GameEvent, OptionId, ResourceVector, apply_delta};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// How the automated player picks among an event's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Uniformly random option
    Random,
    /// Option that keeps every channel farthest from its bounds
    Cautious,
    /// Option that pushes some channel closest to a bound
    Reckless,
}

impl Strategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Cautious => "cautious",
            Self::Reckless => "reckless",
        }
    }

    /// `None` only when the event has no options at all.
    pub fn pick<R: Rng>(
        self,
        event: &GameEvent,
        resources: &ResourceVector,
        rng: &mut R,
    ) -> Option<OptionId> {
        match self {
            Self::Random => event.options.choose(rng).map(|option| option.id),
            Self::Cautious => event
                .options
                .iter()
                .max_by_key(|option| {
                    (headroom_after(resources, option), std::cmp::Reverse(option.id))
                })
                .map(|option| option.id),
            Self::Reckless => event
                .options
                .iter()
                .min_by_key(|option| (headroom_after(resources, option), option.id))
                .map(|option| option.id),
        }
    }
}

/// Smallest distance from any channel to either bound once the option is
/// applied.
fn headroom_after(resources: &ResourceVector, option: &kingdom_game::EventOption) -> i32 {
    let after = option
        .resource_changes
        .map_or(*resources, |delta| apply_delta(resources, &delta));
    Channel::ALL
        .iter()
        .map(|&channel| {
            let value = after.get(channel);
            (value - RESOURCE_MIN).min(RESOURCE_MAX - value)
        })
        .min()
        .unwrap_or(0)
}
