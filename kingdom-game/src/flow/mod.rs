//! Screen flow for a Kingdom run: Start, Main, Feedback and GameOver, the
//! transitions between them and the speculative next-turn fetch that runs
//! while the player reads feedback.
mod machine;
mod polling;
mod prefetch;

pub use machine::{
    ChoiceError, ChoiceMade, ContinueError, FeedbackView, GameOverView, MainView, StartError,
    TurnMachine,
};
pub use polling::{CancelToken, PollSettings, Sleeper, wait_for_pending};
pub use prefetch::{FetchGuard, FetchSlot, PrefetchError, PrefetchTask};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Start,
    Main,
    Feedback,
    GameOver,
}

impl Screen {
    pub const ALL: [Self; 4] = [Self::Start, Self::Main, Self::Feedback, Self::GameOver];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Main => "main",
            Self::Feedback => "feedback",
            Self::GameOver => "game-over",
        }
    }

    /// Allowed edges. Every screen may fall back to Start.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Start)
                | (Self::Start, Self::Main)
                | (Self::Main, Self::Feedback | Self::GameOver)
                | (Self::Feedback, Self::Main | Self::GameOver)
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of entering a screen: either its view data, or the screen the
/// player must be sent to instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
    Ready(T),
    Redirect(Screen),
}

impl<T> Entry<T> {
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(view) => Some(view),
            Self::Redirect(_) => None,
        }
    }

    #[must_use]
    pub const fn redirect(&self) -> Option<Screen> {
        match self {
            Self::Ready(_) => None,
            Self::Redirect(screen) => Some(*screen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_round_cycle() {
        assert!(Screen::Start.can_transition_to(Screen::Main));
        assert!(Screen::Main.can_transition_to(Screen::Feedback));
        assert!(Screen::Feedback.can_transition_to(Screen::Main));
        assert!(Screen::Feedback.can_transition_to(Screen::GameOver));
        assert!(Screen::GameOver.can_transition_to(Screen::Start));

        assert!(!Screen::Start.can_transition_to(Screen::Feedback));
        assert!(!Screen::Start.can_transition_to(Screen::GameOver));
        assert!(!Screen::GameOver.can_transition_to(Screen::Main));
        assert!(!Screen::GameOver.can_transition_to(Screen::Feedback));
        assert!(!Screen::Main.can_transition_to(Screen::Main));
    }

    #[test]
    fn every_screen_can_fall_back_to_start() {
        for screen in Screen::ALL {
            assert!(screen.can_transition_to(Screen::Start), "{screen}");
        }
    }
}
