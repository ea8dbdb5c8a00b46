use kingdom_game::Screen;
use yew_router::prelude::*;

#[derive(Clone, Debug, Routable, PartialEq, Eq)]
pub enum Route {
    #[at("/")]
    Start,
    #[at("/main")]
    Main,
    #[at("/feedback")]
    Feedback,
    #[at("/game-over")]
    GameOver,
    #[at("/404")]
    #[not_found]
    NotFound,
}

impl Route {
    #[must_use]
    pub const fn from_screen(screen: Screen) -> Self {
        match screen {
            Screen::Start => Self::Start,
            Screen::Main => Self::Main,
            Screen::Feedback => Self::Feedback,
            Screen::GameOver => Self::GameOver,
        }
    }

    #[must_use]
    pub const fn to_screen(&self) -> Option<Screen> {
        match self {
            Self::Start => Some(Screen::Start),
            Self::Main => Some(Screen::Main),
            Self::Feedback => Some(Screen::Feedback),
            Self::GameOver => Some(Screen::GameOver),
            Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_screen_has_a_route() {
        for screen in Screen::ALL {
            assert_eq!(Route::from_screen(screen).to_screen(), Some(screen));
        }
        assert_eq!(Route::NotFound.to_screen(), None);
    }
}
