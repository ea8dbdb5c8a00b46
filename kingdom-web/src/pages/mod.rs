pub mod feedback;
pub mod game_over;
pub mod main_game;
pub mod start;

pub use feedback::FeedbackPage;
pub use game_over::GameOverPage;
pub use main_game::MainPage;
pub use start::StartPage;

use kingdom_game::{Entry, Screen};
use yew::prelude::*;

use crate::app::GameHandle;

/// Props shared by every screen.
#[derive(Properties, Clone, PartialEq)]
pub struct PageProps {
    pub game: GameHandle,
    pub on_navigate: Callback<Screen>,
}

/// Forward a redirect produced on entry once the page has mounted.
#[hook]
pub(crate) fn use_entry_redirect<T: 'static>(entry: &Entry<T>, on_navigate: &Callback<Screen>) {
    let redirect = entry.redirect();
    let on_navigate = on_navigate.clone();
    use_effect_with(redirect, move |redirect| {
        if let Some(screen) = *redirect {
            on_navigate.emit(screen);
        }
    });
}
