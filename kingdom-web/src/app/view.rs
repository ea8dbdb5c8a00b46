use kingdom_game::Screen;
use yew::prelude::*;

use crate::app::state::AppState;
use crate::pages::{FeedbackPage, GameOverPage, MainPage, StartPage};

fn navigate_callback(state: &AppState) -> Callback<Screen> {
    let screen = state.screen.clone();
    Callback::from(move |next: Screen| {
        if screen.can_transition_to(next) {
            log::debug!("screen {} -> {next}", *screen);
            screen.set(next);
        } else {
            log::warn!("ignoring navigation {} -> {next}", *screen);
        }
    })
}

pub fn render_app(state: &AppState) -> Html {
    let game = state.game.clone();
    let on_navigate = navigate_callback(state);

    let page = match *state.screen {
        Screen::Start => html! { <StartPage {game} {on_navigate} /> },
        Screen::Main => html! { <MainPage {game} {on_navigate} /> },
        Screen::Feedback => html! { <FeedbackPage {game} {on_navigate} /> },
        Screen::GameOver => html! { <GameOverPage {game} {on_navigate} /> },
    };

    html! {
        <div class="kingdom min-h-screen flex flex-col items-center p-4">
            { page }
            if *state.busy {
                <div class="loading-overlay fixed inset-0 flex items-center justify-center" aria-busy="true" aria-live="polite">
                    <span class="loading loading-spinner" />
                    <p>{ "The royal scribes are writing..." }</p>
                </div>
            }
        </div>
    }
}
