#[cfg(target_arch = "wasm32")]
use crate::router::Route;
#[cfg(target_arch = "wasm32")]
use kingdom_game::Screen;
#[cfg(target_arch = "wasm32")]
use yew::prelude::*;
#[cfg(target_arch = "wasm32")]
use yew_router::prelude::*;

pub mod routing;
pub mod state;
pub mod view;

pub use state::{AppState, GameHandle};

#[cfg(target_arch = "wasm32")]
#[function_component(App)]
pub fn app() -> Html {
    html! {
        <BrowserRouter>
            <AppInner />
        </BrowserRouter>
    }
}

#[cfg(target_arch = "wasm32")]
#[function_component(AppInner)]
pub fn app_inner() -> Html {
    let route = use_route::<Route>();
    // A reload lands on the screen named by the URL; each page re-validates
    // the stored session on entry.
    let initial = route
        .as_ref()
        .and_then(Route::to_screen)
        .unwrap_or(Screen::Start);
    let app_state = state::use_app_state(initial);
    let navigator = use_navigator();

    routing::use_sync_route_with_screen(&app_state.screen, navigator, route.clone());
    routing::use_sync_screen_with_route(&app_state.screen, route);

    view::render_app(&app_state)
}
