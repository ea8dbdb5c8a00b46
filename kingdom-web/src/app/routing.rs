#[cfg(target_arch = "wasm32")]
use yew::prelude::*;
#[cfg(target_arch = "wasm32")]
use yew_router::prelude::Navigator;

#[cfg(any(target_arch = "wasm32", test))]
use crate::router::Route;
#[cfg(any(target_arch = "wasm32", test))]
use kingdom_game::Screen;

#[cfg(any(target_arch = "wasm32", test))]
fn next_route_for_screen(screen: Screen, current_route: Option<&Route>) -> Option<Route> {
    let new_route = Route::from_screen(screen);
    if Some(&new_route) == current_route {
        None
    } else {
        Some(new_route)
    }
}

/// Screen to switch to after a history navigation, if the flow allows it.
#[cfg(any(target_arch = "wasm32", test))]
fn next_screen_for_route(current: Screen, route: Option<Route>) -> Option<Screen> {
    let new_screen = route.and_then(|route| route.to_screen())?;
    if new_screen == current {
        return None;
    }
    current.can_transition_to(new_screen).then_some(new_screen)
}

#[cfg(target_arch = "wasm32")]
#[hook]
pub fn use_sync_route_with_screen(
    screen: &UseStateHandle<Screen>,
    navigator: Option<Navigator>,
    active_route: Option<Route>,
) {
    let screen = screen.clone();
    use_effect_with((screen, active_route), move |(screen, current_route)| {
        if let (Some(nav), Some(new_route)) = (
            navigator.as_ref(),
            next_route_for_screen(**screen, current_route.as_ref()),
        ) {
            nav.push(&new_route);
        }
    });
}

#[cfg(target_arch = "wasm32")]
#[hook]
pub fn use_sync_screen_with_route(screen: &UseStateHandle<Screen>, route: Option<Route>) {
    let screen = screen.clone();
    use_effect_with(route, move |route| {
        if let Some(new_screen) = next_screen_for_route(*screen, route.clone()) {
            screen.set(new_screen);
        }
    });
}
