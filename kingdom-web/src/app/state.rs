use kingdom_game::{BusyIndicator, Gateway, Screen, TurnMachine};
use std::ops::Deref;
use std::rc::Rc;
use yew::prelude::*;

use crate::storage::BrowserSessionStorage;
use crate::transport::FetchTransport;

pub type Machine = TurnMachine<BrowserSessionStorage, FetchTransport>;

/// Shared handle to the session's turn machine. Equal only to itself.
#[derive(Clone)]
pub struct GameHandle(Rc<Machine>);

impl GameHandle {
    #[must_use]
    pub fn new(machine: Machine) -> Self {
        Self(Rc::new(machine))
    }
}

impl Deref for GameHandle {
    type Target = Machine;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for GameHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Drives the loading overlay from foreground content requests.
struct OverlayBusy(UseStateSetter<bool>);

impl BusyIndicator for OverlayBusy {
    fn set_busy(&self, busy: bool) {
        self.0.set(busy);
    }
}

#[derive(Clone, PartialEq)]
pub struct AppState {
    pub screen: UseStateHandle<Screen>,
    pub busy: UseStateHandle<bool>,
    pub game: GameHandle,
}

#[hook]
pub fn use_app_state(initial: Screen) -> AppState {
    let screen = use_state(|| initial);
    let busy = use_state(|| false);
    let game = {
        let setter = busy.setter();
        use_memo((), move |()| {
            let config = crate::config::load();
            let gateway = Gateway::new(FetchTransport::new(config.endpoint.clone()))
                .with_busy_indicator(Rc::new(OverlayBusy(setter)));
            GameHandle::new(TurnMachine::new(BrowserSessionStorage, gateway, config))
        })
    };
    AppState {
        screen,
        busy,
        game: (*game).clone(),
    }
}
