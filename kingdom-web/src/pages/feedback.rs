use kingdom_game::{
    CancelToken, ChoiceError, ContinueError, Entry, FeedbackView, Screen, Sleeper,
};
use std::rc::Rc;
use yew::prelude::*;

use super::{PageProps, use_entry_redirect};
use crate::app::GameHandle;
use crate::components::ResourceBar;
use crate::transport::TimeoutSleeper;

/// Everything the continue/retry handlers need, cloned into the async task.
#[derive(Clone)]
struct Continuation {
    game: GameHandle,
    cancel: Rc<CancelToken>,
    waiting: UseStateHandle<bool>,
    error: UseStateHandle<Option<String>>,
    can_retry: UseStateHandle<bool>,
    on_navigate: Callback<Screen>,
}

impl Continuation {
    fn start(self) {
        self.waiting.set(true);
        self.error.set(None);
        self.can_retry.set(false);
        wasm_bindgen_futures::spawn_local(async move {
            match self
                .game
                .continue_from_feedback(&TimeoutSleeper, &self.cancel)
                .await
            {
                Ok(screen) => self.on_navigate.emit(screen),
                Err(ContinueError::Cancelled) => {}
                Err(err) => {
                    log::warn!("continue failed: {err}");
                    self.can_retry.set(matches!(
                        err,
                        ContinueError::FetchFailed | ContinueError::TimedOut { .. }
                    ));
                    self.error.set(Some(format!("The chronicle stalls: {err}")));
                    self.waiting.set(false);
                }
            }
        });
    }

    fn watch_fetch(self) {
        wasm_bindgen_futures::spawn_local(async move {
            let interval = self.game.config().poll_interval();
            while self.game.fetch_in_flight() && !self.cancel.is_cancelled() {
                TimeoutSleeper.sleep(interval).await;
            }
            if !self.cancel.is_cancelled() {
                self.waiting.set(false);
            }
        });
    }

    fn retry(self) {
        match self.game.restart_prefetch() {
            Ok(Some(task)) => wasm_bindgen_futures::spawn_local(async move {
                let _ = task.run().await;
            }),
            // Either the turn is already here or the earlier request is still running.
            Ok(None) | Err(ChoiceError::FetchInFlight) => {}
            Err(ChoiceError::NoGame) => {
                self.on_navigate.emit(Screen::Start);
                return;
            }
            Err(err) => {
                self.error.set(Some(format!("The chronicle stalls: {err}")));
                return;
            }
        }
        self.start();
    }
}

/// The page opens in its waiting state when the next turn has not been
/// stored yet but its fetch is still running.
fn waits_on_fetch(view: &FeedbackView, fetch_in_flight: bool) -> bool {
    !view.is_over && !view.pending_ready && fetch_in_flight
}

#[function_component(FeedbackPage)]
pub fn feedback_page(props: &PageProps) -> Html {
    let entry = {
        let game = props.game.clone();
        use_memo((), move |()| game.enter_feedback())
    };
    let waiting = {
        let in_flight = props.game.fetch_in_flight();
        let entry = entry.clone();
        use_state(move || match &*entry {
            Entry::Ready(view) => waits_on_fetch(view, in_flight),
            Entry::Redirect(_) => false,
        })
    };
    let error = use_state(|| None::<String>);
    let can_retry = use_state(|| false);
    let cancel = use_memo((), |()| CancelToken::new());
    use_entry_redirect(&entry, &props.on_navigate);

    {
        let cancel = cancel.clone();
        use_effect_with((), move |()| move || cancel.cancel());
    }

    let continuation = Continuation {
        game: props.game.clone(),
        cancel,
        waiting: waiting.clone(),
        error: error.clone(),
        can_retry: can_retry.clone(),
        on_navigate: props.on_navigate.clone(),
    };
    let on_continue = {
        let continuation = continuation.clone();
        Callback::from(move |_: MouseEvent| continuation.clone().start())
    };
    let on_retry = {
        let continuation = continuation.clone();
        Callback::from(move |_: MouseEvent| continuation.clone().retry())
    };

    // Opened while the next turn is still on its way: hold Continue until
    // the fetch settles.
    {
        let waiting = *waiting;
        use_effect_with((), move |()| {
            if waiting {
                continuation.watch_fetch();
            }
        });
    }

    let Entry::Ready(view) = &*entry else {
        return html! { <div class="loading loading-dots" aria-busy="true" /> };
    };
    let continue_label = if view.is_over {
        "See how your reign ends"
    } else if *waiting {
        "Waiting for the next chapter..."
    } else {
        "Continue"
    };

    html! {
        <section class="feedback card max-w-2xl space-y-4">
            <h2 class="text-2xl">{ format!("You chose {}", view.chosen_option_id) }</h2>
            <p class="outcome">{ view.outcome_text.clone() }</p>
            <p class="delta font-mono">{ view.summary.clone() }</p>
            <ResourceBar resources={view.resources} />
            <button
                class="btn btn-primary"
                onclick={on_continue}
                disabled={*waiting}
                aria-busy={(*waiting).to_string()}
            >
                { continue_label }
            </button>
            if let Some(message) = (*error).clone() {
                <div class="alert alert-warning" role="alert">
                    <span>{ message }</span>
                    if *can_retry {
                        <button class="btn btn-sm" onclick={on_retry}>{ "Try again" }</button>
                    }
                </div>
            }
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdom_game::{OptionId, ResourceDelta, ResourceVector};

    fn view(is_over: bool, pending_ready: bool) -> FeedbackView {
        FeedbackView {
            chosen_option_id: OptionId::A,
            outcome_text: "The harvest holds.".to_string(),
            resource_changes: ResourceDelta::default(),
            summary: String::new(),
            resources: ResourceVector::initial(),
            round_number: 2,
            is_over,
            pending_ready,
        }
    }

    #[test]
    fn opens_waiting_only_while_the_next_turn_is_fetched() {
        assert!(waits_on_fetch(&view(false, false), true));
        assert!(!waits_on_fetch(&view(false, true), true));
        assert!(!waits_on_fetch(&view(false, false), false));
        assert!(!waits_on_fetch(&view(true, false), true));
    }
}
