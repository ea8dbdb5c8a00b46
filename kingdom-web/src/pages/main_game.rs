use kingdom_game::{ChoiceError, Entry, OptionId, Screen};
use yew::prelude::*;

use super::{PageProps, use_entry_redirect};
use crate::components::ResourceBar;

#[function_component(MainPage)]
pub fn main_page(props: &PageProps) -> Html {
    let entry = {
        let game = props.game.clone();
        use_memo((), move |()| game.enter_main())
    };
    let choosing = use_state(|| false);
    let error = use_state(|| None::<String>);
    use_entry_redirect(&entry, &props.on_navigate);

    let on_choose = {
        let game = props.game.clone();
        let on_navigate = props.on_navigate.clone();
        let choosing = choosing.clone();
        let error = error.clone();
        Callback::from(move |option_id: OptionId| {
            if *choosing {
                return;
            }
            // Options stay disabled from here until the next Main screen.
            choosing.set(true);
            match game.choose_option(option_id) {
                Ok(made) => {
                    if let Some(task) = made.prefetch {
                        wasm_bindgen_futures::spawn_local(async move {
                            let _ = task.run().await;
                        });
                    }
                    on_navigate.emit(made.screen);
                }
                Err(ChoiceError::NoGame) => on_navigate.emit(Screen::Start),
                Err(ChoiceError::RoundPending(_)) => on_navigate.emit(Screen::Feedback),
                Err(err) => {
                    log::error!("option {option_id} failed: {err}");
                    error.set(Some(format!("That choice could not be made: {err}")));
                    choosing.set(false);
                }
            }
        })
    };

    let Entry::Ready(view) = &*entry else {
        return html! { <div class="loading loading-dots" aria-busy="true" /> };
    };
    let locked = *choosing || props.game.fetch_in_flight();

    html! {
        <section class="main-game card max-w-2xl space-y-4">
            <header class="flex justify-between items-center">
                <h2 class="text-2xl">{ format!("Round {}", view.round_number) }</h2>
                <ResourceBar resources={view.resources} />
            </header>
            <details class="background">
                <summary>{ "Your kingdom" }</summary>
                <p>{ view.kingdom_background.clone() }</p>
            </details>
            <p class="status italic">{ view.status_message.clone() }</p>
            <article class="event">
                <p>{ view.event.description.clone() }</p>
            </article>
            <div class="options flex flex-col gap-2" role="group" aria-label="Choices">
                { for view.event.options.iter().map(|option| {
                    let id = option.id;
                    let on_choose = on_choose.clone();
                    html! {
                        <button
                            class="btn btn-outline justify-start"
                            key={id.as_str()}
                            disabled={locked}
                            onclick={Callback::from(move |_: MouseEvent| on_choose.emit(id))}
                        >
                            <span class="font-bold mr-2">{ id.as_str() }</span>
                            { option.text.clone() }
                        </button>
                    }
                }) }
            </div>
            if let Some(message) = (*error).clone() {
                <div class="alert alert-error" role="alert">{ message }</div>
            }
        </section>
    }
}
