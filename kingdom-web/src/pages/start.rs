use yew::prelude::*;

use super::PageProps;

#[function_component(StartPage)]
pub fn start_page(props: &PageProps) -> Html {
    let starting = use_state(|| false);
    let error = use_state(|| None::<String>);

    {
        let game = props.game.clone();
        use_effect_with((), move |()| game.enter_start());
    }

    let on_begin = {
        let game = props.game.clone();
        let on_navigate = props.on_navigate.clone();
        let starting = starting.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            if *starting {
                return;
            }
            starting.set(true);
            error.set(None);
            let game = game.clone();
            let on_navigate = on_navigate.clone();
            let starting = starting.clone();
            let error = error.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match game.begin().await {
                    Ok(screen) => on_navigate.emit(screen),
                    Err(err) => {
                        error.set(Some(format!("Could not begin your reign: {err}")));
                        starting.set(false);
                    }
                }
            });
        })
    };

    html! {
        <section class="start card max-w-xl text-center space-y-6">
            <h1 class="text-4xl">{ "Kingdom" }</h1>
            <p>{ "Every choice weighs on your people, your army, your treasury and your faith. Let any of them fall to nothing or swell beyond control and your reign is over." }</p>
            <button
                class="btn btn-primary"
                onclick={on_begin}
                disabled={*starting}
                aria-busy={(*starting).to_string()}
            >
                { if *starting { "Summoning the court..." } else { "Begin your reign" } }
            </button>
            if let Some(message) = (*error).clone() {
                <div class="alert alert-error" role="alert">{ message }</div>
            }
        </section>
    }
}
