use kingdom_game::Entry;
use yew::prelude::*;

use super::{PageProps, use_entry_redirect};
use crate::components::ResourceBar;

#[function_component(GameOverPage)]
pub fn game_over_page(props: &PageProps) -> Html {
    let entry = {
        let game = props.game.clone();
        use_memo((), move |()| game.enter_game_over())
    };
    use_entry_redirect(&entry, &props.on_navigate);

    let on_play_again = {
        let game = props.game.clone();
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(game.play_again()))
    };

    let Entry::Ready(view) = &*entry else {
        return html! { <div class="loading loading-dots" aria-busy="true" /> };
    };
    let rounds = if view.final_rounds == 1 {
        String::from("Your reign lasted 1 round.")
    } else {
        format!("Your reign lasted {} rounds.", view.final_rounds)
    };

    html! {
        <section class="game-over card max-w-xl text-center space-y-4">
            <h2 class="text-3xl">{ "The End" }</h2>
            <p class="ending">{ view.ending_text.clone() }</p>
            <p class="rounds">{ rounds }</p>
            <ResourceBar resources={view.resources} />
            <button class="btn btn-primary" onclick={on_play_again}>{ "Play again" }</button>
        </section>
    }
}
