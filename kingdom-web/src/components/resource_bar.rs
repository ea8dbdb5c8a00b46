use kingdom_game::constants::RESOURCE_MAX;
use kingdom_game::{Channel, ResourceVector};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct ResourceBarProps {
    pub resources: ResourceVector,
}

#[function_component(ResourceBar)]
pub fn resource_bar(props: &ResourceBarProps) -> Html {
    html! {
        <ul class="resource-bar flex gap-4" aria-label="Kingdom resources">
            { for Channel::ALL.iter().map(|&channel| {
                let value = props.resources.get(channel);
                html! {
                    <li class="flex flex-col items-center" key={channel.as_str()}>
                        <span class="text-xs uppercase">{ channel.as_str() }</span>
                        <progress
                            class="progress w-20"
                            value={value.to_string()}
                            max={RESOURCE_MAX.to_string()}
                            aria-valuenow={value.to_string()}
                        />
                        <span class="font-bold">{ value.to_string() }</span>
                    </li>
                }
            }) }
        </ul>
    }
}
