use std::rc::Rc;

use kingdom_game::{
    Channel, EventOption, GameEvent, HistoryTurn, MainState, MemoryStorage, OptionId,
    ResourceDelta, ResourceVector, SessionStore, apply_choice,
};

fn event(description: &str) -> GameEvent {
    let option = |id: OptionId, channel: Channel, amount: i32| EventOption {
        id,
        text: format!("Option {id}"),
        resource_changes: Some(ResourceDelta::default().with(channel, amount)),
        outcome_text: Some(format!("You chose {id}.")),
    };
    GameEvent {
        description: description.to_string(),
        stage: Some(1),
        options: vec![
            option(OptionId::A, Channel::People, 1),
            option(OptionId::B, Channel::Army, -1),
            option(OptionId::C, Channel::Treasury, 1),
        ],
        event_type: Some(String::from("harvest")),
    }
}

fn opening() -> MainState {
    MainState::opening(
        String::from("An island realm of lighthouses."),
        event("Fog rolls in from the sea."),
        Some(String::from("The harbor bells ring.")),
        ResourceVector::initial(),
    )
}

#[test]
fn saved_states_load_back_unchanged() {
    let store = SessionStore::new(MemoryStorage::new(), "contract", 50);
    let mut state = opening();
    for option in [OptionId::A, OptionId::B, OptionId::C, OptionId::A] {
        store.save_main(&state).unwrap();
        assert_eq!(store.load_main().as_ref(), Some(&state));

        state = apply_choice(&state, option).unwrap();
        state.current_event = Some(event("Another day dawns."));
    }
    store.save_main(&state).unwrap();
    assert_eq!(store.load_main(), Some(state));
}

#[test]
fn finished_state_round_trips_with_its_ending() {
    let store = SessionStore::new(MemoryStorage::new(), "contract", 50);
    let mut state = opening();
    state.resources.army = 1;
    let over = apply_choice(&state, OptionId::B).unwrap();
    assert!(over.game_over.is_over);
    store.save_main(&over).unwrap();
    let loaded = store.load_main().unwrap();
    assert_eq!(loaded, over);
    assert_eq!(loaded.game_over.final_rounds, Some(1));
}

#[test]
fn a_reloaded_page_sees_the_same_session() {
    let storage = Rc::new(MemoryStorage::new());
    let first = SessionStore::new(Rc::clone(&storage), "v6_preload", 50);
    first.save_main(&opening()).unwrap();
    first.save_pending_next_turn(&event("Next")).unwrap();

    let reloaded = SessionStore::new(Rc::clone(&storage), "v6_preload", 50);
    assert_eq!(reloaded.load_main(), Some(opening()));
    assert_eq!(reloaded.load_pending_next_turn(), Some(event("Next")));
}

#[test]
fn versions_do_not_see_each_other() {
    let storage = MemoryStorage::new();
    let old = SessionStore::new(storage.clone(), "v5", 50);
    let current = SessionStore::new(storage.clone(), "v6_preload", 50);
    old.save_main(&opening()).unwrap();
    assert!(current.load_main().is_none());
    current.clear_all();
    assert!(old.load_main().is_some());
    assert_eq!(storage.len(), 1);
}

#[test]
fn history_keeps_the_most_recent_turns_in_order() {
    let store = SessionStore::new(MemoryStorage::new(), "contract", 3);
    store.save_history(&[]).unwrap();
    for round in 1..=4 {
        store
            .append_history([
                HistoryTurn::user(format!("choice {round}")),
                HistoryTurn::model(format!("reply {round}")),
            ])
            .unwrap();
    }
    let texts: Vec<String> = store.load_history().into_iter().map(|t| t.text).collect();
    assert_eq!(texts, ["reply 3", "choice 4", "reply 4"]);
}

#[test]
fn clearing_an_absent_pending_turn_is_a_no_op() {
    let store = SessionStore::new(MemoryStorage::new(), "contract", 50);
    store.clear_pending_next_turn();
    store.clear_pending_next_turn();
    assert!(store.load_pending_next_turn().is_none());
    assert!(store.storage().is_empty());
}
