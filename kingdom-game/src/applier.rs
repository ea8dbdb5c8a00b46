//! Turns a chosen option into the next round's state. Pure and synchronous:
//! the outcome text is already on the option, so nothing here waits on the
//! network.
use thiserror::Error;

use crate::endgame::GameOverInfo;
use crate::event::OptionId;
use crate::resources::{apply_delta, check_terminal};
use crate::state::{LastChoiceResult, MainState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("there is no current event to choose from")]
    NoCurrentEvent,
    #[error("the game is already over")]
    AlreadyOver,
    #[error("option {0} is not part of the current event")]
    UnknownOption(OptionId),
    #[error("option {0} is missing its resource changes or outcome")]
    IncompleteOption(OptionId),
}

/// Compute the state that follows choosing `option_id`. The input is left
/// untouched; the caller decides when to persist the result.
///
/// # Errors
///
/// Returns [`ApplyError`] if the option cannot be played from `state`.
pub fn apply_choice(state: &MainState, option_id: OptionId) -> Result<MainState, ApplyError> {
    if state.is_over() {
        return Err(ApplyError::AlreadyOver);
    }
    let event = state
        .current_event
        .as_ref()
        .ok_or(ApplyError::NoCurrentEvent)?;
    let option = event
        .option(option_id)
        .ok_or(ApplyError::UnknownOption(option_id))?;
    let (Some(delta), Some(outcome)) = (option.resource_changes, option.resolved_outcome()) else {
        return Err(ApplyError::IncompleteOption(option_id));
    };

    let resources = apply_delta(&state.resources, &delta);
    let decisive_round = state.round_number;
    let terminal = check_terminal(&resources);

    let mut next = state.clone();
    next.resources = resources;
    next.round_number = decisive_round.saturating_add(1);
    next.game_over = GameOverInfo::from_check(terminal, decisive_round);
    next.last_choice_result = Some(LastChoiceResult {
        chosen_option_id: option_id,
        resource_changes: delta,
        outcome_text: outcome.to_string(),
    });
    log::info!(
        "round {decisive_round} resolved with option {option_id}; now round {} (over: {})",
        next.round_number,
        next.game_over.is_over
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Channel, ResourceDelta, ResourceVector, TerminalReason};
    use crate::state::fixtures::opening_state;

    #[test]
    fn choice_advances_round_and_records_result() {
        let state = opening_state();
        let next = apply_choice(&state, OptionId::A).unwrap();
        assert_eq!(next.round_number, 2);
        assert_eq!(next.resources, ResourceVector::new(5, 5, 5, 6));
        assert!(!next.is_over());
        let result = next.last_choice_result.as_ref().unwrap();
        assert_eq!(result.chosen_option_id, OptionId::A);
        assert_eq!(result.resource_changes, ResourceDelta::default().with(Channel::Faith, 1));
        assert_eq!(result.outcome_text, "Outcome of A");
        assert_eq!(next.current_event, state.current_event);
    }

    #[test]
    fn terminal_choice_records_game_over() {
        let state = opening_state();
        let next = apply_choice(&state, OptionId::B).unwrap();
        assert_eq!(next.resources.treasury, 0);
        assert!(next.game_over.is_over);
        assert_eq!(next.game_over.reason, Some(TerminalReason::zero(Channel::Treasury)));
        assert_eq!(next.game_over.final_rounds, Some(1));
        assert!(next.game_over.ending_text.is_some());
        assert!(next.last_choice_result.is_some());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut state = opening_state();
        if let Some(event) = state.current_event.as_mut() {
            event.options.retain(|o| o.id != OptionId::C);
        }
        assert_eq!(
            apply_choice(&state, OptionId::C),
            Err(ApplyError::UnknownOption(OptionId::C))
        );
    }

    #[test]
    fn finished_or_eventless_states_are_rejected() {
        let mut state = opening_state();
        state.current_event = None;
        assert_eq!(apply_choice(&state, OptionId::A), Err(ApplyError::NoCurrentEvent));

        let finished = apply_choice(&opening_state(), OptionId::B).unwrap();
        assert_eq!(apply_choice(&finished, OptionId::A), Err(ApplyError::AlreadyOver));
    }

    #[test]
    fn incomplete_option_is_rejected() {
        let mut state = opening_state();
        if let Some(event) = state.current_event.as_mut() {
            event.options[0].outcome_text = Some(String::from(" "));
        }
        assert_eq!(
            apply_choice(&state, OptionId::A),
            Err(ApplyError::IncompleteOption(OptionId::A))
        );
    }
}
