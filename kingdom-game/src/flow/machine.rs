use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

use super::polling::{CancelToken, PollSettings, Sleeper, wait_for_pending};
use super::prefetch::{FetchGuard, FetchSlot, PrefetchTask};
use super::{Entry, Screen};
use crate::applier::{ApplyError, apply_choice};
use crate::config::GameConfig;
use crate::constants::DEFAULT_CHOICE_PROMPT;
use crate::event::{GameEvent, OptionId};
use crate::gateway::{
    CallMode, ChoiceContext, ContentRequest, ContentTransport, Gateway, GatewayError,
    PlayerAction, wire_history,
};
use crate::history::most_recent;
use crate::resources::{ResourceDelta, ResourceVector, TerminalReason};
use crate::state::MainState;
use crate::store::{SessionStorage, SessionStore, StoreError};

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("the content service returned no kingdom background")]
    MissingBackground,
    #[error("the content service returned no opening event")]
    MissingEvent,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ChoiceError {
    #[error("the next turn is still being prepared")]
    FetchInFlight,
    #[error("no game in progress")]
    NoGame,
    #[error("round {0} is already resolved; continue from its outcome first")]
    RoundPending(u32),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error("could not encode the player's action: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ContinueError {
    #[error("stopped waiting for the next turn")]
    Cancelled,
    #[error("the next turn could not be prepared")]
    FetchFailed,
    #[error("the next turn did not arrive within {waited:?}")]
    TimedOut { waited: Duration },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainView {
    pub round_number: u32,
    pub resources: ResourceVector,
    pub event: GameEvent,
    pub status_message: String,
    pub kingdom_background: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    pub chosen_option_id: OptionId,
    pub outcome_text: String,
    pub resource_changes: ResourceDelta,
    pub summary: String,
    pub resources: ResourceVector,
    pub round_number: u32,
    pub is_over: bool,
    pub pending_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverView {
    pub ending_text: String,
    pub final_rounds: u32,
    pub reason: Option<TerminalReason>,
    pub resources: ResourceVector,
}

/// What an option selection produced. `prefetch` must be spawned by the
/// caller; it is `None` when the round ended the game.
pub struct ChoiceMade<S: SessionStorage, T: ContentTransport> {
    pub screen: Screen,
    pub state: MainState,
    pub prefetch: Option<PrefetchTask<S, T>>,
}

/// Drives one browser session through Start, Main, Feedback and GameOver.
///
/// Every entry re-reads the store, so the machine itself holds no game state
/// beyond the background fetch slot.
pub struct TurnMachine<S: SessionStorage, T: ContentTransport> {
    store: Rc<SessionStore<S>>,
    gateway: Rc<Gateway<T>>,
    fetch: FetchSlot,
    config: GameConfig,
}

impl<S: SessionStorage, T: ContentTransport> TurnMachine<S, T> {
    pub fn new(storage: S, gateway: Gateway<T>, config: GameConfig) -> Self {
        let store = SessionStore::new(storage, &config.storage_version, config.history_limit);
        Self {
            store: Rc::new(store),
            gateway: Rc::new(gateway),
            fetch: FetchSlot::new(),
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch.is_active()
    }

    #[must_use]
    pub const fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.config.poll_interval(),
            timeout: self.config.poll_timeout(),
        }
    }

    fn reset(&self) -> Screen {
        self.store.clear_all();
        Screen::Start
    }

    pub fn enter_start(&self) {
        self.store.clear_all();
    }

    /// Ask the content service for a setting and an opening event, then
    /// persist round 1.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`]; the player stays on Start and may retry.
    pub async fn begin(&self) -> Result<Screen, StartError> {
        self.store.clear_all();
        match self.open_kingdom().await {
            Ok(()) => Ok(Screen::Main),
            Err(err) => {
                log::error!("could not start a new reign: {err}");
                Err(err)
            }
        }
    }

    async fn open_kingdom(&self) -> Result<(), StartError> {
        let setting = self
            .gateway
            .request(&ContentRequest::GenerateBackground, CallMode::Foreground)
            .await?;
        let kingdom_background = setting
            .kingdom_background()
            .ok_or(StartError::MissingBackground)?
            .to_string();

        let opening = self
            .gateway
            .request(
                &ContentRequest::GenerateFirstEvent {
                    kingdom_background: kingdom_background.clone(),
                    limited_history: Vec::new(),
                },
                CallMode::Foreground,
            )
            .await?;
        let event = opening.event().cloned().ok_or(StartError::MissingEvent)?;

        let state = MainState::opening(
            kingdom_background,
            event,
            opening.status_message().map(str::to_string),
            self.config.initial_resources,
        );
        self.store.save_main(&state)?;
        self.store.save_history(&[])?;
        log::info!("new reign started");
        Ok(())
    }

    #[must_use]
    pub fn enter_main(&self) -> Entry<MainView> {
        let Some(state) = self.store.load_main() else {
            return Entry::Redirect(self.reset());
        };
        if state.is_over() {
            return Entry::Redirect(Screen::GameOver);
        }
        // The resolved round still has to be continued from Feedback.
        if state.last_choice_result.is_some() {
            return Entry::Redirect(Screen::Feedback);
        }
        let MainState {
            round_number,
            resources,
            current_event,
            status_message,
            kingdom_background,
            ..
        } = state;
        let Some(event) = current_event else {
            return Entry::Redirect(self.reset());
        };
        let status_message = if status_message.trim().is_empty() {
            DEFAULT_CHOICE_PROMPT.to_string()
        } else {
            status_message
        };
        Entry::Ready(MainView {
            round_number,
            resources,
            event,
            status_message,
            kingdom_background,
        })
    }

    /// Resolve the chosen option locally, persist the result and hand back
    /// the background fetch for the following turn.
    ///
    /// # Errors
    ///
    /// Returns [`ChoiceError`]; the stored state is untouched on failure so
    /// the option can be chosen again.
    pub fn choose_option(&self, option_id: OptionId) -> Result<ChoiceMade<S, T>, ChoiceError> {
        let guard = self.fetch.try_claim().ok_or(ChoiceError::FetchInFlight)?;
        let state = self.store.load_main().ok_or(ChoiceError::NoGame)?;
        if state.last_choice_result.is_some() {
            return Err(ChoiceError::RoundPending(state.round_number));
        }
        let next = apply_choice(&state, option_id)?;
        self.store.save_main(&next)?;
        self.store.clear_pending_next_turn();

        let prefetch = if next.is_over() {
            log::info!("reign ended in round {}", state.round_number);
            None
        } else {
            Some(self.prefetch_task(&next, option_id, guard)?)
        };
        Ok(ChoiceMade {
            screen: Screen::Feedback,
            state: next,
            prefetch,
        })
    }

    /// Start another background fetch for the round already resolved, after
    /// the previous one failed. `None` when the next turn is already stored.
    ///
    /// # Errors
    ///
    /// Returns [`ChoiceError`] if no resolved round is waiting for its next
    /// turn.
    pub fn restart_prefetch(&self) -> Result<Option<PrefetchTask<S, T>>, ChoiceError> {
        let guard = self.fetch.try_claim().ok_or(ChoiceError::FetchInFlight)?;
        if self.store.load_pending_next_turn().is_some() {
            return Ok(None);
        }
        let state = self.store.load_main().ok_or(ChoiceError::NoGame)?;
        if state.is_over() {
            return Err(ApplyError::AlreadyOver.into());
        }
        let option_id = state
            .last_choice_result
            .as_ref()
            .map(|last| last.chosen_option_id)
            .ok_or(ChoiceError::NoGame)?;
        log::debug!("retrying next-turn fetch for round {}", state.round_number);
        self.prefetch_task(&state, option_id, guard).map(Some)
    }

    fn prefetch_task(
        &self,
        state: &MainState,
        option_id: OptionId,
        guard: FetchGuard,
    ) -> Result<PrefetchTask<S, T>, ChoiceError> {
        let player_action = PlayerAction {
            chosen_option_id: option_id,
        };
        let action_text = serde_json::to_string(&player_action)?;
        let history = self.store.load_history();
        let request = ContentRequest::ProcessChoiceAndPrepareNext {
            player_action,
            current_state: ChoiceContext {
                round_number: state.round_number,
                resources: state.resources,
                kingdom_background: state.kingdom_background.clone(),
            },
            limited_history: wire_history(most_recent(&history, self.config.history_limit)),
        };
        Ok(PrefetchTask::new(
            Rc::clone(&self.store),
            Rc::clone(&self.gateway),
            request,
            action_text,
            guard,
        ))
    }

    #[must_use]
    pub fn enter_feedback(&self) -> Entry<FeedbackView> {
        let Some(state) = self.store.load_main() else {
            return Entry::Redirect(self.reset());
        };
        let Some(last) = state.last_choice_result.filter(|last| last.is_complete()) else {
            log::warn!("feedback entered without a resolved choice");
            return Entry::Redirect(self.reset());
        };
        Entry::Ready(FeedbackView {
            chosen_option_id: last.chosen_option_id,
            summary: last.resource_changes.summary(),
            outcome_text: last.outcome_text,
            resource_changes: last.resource_changes,
            resources: state.resources,
            round_number: state.round_number,
            is_over: state.game_over.is_over,
            pending_ready: self.store.load_pending_next_turn().is_some(),
        })
    }

    /// Leave Feedback: straight to GameOver when the reign ended, otherwise
    /// wait for the prepared turn and install it.
    ///
    /// # Errors
    ///
    /// Returns [`ContinueError`] without navigating; the player may retry.
    pub async fn continue_from_feedback(
        &self,
        sleeper: &dyn Sleeper,
        cancel: &CancelToken,
    ) -> Result<Screen, ContinueError> {
        let Some(state) = self.store.load_main() else {
            return Ok(self.reset());
        };
        if state.is_over() {
            return Ok(Screen::GameOver);
        }
        let event = wait_for_pending(
            &self.store,
            &self.fetch,
            sleeper,
            cancel,
            self.poll_settings(),
        )
        .await?;

        let Some(mut state) = self.store.load_main() else {
            return Ok(self.reset());
        };
        state.current_event = Some(event);
        state.last_choice_result = None;
        self.store.save_main(&state)?;
        self.store.clear_pending_next_turn();
        log::debug!("round {} ready", state.round_number);
        Ok(Screen::Main)
    }

    #[must_use]
    pub fn enter_game_over(&self) -> Entry<GameOverView> {
        let Some(state) = self.store.load_main().filter(MainState::is_over) else {
            return Entry::Redirect(self.reset());
        };
        let final_rounds = state
            .game_over
            .final_rounds
            .unwrap_or_else(|| state.round_number.saturating_sub(1).max(1));
        Entry::Ready(GameOverView {
            ending_text: state.game_over.display_text(),
            final_rounds,
            reason: state.game_over.reason,
            resources: state.resources,
        })
    }

    pub fn play_again(&self) -> Screen {
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{TransportError, TransportResponse};
    use crate::state::fixtures::opening_state;
    use crate::store::MemoryStorage;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait(?Send)]
    impl ContentTransport for Offline {
        async fn post_json(&self, _body: String) -> Result<TransportResponse, TransportError> {
            Err(TransportError(String::from("offline")))
        }
    }

    fn machine_with(state: Option<&MainState>) -> TurnMachine<MemoryStorage, Offline> {
        let machine = TurnMachine::new(
            MemoryStorage::new(),
            Gateway::new(Offline),
            GameConfig::default(),
        );
        if let Some(state) = state {
            machine.store().save_main(state).unwrap();
        }
        machine
    }

    #[test]
    fn missing_state_sends_every_screen_to_start() {
        let machine = machine_with(None);
        assert_eq!(machine.enter_main().redirect(), Some(Screen::Start));
        assert_eq!(machine.enter_feedback().redirect(), Some(Screen::Start));
        assert_eq!(machine.enter_game_over().redirect(), Some(Screen::Start));
    }

    #[test]
    fn main_shows_prompt_when_status_is_blank() {
        let mut state = opening_state();
        state.status_message.clear();
        let machine = machine_with(Some(&state));
        let view = machine.enter_main().ready().unwrap();
        assert_eq!(view.status_message, DEFAULT_CHOICE_PROMPT);
        assert_eq!(view.round_number, 1);
    }

    #[test]
    fn choice_leads_to_feedback_and_holds_the_fetch_slot() {
        let machine = machine_with(Some(&opening_state()));
        let made = machine.choose_option(OptionId::A).unwrap();
        assert_eq!(made.screen, Screen::Feedback);
        assert_eq!(made.state.round_number, 2);
        assert!(made.prefetch.is_some());
        assert!(machine.fetch_in_flight());
        assert!(matches!(
            machine.choose_option(OptionId::B),
            Err(ChoiceError::FetchInFlight)
        ));

        assert_eq!(machine.enter_main().redirect(), Some(Screen::Feedback));
        let view = machine.enter_feedback().ready().unwrap();
        assert_eq!(view.outcome_text, "Outcome of A");
        assert_eq!(view.summary, "+1 faith");
        assert!(!view.pending_ready);

        drop(made);
        assert!(!machine.fetch_in_flight());
    }

    #[test]
    fn terminal_choice_skips_the_fetch() {
        let mut state = opening_state();
        state.resources.treasury = 3;
        let machine = machine_with(Some(&state));
        let made = machine.choose_option(OptionId::B).unwrap();
        assert_eq!(made.screen, Screen::Feedback);
        assert!(made.prefetch.is_none());
        assert!(!machine.fetch_in_flight());
        assert_eq!(machine.enter_main().redirect(), Some(Screen::GameOver));

        let over = machine.enter_game_over().ready().unwrap();
        assert_eq!(over.final_rounds, 1);
        assert!(!over.ending_text.is_empty());
    }

    #[test]
    fn failed_choice_leaves_state_untouched() {
        let mut state = opening_state();
        if let Some(event) = state.current_event.as_mut() {
            event.options.truncate(1);
        }
        let machine = machine_with(Some(&state));
        assert!(matches!(
            machine.choose_option(OptionId::C),
            Err(ChoiceError::Apply(ApplyError::UnknownOption(OptionId::C)))
        ));
        assert_eq!(machine.store().load_main(), Some(state));
        assert!(!machine.fetch_in_flight());
    }

    #[test]
    fn game_over_requires_a_finished_reign() {
        let machine = machine_with(Some(&opening_state()));
        assert_eq!(machine.enter_game_over().redirect(), Some(Screen::Start));
        assert_eq!(machine.store().load_main(), None);
    }

    #[test]
    fn play_again_clears_everything() {
        let machine = machine_with(Some(&opening_state()));
        assert_eq!(machine.play_again(), Screen::Start);
        assert!(machine.store().storage().is_empty());
    }
}
