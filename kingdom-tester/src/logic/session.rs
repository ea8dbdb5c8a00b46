//! One headless playthrough: open a kingdom, pick options until the reign
//! ends or the round cap is hit, and note every broken promise on the way.
use kingdom_game::{
    BusyIndicator, CancelToken, ChoiceError, ContentTransport, ContinueError, Entry, MemoryStorage,
    PrefetchTask, ResourceVector, Screen, Sleeper, StartError, TurnMachine,
};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::cell::Cell;
use thiserror::Error;

use super::policy::Strategy;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not open the kingdom: {0}")]
    Start(#[from] StartError),
    #[error("could not resolve the choice: {0}")]
    Choice(#[from] ChoiceError),
    #[error("could not reach the next round: {0}")]
    Continue(#[from] ContinueError),
    #[error("expected the {expected} screen but landed on {found}")]
    UnexpectedScreen { expected: Screen, found: Screen },
    #[error("round {0} offered no options")]
    NoOptions(u32),
}

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub strategy: Strategy,
    pub max_rounds: u32,
    pub max_retries: u32,
}

/// What a run got through, kept even when it stops early.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunProgress {
    pub rounds_played: u32,
    pub ending: Option<String>,
    pub ending_text: Option<String>,
    pub final_resources: Option<ResourceVector>,
    pub retries: u32,
    pub background_fetches: u32,
    pub failures: Vec<String>,
}

impl RunProgress {
    fn expect(&mut self, holds: bool, failure: impl FnOnce() -> String) {
        if !holds {
            let failure = failure();
            log::warn!("{failure}");
            self.failures.push(failure);
        }
    }
}

/// Counts how often foreground calls raised the busy overlay.
#[derive(Debug, Default)]
pub struct BusyCounter {
    active: Cell<bool>,
    raised: Cell<u32>,
}

impl BusyCounter {
    pub fn raised(&self) -> u32 {
        self.raised.get()
    }
}

impl BusyIndicator for BusyCounter {
    fn set_busy(&self, busy: bool) {
        if busy && !self.active.get() {
            self.raised.set(self.raised.get() + 1);
        }
        self.active.set(busy);
    }
}

/// Play one session to its end (or to `max_rounds`).
///
/// Must run inside a `tokio::task::LocalSet`: background fetches are spawned
/// with `spawn_local`.
///
/// # Errors
///
/// Returns the first step that could not be completed after retries.
pub async fn play<T: ContentTransport + 'static>(
    machine: &TurnMachine<MemoryStorage, T>,
    settings: &RunSettings,
    rng: &mut ChaCha8Rng,
    sleeper: &dyn Sleeper,
    progress: &mut RunProgress,
) -> Result<(), RunError> {
    open(machine, settings, progress).await?;

    loop {
        let view = match machine.enter_main() {
            Entry::Ready(view) => view,
            Entry::Redirect(Screen::GameOver) => break,
            Entry::Redirect(found) => {
                return Err(RunError::UnexpectedScreen {
                    expected: Screen::Main,
                    found,
                });
            }
        };
        if progress.rounds_played >= settings.max_rounds {
            progress.final_resources = Some(view.resources);
            log::info!("stopping at the {} round cap", settings.max_rounds);
            return Ok(());
        }

        let round = view.round_number;
        let expected_round = progress.rounds_played + 1;
        progress.expect(round == expected_round, || {
            format!("expected round {expected_round} but Main shows {round}")
        });
        progress.expect(view.resources.is_within_bounds(), || {
            format!("round {round} resources out of bounds: {:?}", view.resources)
        });

        let option = settings
            .strategy
            .pick(&view.event, &view.resources, rng)
            .ok_or(RunError::NoOptions(round))?;
        let expected_delta = view
            .event
            .option(option)
            .and_then(|chosen| chosen.resource_changes);

        let made = machine.choose_option(option)?;
        progress.rounds_played += 1;
        if let Some(task) = made.prefetch {
            spawn_prefetch(task, progress);
        }

        let feedback = match machine.enter_feedback() {
            Entry::Ready(feedback) => feedback,
            Entry::Redirect(found) => {
                return Err(RunError::UnexpectedScreen {
                    expected: Screen::Feedback,
                    found,
                });
            }
        };
        progress.expect(feedback.chosen_option_id == option, || {
            format!(
                "round {round}: chose {option} but Feedback shows {}",
                feedback.chosen_option_id
            )
        });
        progress.expect(Some(feedback.resource_changes) == expected_delta, || {
            format!("round {round}: Feedback shows changes the option never offered")
        });
        log::debug!(
            "round {round}: {option} -> {} ({})",
            feedback.summary,
            feedback.outcome_text
        );

        match finish_round(machine, settings, sleeper, progress).await? {
            Screen::Main => {}
            Screen::GameOver => break,
            found => {
                return Err(RunError::UnexpectedScreen {
                    expected: Screen::Main,
                    found,
                });
            }
        }
    }

    let over = match machine.enter_game_over() {
        Entry::Ready(over) => over,
        Entry::Redirect(found) => {
            return Err(RunError::UnexpectedScreen {
                expected: Screen::GameOver,
                found,
            });
        }
    };
    let played = progress.rounds_played;
    progress.expect(over.final_rounds == played, || {
        format!(
            "GameOver reports {} rounds but {played} were played",
            over.final_rounds
        )
    });
    progress.expect(!over.ending_text.trim().is_empty(), || {
        String::from("GameOver shows no ending text")
    });
    progress.ending = over.reason.map(|reason| reason.code());
    progress.ending_text = Some(over.ending_text);
    progress.final_resources = Some(over.resources);

    let next = machine.play_again();
    progress.expect(
        next == Screen::Start && machine.store().load_main().is_none(),
        || String::from("Play Again left a saved session behind"),
    );
    Ok(())
}

async fn open<T: ContentTransport>(
    machine: &TurnMachine<MemoryStorage, T>,
    settings: &RunSettings,
    progress: &mut RunProgress,
) -> Result<(), RunError> {
    machine.enter_start();
    let mut attempts = 0;
    loop {
        match machine.begin().await {
            Ok(Screen::Main) => return Ok(()),
            Ok(found) => {
                return Err(RunError::UnexpectedScreen {
                    expected: Screen::Main,
                    found,
                });
            }
            Err(err) if attempts < settings.max_retries => {
                attempts += 1;
                progress.retries += 1;
                log::warn!("start failed ({err}); retry {attempts}/{}", settings.max_retries);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Leave Feedback, re-issuing the background fetch when it failed or stalled.
async fn finish_round<T: ContentTransport + 'static>(
    machine: &TurnMachine<MemoryStorage, T>,
    settings: &RunSettings,
    sleeper: &dyn Sleeper,
    progress: &mut RunProgress,
) -> Result<Screen, RunError> {
    let mut attempts = 0;
    loop {
        let cancel = CancelToken::new();
        match machine.continue_from_feedback(sleeper, &cancel).await {
            Ok(screen) => return Ok(screen),
            Err(err @ (ContinueError::FetchFailed | ContinueError::TimedOut { .. }))
                if attempts < settings.max_retries =>
            {
                attempts += 1;
                progress.retries += 1;
                log::warn!("{err}; retry {attempts}/{}", settings.max_retries);
                match machine.restart_prefetch() {
                    Ok(Some(task)) => spawn_prefetch(task, progress),
                    // Still fetching (or already fetched): just wait again.
                    Ok(None) | Err(ChoiceError::FetchInFlight) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn spawn_prefetch<T: ContentTransport + 'static>(
    task: PrefetchTask<MemoryStorage, T>,
    progress: &mut RunProgress,
) {
    progress.background_fetches += 1;
    tokio::task::spawn_local(async move {
        let _ = task.run().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_counter_counts_raises_not_toggles() {
        let busy = BusyCounter::default();
        busy.set_busy(true);
        busy.set_busy(true);
        busy.set_busy(false);
        busy.set_busy(true);
        busy.set_busy(false);
        assert_eq!(busy.raised(), 2);
        assert!(!busy.active.get());
    }

    #[test]
    fn failures_are_collected_in_order() {
        let mut progress = RunProgress::default();
        progress.expect(true, || String::from("never"));
        progress.expect(false, || String::from("first"));
        progress.expect(false, || String::from("second"));
        assert_eq!(progress.failures, ["first", "second"]);
    }
}
