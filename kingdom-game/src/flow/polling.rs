use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use super::machine::ContinueError;
use super::prefetch::FetchSlot;
use crate::event::GameEvent;
use crate::store::{SessionStorage, SessionStore};

/// Timer used between polls. The browser backs it with `setTimeout`; tests
/// use a virtual clock.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Set when the player navigates away so that a pending poll stops at its
/// next tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Wait for the background fetch to park a next turn.
///
/// Ends as soon as the payload appears, the fetch slot is released without a
/// payload, the timeout elapses, or `cancel` fires.
///
/// # Errors
///
/// [`ContinueError::FetchFailed`], [`ContinueError::TimedOut`] or
/// [`ContinueError::Cancelled`].
pub async fn wait_for_pending<S: SessionStorage>(
    store: &SessionStore<S>,
    slot: &FetchSlot,
    sleeper: &dyn Sleeper,
    cancel: &CancelToken,
    settings: PollSettings,
) -> Result<GameEvent, ContinueError> {
    let mut waited = Duration::ZERO;
    loop {
        if cancel.is_cancelled() {
            return Err(ContinueError::Cancelled);
        }
        if let Some(event) = store.load_pending_next_turn() {
            return Ok(event);
        }
        if !slot.is_active() {
            return Err(ContinueError::FetchFailed);
        }
        if waited >= settings.timeout {
            log::warn!("next turn still missing after {waited:?}");
            return Err(ContinueError::TimedOut { waited });
        }
        log::debug!("next turn not ready; waiting {:?}", settings.interval);
        sleeper.sleep(settings.interval).await;
        waited += settings.interval;
    }
}
