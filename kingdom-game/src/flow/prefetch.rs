use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

use crate::gateway::{CallMode, ContentRequest, ContentTransport, Gateway, GatewayError};
use crate::history::HistoryTurn;
use crate::store::{PendingSaveError, SessionStorage, SessionStore};

/// Single-slot in-flight marker for the background next-turn fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchSlot(Rc<Cell<bool>>);

impl FetchSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    /// Claim the slot. `None` if a fetch already holds it.
    #[must_use]
    pub fn try_claim(&self) -> Option<FetchGuard> {
        if self.0.replace(true) {
            return None;
        }
        Some(FetchGuard(self.0.clone()))
    }
}

/// Releases the slot when dropped, whatever the fetch's outcome.
#[derive(Debug)]
pub struct FetchGuard(Rc<Cell<bool>>);

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("reply did not contain a next event")]
    MissingEvent,
    #[error(transparent)]
    Pending(#[from] PendingSaveError),
}

/// One background fetch of the next turn. Holds the slot from creation until
/// it finishes or is dropped.
pub struct PrefetchTask<S: SessionStorage, T: ContentTransport> {
    store: Rc<SessionStore<S>>,
    gateway: Rc<Gateway<T>>,
    request: ContentRequest,
    action_text: String,
    guard: FetchGuard,
}

impl<S: SessionStorage, T: ContentTransport> PrefetchTask<S, T> {
    pub(crate) const fn new(
        store: Rc<SessionStore<S>>,
        gateway: Rc<Gateway<T>>,
        request: ContentRequest,
        action_text: String,
        guard: FetchGuard,
    ) -> Self {
        Self {
            store,
            gateway,
            request,
            action_text,
            guard,
        }
    }

    #[must_use]
    pub const fn request(&self) -> &ContentRequest {
        &self.request
    }

    /// Fetch, validate and park the next turn in the pending slot. Failures
    /// only show up as an empty pending slot once the slot is released.
    ///
    /// # Errors
    ///
    /// Returns the failure for logging; the foreground flow never sees it.
    pub async fn run(self) -> Result<(), PrefetchError> {
        let Self {
            store,
            gateway,
            request,
            action_text,
            guard,
        } = self;
        let outcome = fetch_into_store(&store, &gateway, &request, action_text).await;
        if let Err(err) = &outcome {
            log::warn!("background next-turn fetch failed: {err}");
            store.clear_pending_next_turn();
        }
        drop(guard);
        outcome
    }
}

async fn fetch_into_store<S: SessionStorage, T: ContentTransport>(
    store: &SessionStore<S>,
    gateway: &Gateway<T>,
    request: &ContentRequest,
    action_text: String,
) -> Result<(), PrefetchError> {
    let response = gateway.request(request, CallMode::Background).await?;
    let event = response.event().ok_or(PrefetchError::MissingEvent)?;
    store.save_pending_next_turn(event)?;
    if let Err(err) = store.append_history([
        HistoryTurn::user(action_text),
        HistoryTurn::model(response.raw.clone()),
    ]) {
        log::warn!("next turn stored but history was not updated: {err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_admits_one_claim_at_a_time() {
        let slot = FetchSlot::new();
        let guard = slot.try_claim().expect("first claim");
        assert!(slot.is_active());
        assert!(slot.try_claim().is_none());
        drop(guard);
        assert!(!slot.is_active());
        assert!(slot.try_claim().is_some());
        assert!(!slot.is_active());
    }
}
