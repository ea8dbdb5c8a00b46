//! Versioned session persistence for the three cross-screen slots.
//!
//! `SessionStore` is the only component that touches the serialized form of
//! [`MainState`], the conversation history and the pending next turn. Every
//! other component works on owned copies obtained through `load_*` and written
//! back through `save_*`.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::constants::{HISTORY_KEY_PREFIX, MAIN_STATE_KEY_PREFIX, PENDING_TURN_KEY_PREFIX};
use crate::event::{EventError, GameEvent};
use crate::history::{HistoryTurn, most_recent};
use crate::state::MainState;

/// String key-value storage scoped to one browser session (or a stand-in).
pub trait SessionStorage {
    type Error: std::error::Error + 'static;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be written (for example when the
    /// quota is exhausted).
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store rejects the removal.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Rc<T> {
    type Error = T::Error;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove_item(key)
    }
}

/// In-process storage with an optional byte quota. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

#[derive(Debug, Error)]
pub enum MemoryStorageError {
    #[error("writing `{key}` needs {needed} bytes but the quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Rc::default(),
            quota: Some(quota),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Raw write that bypasses the quota; used to plant damaged records.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl SessionStorage for MemoryStorage {
    type Error = MemoryStorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut items = self.items.borrow_mut();
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(MemoryStorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Version-tagged keys for the three slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub main: String,
    pub history: String,
    pub pending: String,
}

impl StoreKeys {
    #[must_use]
    pub fn for_version(version: &str) -> Self {
        Self {
            main: format!("{MAIN_STATE_KEY_PREFIX}{version}"),
            history: format!("{HISTORY_KEY_PREFIX}{version}"),
            pending: format!("{PENDING_TURN_KEY_PREFIX}{version}"),
        }
    }
}

/// Failure writing the main state or history slot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not serialize {slot}: {source}")]
    Serialize {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write {slot}: {message}")]
    Write { slot: &'static str, message: String },
}

/// Failure writing the pending next turn. Raised rather than swallowed so the
/// background fetch knows the speculative payload is not trustworthy.
#[derive(Debug, Error)]
pub enum PendingSaveError {
    #[error("next turn event is invalid: {0}")]
    Invalid(#[from] EventError),
    #[error("could not serialize next turn event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not write next turn event: {0}")]
    Write(String),
    #[error("next turn event did not read back as written")]
    Verify,
}

pub struct SessionStore<S: SessionStorage> {
    storage: S,
    keys: StoreKeys,
    history_limit: usize,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(storage: S, storage_version: &str, history_limit: usize) -> Self {
        Self {
            storage,
            keys: StoreKeys::for_version(storage_version),
            history_limit,
        }
    }

    #[must_use]
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("reading `{key}` failed: {err}");
                None
            }
        }
    }

    fn purge(&self, key: &str) {
        if let Err(err) = self.storage.remove_item(key) {
            log::warn!("removing `{key}` failed: {err}");
        }
    }

    fn write(&self, slot: &'static str, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StoreError::Write {
                slot,
                message: err.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the state cannot be serialized or written.
    pub fn save_main(&self, state: &MainState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state).map_err(|source| StoreError::Serialize {
            slot: "main state",
            source,
        })?;
        self.write("main state", &self.keys.main, &json)?;
        log::debug!("saved main state for round {}", state.round_number);
        Ok(())
    }

    /// Load and structurally validate the main state. Anything unreadable is
    /// purged and reported as absent.
    #[must_use]
    pub fn load_main(&self) -> Option<MainState> {
        let raw = self.read(&self.keys.main)?;
        let state = match serde_json::from_str::<MainState>(&raw) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("discarding unreadable main state: {err}");
                self.purge(&self.keys.main);
                return None;
            }
        };
        if let Err(err) = state.validate() {
            log::warn!("discarding invalid main state: {err}");
            self.purge(&self.keys.main);
            return None;
        }
        Some(state)
    }

    /// Write the history, keeping only the most recent `history_limit` turns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be serialized or written.
    pub fn save_history(&self, turns: &[HistoryTurn]) -> Result<(), StoreError> {
        let kept = most_recent(turns, self.history_limit);
        let json = serde_json::to_string(kept).map_err(|source| StoreError::Serialize {
            slot: "history",
            source,
        })?;
        self.write("history", &self.keys.history, &json)?;
        log::debug!("saved history ({} / {} turns)", kept.len(), self.history_limit);
        Ok(())
    }

    #[must_use]
    pub fn load_history(&self) -> Vec<HistoryTurn> {
        let Some(raw) = self.read(&self.keys.history) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<HistoryTurn>>(&raw) {
            Ok(turns) => turns,
            Err(err) => {
                log::warn!("discarding unreadable history: {err}");
                self.purge(&self.keys.history);
                Vec::new()
            }
        }
    }

    /// Append turns to the stored history and write it back bounded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be written.
    pub fn append_history(
        &self,
        turns: impl IntoIterator<Item = HistoryTurn>,
    ) -> Result<(), StoreError> {
        let mut history = self.load_history();
        history.extend(turns);
        self.save_history(&history)
    }

    /// Validate, write and read back the speculative next turn.
    ///
    /// # Errors
    ///
    /// Returns [`PendingSaveError`] when the event is structurally invalid or
    /// the write cannot be verified. Nothing stale is left behind on failure.
    pub fn save_pending_next_turn(&self, event: &GameEvent) -> Result<(), PendingSaveError> {
        event.validate()?;
        let json = serde_json::to_string(event)?;
        if let Err(err) = self.storage.set_item(&self.keys.pending, &json) {
            self.purge(&self.keys.pending);
            return Err(PendingSaveError::Write(err.to_string()));
        }
        if self.read(&self.keys.pending).as_deref() != Some(json.as_str()) {
            self.purge(&self.keys.pending);
            return Err(PendingSaveError::Verify);
        }
        log::debug!("pending next turn stored");
        Ok(())
    }

    /// Re-validated on every read; anything unusable is purged.
    #[must_use]
    pub fn load_pending_next_turn(&self) -> Option<GameEvent> {
        let raw = self.read(&self.keys.pending)?;
        let event = match serde_json::from_str::<GameEvent>(&raw) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("discarding unreadable pending turn: {err}");
                self.purge(&self.keys.pending);
                return None;
            }
        };
        if let Err(err) = event.validate() {
            log::warn!("discarding invalid pending turn: {err}");
            self.purge(&self.keys.pending);
            return None;
        }
        Some(event)
    }

    pub fn clear_pending_next_turn(&self) {
        self.purge(&self.keys.pending);
    }

    pub fn clear_all(&self) {
        self.purge(&self.keys.main);
        self.purge(&self.keys.history);
        self.purge(&self.keys.pending);
        log::debug!("cleared all session slots");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::event;
    use crate::state::fixtures::opening_state;

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::new(), "test", 4)
    }

    #[test]
    fn keys_are_version_tagged() {
        let keys = StoreKeys::for_version("v6_preload");
        assert_eq!(keys.main, "kingdomGameState_v6_preload");
        assert_eq!(keys.history, "kingdomGameHistory_v6_preload");
        assert_eq!(keys.pending, "kingdomGameNextEvent_v6_preload");
    }

    #[test]
    fn main_state_round_trips() {
        let store = store();
        assert!(store.load_main().is_none());
        let state = opening_state();
        store.save_main(&state).unwrap();
        assert_eq!(store.load_main(), Some(state));
    }

    #[test]
    fn damaged_main_state_is_purged() {
        let store = store();
        store.storage().insert_raw(&store.keys().main, "{not json");
        assert!(store.load_main().is_none());
        assert!(store.storage().raw(&store.keys().main).is_none());

        let mut state = opening_state();
        state.current_event = None;
        store
            .storage()
            .insert_raw(&store.keys().main, &serde_json::to_string(&state).unwrap());
        assert!(store.load_main().is_none());
        assert!(store.storage().raw(&store.keys().main).is_none());
    }

    #[test]
    fn history_is_bounded_to_most_recent_turns() {
        let store = store();
        let turns: Vec<HistoryTurn> = (0..9)
            .map(|i| {
                if i % 2 == 0 {
                    HistoryTurn::user(format!("u{i}"))
                } else {
                    HistoryTurn::model(format!("m{i}"))
                }
            })
            .collect();
        store.save_history(&turns).unwrap();
        let loaded = store.load_history();
        assert_eq!(loaded, turns[5..].to_vec());
    }

    #[test]
    fn malformed_history_loads_empty_and_is_purged() {
        let store = store();
        store.storage().insert_raw(&store.keys().history, r#"{"role":"user"}"#);
        assert!(store.load_history().is_empty());
        assert!(store.storage().raw(&store.keys().history).is_none());
    }

    #[test]
    fn pending_turn_rejects_invalid_events_loudly() {
        let store = store();
        let mut bad = event("Plague");
        bad.options[0].outcome_text = None;
        let err = store.save_pending_next_turn(&bad).unwrap_err();
        assert!(matches!(err, PendingSaveError::Invalid(EventError::MissingOutcome(_))));
        assert!(store.load_pending_next_turn().is_none());
    }

    #[test]
    fn pending_turn_write_failure_is_reported() {
        let store = SessionStore::new(MemoryStorage::with_quota(64), "q", 4);
        let err = store
            .save_pending_next_turn(&event("A very long description"))
            .unwrap_err();
        assert!(matches!(err, PendingSaveError::Write(_)));
        assert!(store.load_pending_next_turn().is_none());
    }

    #[test]
    fn pending_turn_is_revalidated_on_read() {
        let store = store();
        let mut bad = event("Flood");
        bad.options.clear();
        store
            .storage()
            .insert_raw(&store.keys().pending, &serde_json::to_string(&bad).unwrap());
        assert!(store.load_pending_next_turn().is_none());
        assert!(store.storage().raw(&store.keys().pending).is_none());
    }

    #[test]
    fn clearing_pending_twice_is_harmless() {
        let store = store();
        store.save_pending_next_turn(&event("Flood")).unwrap();
        assert!(store.load_pending_next_turn().is_some());
        store.clear_pending_next_turn();
        store.clear_pending_next_turn();
        assert!(store.load_pending_next_turn().is_none());
    }

    #[test]
    fn clear_all_empties_every_slot() {
        let store = store();
        store.save_main(&opening_state()).unwrap();
        store.save_history(&[HistoryTurn::user("hi")]).unwrap();
        store.save_pending_next_turn(&event("Flood")).unwrap();
        store.clear_all();
        assert!(store.storage().is_empty());
    }
}
