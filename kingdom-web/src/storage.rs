//! `sessionStorage` backing for the game's session store.
use kingdom_game::SessionStorage;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum BrowserStorageError {
    #[error("sessionStorage unavailable: {0}")]
    Unavailable(String),
    #[error("sessionStorage rejected `{key}`: {message}")]
    Rejected { key: String, message: String },
}

/// Handle to the tab's `sessionStorage`. Looked up on every call so that a
/// storage disabled mid-session surfaces as an error rather than a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSessionStorage;

impl BrowserSessionStorage {
    fn storage() -> Result<web_sys::Storage, BrowserStorageError> {
        dom::session_storage()
            .map_err(|err| BrowserStorageError::Unavailable(dom::js_error_message(&err)))
    }
}

impl SessionStorage for BrowserSessionStorage {
    type Error = BrowserStorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| BrowserStorageError::Rejected {
                key: key.to_string(),
                message: dom::js_error_message(&err),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| BrowserStorageError::Rejected {
                key: key.to_string(),
                message: dom::js_error_message(&err),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| BrowserStorageError::Rejected {
                key: key.to_string(),
                message: dom::js_error_message(&err),
            })
    }
}
