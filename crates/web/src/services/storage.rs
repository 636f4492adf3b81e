//! `localStorage`-backed token store

use storefront_session::{StorageError, TokenStore};
use web_sys::Storage;

/// Persists tokens as raw strings in `window.localStorage`.
///
/// When storage is unavailable (private mode, sandboxed frames) reads return
/// nothing and writes fail, so the session simply does not survive a reload.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTokenStore;

impl LocalTokenStore {
    fn storage() -> Option<Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl TokenStore for LocalTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage =
            Self::storage().ok_or_else(|| StorageError::new(key, "localStorage unavailable"))?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::new(key, format!("{e:?}")))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            if let Err(e) = storage.remove_item(key) {
                tracing::debug!(key, error = ?e, "Failed to remove persisted token");
            }
        }
    }
}
