//! Durable token persistence

use crate::error::StorageError;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::warn;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Synchronous string key-value store that survives page reloads.
///
/// Writes are last-write-wins; there is no transactional guarantee across keys.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// In-memory store, for tests and non-browser hosts
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Access/refresh token pair
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &format_args!("<{} chars>", self.refresh_token.len()))
            .finish()
    }
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Read the persisted pair; both entries must be present and non-empty
    pub fn load(store: &dyn TokenStore) -> Option<Self> {
        let access_token = store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())?;
        let refresh_token = store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())?;
        Some(Self {
            access_token,
            refresh_token,
        })
    }

    /// Persist both tokens, overwriting any previous pair.
    ///
    /// Failures are logged; the in-memory session stays usable for this page.
    pub fn save(&self, store: &dyn TokenStore) {
        for (key, value) in [
            (ACCESS_TOKEN_KEY, &self.access_token),
            (REFRESH_TOKEN_KEY, &self.refresh_token),
        ] {
            if let Err(e) = store.set(key, value) {
                warn!(error = %e, "Failed to persist token");
            }
        }
    }

    /// Remove both persisted entries
    pub fn clear(store: &dyn TokenStore) {
        store.remove(ACCESS_TOKEN_KEY);
        store.remove(REFRESH_TOKEN_KEY);
    }
}
