//! Browser-wired session manager

use super::navigation::{NavigationError, current_url};
use super::scheduler::{BrowserClock, BrowserScheduler};
use super::storage::LocalTokenStore;
use crate::config::settings_for_page;
use std::rc::Rc;
use storefront_session::{ApiClient, ApiError, AuthError, ProviderConfig, SessionManager};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("Invalid provider URL: {0}")]
    Config(#[from] url::ParseError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Manager backed by `localStorage`, `setTimeout` and `Date.now()`
pub fn session_manager(config: ProviderConfig) -> Result<SessionManager, AuthError> {
    SessionManager::builder(config, BrowserScheduler)
        .store(LocalTokenStore)
        .clock(Rc::new(BrowserClock))
        .build()
}

/// Session manager and API client for the current page, using the
/// deployment defaults
pub fn init_session() -> Result<(SessionManager, ApiClient), StartupError> {
    let page = current_url()?;
    let settings = settings_for_page(&page)?;
    let manager = session_manager(settings.provider)?;
    let api = ApiClient::new(&settings.api, manager.clone())?;
    Ok((manager, api))
}
