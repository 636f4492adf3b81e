//! Window location and history access

use storefront_session::Redirect;
use thiserror::Error;
use url::Url;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("No browser window")]
    NoWindow,

    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Browser rejected {operation}: {message}")]
    Browser {
        operation: &'static str,
        message: String,
    },
}

impl NavigationError {
    fn browser(operation: &'static str, error: &JsValue) -> Self {
        Self::Browser {
            operation,
            message: format!("{error:?}"),
        }
    }
}

fn window() -> Result<web_sys::Window, NavigationError> {
    web_sys::window().ok_or(NavigationError::NoWindow)
}

/// URL of the current page
pub fn current_url() -> Result<Url, NavigationError> {
    let href = window()?
        .location()
        .href()
        .map_err(|e| NavigationError::browser("location.href", &e))?;
    Ok(Url::parse(&href)?)
}

/// Leave the page for `redirect`
pub fn navigate(redirect: &Redirect) -> Result<(), NavigationError> {
    tracing::debug!(host = ?redirect.url().host_str(), "Navigating");
    window()?
        .location()
        .set_href(redirect.url().as_str())
        .map_err(|e| NavigationError::browser("location.assign", &e))
}

/// Rewrite the address bar without reloading or adding a history entry
pub fn replace_url(url: &Url) -> Result<(), NavigationError> {
    window()?
        .history()
        .map_err(|e| NavigationError::browser("history", &e))?
        .replace_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
        .map_err(|e| NavigationError::browser("history.replaceState", &e))
}
