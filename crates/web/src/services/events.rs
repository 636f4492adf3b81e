//! Page-wide session notifications

use crate::config::WebConfig;
use web_sys::CustomEvent;

/// Dispatch the session-refresh event on `window` so code outside the
/// component tree can re-read the token.
pub fn broadcast_refresh() {
    let Some(window) = web_sys::window() else {
        return;
    };

    match CustomEvent::new(WebConfig::SESSION_REFRESH_EVENT) {
        Ok(event) => {
            if let Err(e) = window.dispatch_event(&event) {
                tracing::warn!(error = ?e, "Failed to dispatch session refresh event");
            }
        }
        Err(e) => tracing::warn!(error = ?e, "Failed to create session refresh event"),
    }
}
