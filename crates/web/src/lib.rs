//! Browser bindings for the storefront session
//!
//! Wires the session manager to `localStorage`, `setTimeout` and the window
//! location, and exposes it to Yew components through [`SessionProvider`].

pub mod auth;
pub mod components;
pub mod config;
pub mod logging;
pub mod services;

pub use auth::{
    SessionContext, SessionProvider, use_is_admin, use_is_authenticated, use_session,
    use_session_refresh,
};
pub use components::{AdminGuard, ReauthModal, RequireAuth, SessionButton, Spinner};
pub use config::WebConfig;
pub use services::{StartupError, init_session};
