//! Client-side OAuth2 session manager for the storefront
//!
//! Drives the authorization-code redirect handshake, persists the token pair,
//! derives the principal from unverified access-token claims, and refreshes
//! ahead of expiry. Claims are decoded for UI gating only; the API validates
//! every bearer token itself.

pub mod api;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod redirect;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod token;

pub use api::ApiClient;
pub use claims::{Claims, Principal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ApiConfig, ProviderConfig, SessionSettings};
pub use error::{ApiError, AuthError, AuthFailed, StorageError};
pub use events::{ListenerId, SessionEvent};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use redirect::{CallbackParams, Redirect, page_redirect_uri, strip_callback_params};
#[cfg(not(target_arch = "wasm32"))]
pub use schedule::TokioScheduler;
pub use schedule::{LocalTask, ManualScheduler, RefreshTimer, Scheduler, TimerHandle};
pub use session::{Session, SessionSnapshot, SessionState};
pub use storage::{MemoryTokenStore, TokenPair, TokenStore};
pub use token::TokenClient;
