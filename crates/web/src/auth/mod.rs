//! Session context for the component tree

pub mod context;

pub use context::{
    SessionAction, SessionContext, SessionContextData, SessionProvider, use_is_admin,
    use_is_authenticated, use_session, use_session_refresh,
};
