//! Session state

use crate::claims::Principal;
use std::collections::BTreeSet;

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// Code exchange or refresh in flight
    Authenticating,
    /// Valid token, refresh scheduled
    Authenticated,
    /// Token present but past expiry
    Expired,
}

/// Mutable per-tab session owned by the manager.
///
/// Only the manager writes it; `principal` is always derived from
/// `access_token` and replaced together with it.
#[derive(Clone, Default)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub authenticated: bool,
    pub principal: Option<Principal>,
    pub state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.authenticated)
            .field("state", &self.state)
            .field("principal", &self.principal)
            .field("has_access_token", &!self.access_token.is_empty())
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .finish()
    }
}

impl Session {
    pub fn username(&self) -> &str {
        self.principal
            .as_ref()
            .map_or("", |principal| principal.username.as_str())
    }

    pub fn roles(&self) -> BTreeSet<String> {
        self.principal
            .as_ref()
            .map(|principal| principal.roles.clone())
            .unwrap_or_default()
    }
}

/// Read-only view handed to UI layers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub authenticated: bool,
    pub username: String,
    pub roles: BTreeSet<String>,
    pub principal: Option<Principal>,
    /// Epoch second of the next scheduled refresh
    pub refresh_due_at: Option<i64>,
}

impl SessionSnapshot {
    pub(crate) fn new(session: &Session, refresh_due_at: Option<i64>) -> Self {
        Self {
            state: session.state,
            authenticated: session.authenticated,
            username: session.username().to_string(),
            roles: session.roles(),
            principal: session.principal.clone(),
            refresh_due_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.principal.as_ref().is_some_and(Principal::is_admin)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|principal| principal.has_role(role))
    }
}
